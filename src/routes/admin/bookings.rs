use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::booking::{BookingStatus, BookingStatusUpdate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
}

pub async fn list_bookings(
    state: web::Data<AppState>,
    query: web::Query<BookingQuery>,
) -> Result<HttpResponse> {
    let bookings = state.bookings.list_bookings(query.status).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

pub async fn update_status(
    state: web::Data<AppState>,
    admin: AuthenticatedUser,
    path: web::Path<Uuid>,
    input: web::Json<BookingStatusUpdate>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    let status = input.into_inner().status;

    let booking = state
        .bookings
        .update_booking_status(booking_id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?;

    log::info!(
        "Booking {} set to {} by {}",
        booking_id,
        status.as_str(),
        admin.user_id
    );
    Ok(HttpResponse::Ok().json(booking))
}
