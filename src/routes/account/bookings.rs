use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::middleware::auth_context::AuthenticatedUser;
use crate::state::AppState;

pub async fn list_bookings(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let bookings = state.bookings.bookings_for_user(user.user_id).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

/// Another customer's booking is reported as missing, not forbidden.
pub async fn get_booking(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    let booking = state
        .bookings
        .booking_for_user(user.user_id, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?;
    Ok(HttpResponse::Ok().json(booking))
}
