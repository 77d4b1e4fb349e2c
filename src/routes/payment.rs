use actix_web::{web, HttpResponse};

use crate::errors::Result;
use crate::middleware::auth_context::OptionalUser;
use crate::models::payment::{CaptureOrderRequest, CreateOrderRequest};
use crate::state::AppState;

pub async fn create_order(
    state: web::Data<AppState>,
    input: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    log::info!(
        "Creating order for tour {} ({} participants, {:.2} {})",
        input.booking_data.tour_id,
        input.booking_data.participants,
        input.amount,
        input.currency
    );

    let order = state.orders.create_order(input).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// Guests may pay; a valid bearer token links the booking to the customer's account.
pub async fn capture_order(
    state: web::Data<AppState>,
    user: OptionalUser,
    input: web::Json<CaptureOrderRequest>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    log::info!("Capturing order {}", input.order_id);

    let captured = state.orders.capture_order(input, user.user_id()).await?;
    Ok(HttpResponse::Ok().json(captured))
}
