use actix_web::web;

use crate::middleware::auth::AuthMiddleware;
use crate::middleware::role_auth::RequireRole;
use crate::models::account::UserRole;

pub mod bookings;
pub mod reviews;

/// The last `wrap` runs first: CORS, then authentication, then the role check.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(RequireRole::new(UserRole::Admin))
            .wrap(AuthMiddleware)
            .wrap(super::cors())
            .route("/bookings", web::get().to(bookings::list_bookings))
            .route("/bookings/{id}/status", web::put().to(bookings::update_status))
            .route("/reviews/{id}/approve", web::put().to(reviews::approve_review)),
    );
}
