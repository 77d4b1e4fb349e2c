use actix_cors::Cors;
use actix_web::{web, HttpRequest};

use crate::errors::AppError;
use crate::middleware::auth::AuthMiddleware;

pub mod account;
pub mod admin;
pub mod health;
pub mod payment;
pub mod review;
pub mod tour;

const MAX_AGE: usize = 3600;

/// Any origin; the order endpoints only take `POST`.
pub fn payment_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(vec!["POST", "OPTIONS"])
        .allow_any_header()
        .max_age(MAX_AGE)
}

pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
        .allow_any_header()
        .max_age(MAX_AGE)
}

/// Extractor failures answer with the same `{error, message}` body as every other error.
fn rejected_input(err: impl std::fmt::Display, req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected input on {}: {}", req.path(), err);
    AppError::Validation(err.to_string()).into()
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| rejected_input(err, req)))
        .app_data(web::QueryConfig::default().error_handler(|err, req| rejected_input(err, req)))
        .app_data(web::PathConfig::default().error_handler(|err, req| rejected_input(err, req)));

    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api")
                // Public routes
                .service(
                    web::scope("/payments")
                        .wrap(payment_cors())
                        .route("/create-order", web::post().to(payment::create_order))
                        .route("/capture-order", web::post().to(payment::capture_order)),
                )
                .service(
                    web::scope("/tours")
                        .wrap(cors())
                        .route("", web::get().to(tour::list_tours))
                        .route("/{id}", web::get().to(tour::get_tour))
                        .route("/{id}/quote", web::get().to(tour::quote)),
                )
                .service(
                    web::scope("/reviews")
                        .wrap(cors())
                        .route("", web::get().to(review::list_reviews))
                        .route("", web::post().to(review::submit_review)),
                )
                // Protected routes
                .service(
                    web::scope("/account")
                        .wrap(AuthMiddleware)
                        .wrap(cors())
                        .route("/profile", web::get().to(account::profile::get_profile))
                        .route("/profile", web::put().to(account::profile::update_profile))
                        .route("/bookings", web::get().to(account::bookings::list_bookings))
                        .route("/bookings/{id}", web::get().to(account::bookings::get_booking)),
                )
                .configure(admin::config),
        );
}
