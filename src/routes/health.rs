use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::collections::HashMap;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: state.environment.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let database = check_database(&state).await;
    let processor = check_payment_processor(&state);

    if database.status != "ok" || processor.status != "ok" {
        health.status = "degraded".to_string();
    }
    health.services.insert("database".to_string(), database);
    health.services.insert("paypal".to_string(), processor);

    HttpResponse::Ok().json(health)
}

async fn check_database(state: &AppState) -> ServiceStatus {
    match state.health.ping().await {
        Ok(()) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("Database REST endpoint reachable".to_string()),
        },
        Err(e) => {
            log::warn!("Database health check failed: {}", e);
            ServiceStatus {
                status: "error".to_string(),
                details: Some("Database unreachable".to_string()),
            }
        }
    }
}

// Configuration only; no token is requested.
fn check_payment_processor(state: &AppState) -> ServiceStatus {
    if state.orders.processor_configured() {
        ServiceStatus {
            status: "ok".to_string(),
            details: Some("PayPal credentials configured".to_string()),
        }
    } else {
        ServiceStatus {
            status: "error".to_string(),
            details: Some("PayPal credentials not configured".to_string()),
        }
    }
}
