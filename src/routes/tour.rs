use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::tour::TourPackage;
use crate::services::pricing_service::PricingService;
use crate::services::tour_service::{self, TourFilter};
use crate::services::validation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub participants: u32,
}

pub async fn list_tours(
    state: web::Data<AppState>,
    filter: web::Query<TourFilter>,
) -> Result<HttpResponse> {
    let tours = state.tours.list_tours().await?;
    let tours = tour_service::filter_and_sort(tours, &filter);
    Ok(HttpResponse::Ok().json(tours))
}

async fn find_tour(state: &AppState, tour_id: Uuid) -> Result<TourPackage> {
    state
        .tours
        .get_tour(tour_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tour {} not found", tour_id)))
}

pub async fn get_tour(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let tour = find_tour(&state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tour))
}

pub async fn quote(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<QuoteQuery>,
) -> Result<HttpResponse> {
    let tour = find_tour(&state, path.into_inner()).await?;
    validation::validate_participant_count(query.participants, tour.max_participants)
        .into_result()?;

    Ok(HttpResponse::Ok().json(PricingService::compute(tour.price_usd, query.participants)))
}
