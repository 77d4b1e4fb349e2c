use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::Result;
use crate::middleware::auth_context::OptionalUser;
use crate::models::review::{NewReview, ReviewList};
use crate::services::{review_service, validation};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub tour_id: Option<Uuid>,
}

pub async fn list_reviews(
    state: web::Data<AppState>,
    query: web::Query<ReviewQuery>,
) -> Result<HttpResponse> {
    let reviews = state.reviews.list_reviews(query.tour_id, true).await?;
    let summary = review_service::summarize(&reviews);
    Ok(HttpResponse::Ok().json(ReviewList { reviews, summary }))
}

pub async fn submit_review(
    state: web::Data<AppState>,
    user: OptionalUser,
    input: web::Json<NewReview>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    validation::validate_review(&input).into_result()?;

    let review = review_service::build_review(input, user.user_id());
    let stored = state.reviews.insert_review(&review).await?;
    log::info!("Review {} submitted for moderation", stored.id);

    Ok(HttpResponse::Created().json(stored))
}
