use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Approval {
    #[serde(default = "approve_by_default")]
    pub approved: bool,
}

fn approve_by_default() -> bool {
    true
}

/// An empty body approves; `{"approved": false}` withdraws a review.
pub async fn approve_review(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: Option<web::Json<Approval>>,
) -> Result<HttpResponse> {
    let review_id = path.into_inner();
    let approved = input.map_or(true, |body| body.approved);

    let review = state
        .reviews
        .set_review_approved(review_id, approved)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review {} not found", review_id)))?;
    Ok(HttpResponse::Ok().json(review))
}
