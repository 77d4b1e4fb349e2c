use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub tour_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub country: Option<String>,
    pub rating: u8,
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub tour_id: Option<Uuid>,
    pub customer_name: String,
    pub country: Option<String>,
    pub rating: u8,
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub average_rating: f32,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewList {
    pub reviews: Vec<Review>,
    pub summary: ReviewSummary,
}
