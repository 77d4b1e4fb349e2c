use chrono::Utc;
use uuid::Uuid;

use crate::models::review::{NewReview, Review, ReviewSummary};

pub fn summarize(reviews: &[Review]) -> ReviewSummary {
    if reviews.is_empty() {
        return ReviewSummary {
            average_rating: 0.0,
            count: 0,
        };
    }

    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let average = total as f32 / reviews.len() as f32;
    ReviewSummary {
        average_rating: (average * 10.0).round() / 10.0,
        count: reviews.len(),
    }
}

/// New submissions wait for moderation before they are listed.
pub fn build_review(input: NewReview, user_id: Option<Uuid>) -> Review {
    Review {
        id: Uuid::new_v4(),
        tour_id: input.tour_id,
        user_id,
        customer_name: input.customer_name.trim().to_string(),
        country: input.country.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        rating: input.rating,
        title: input.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        content: input.content.trim().to_string(),
        approved: false,
        created_at: Utc::now(),
    }
}
