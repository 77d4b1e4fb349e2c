use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
    Extreme,
}

/// Reference data from the `tours` table. Never mutated by the booking flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPackage {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price_usd: f64,
    pub price_tzs: Option<f64>,
    pub duration_days: u32,
    pub difficulty: Difficulty,
    #[serde(default = "default_min_participants")]
    pub min_participants: u32,
    pub max_participants: u32,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    pub rating: Option<f32>,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_min_participants() -> u32 {
    1
}

impl TourPackage {
    pub fn accepts_participants(&self, participants: u32) -> bool {
        (1..=self.max_participants).contains(&participants)
    }
}
