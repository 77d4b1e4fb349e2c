use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::PricingBreakdown;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub nationality: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantDetail {
    pub name: String,
    pub age: u8,
    pub nationality: String,
    pub dietary_requirements: Option<String>,
    pub medical_conditions: Option<String>,
}

/// Wizard-local form state. Lives only as long as the booking modal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFormDraft {
    pub customer: CustomerInfo,
    pub start_date: Option<NaiveDate>,
    pub participants: u32,
    pub special_requests: Option<String>,
    pub accessibility_needs: Option<String>,
    pub participant_details: Vec<ParticipantDetail>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Acknowledgements {
    pub terms: bool,
    pub cancellation_policy: bool,
    pub privacy_policy: bool,
}

impl Acknowledgements {
    pub fn all_accepted(&self) -> bool {
        self.terms && self.cancellation_policy && self.privacy_policy
    }
}

/// Frozen snapshot handed to the payment step. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingPayload {
    pub tour_id: Uuid,
    pub tour_title: String,
    pub price_per_person: f64,
    pub customer: CustomerInfo,
    pub start_date: NaiveDate,
    pub participants: u32,
    pub special_requests: Option<String>,
    pub accessibility_needs: Option<String>,
    pub participant_details: Vec<ParticipantDetail>,
    pub pricing: PricingBreakdown,
    pub currency: String,
}

impl BookingPayload {
    /// Free-text requests as stored on the booking row.
    pub fn combined_requests(&self) -> Option<String> {
        let special = self.special_requests.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let access = self.accessibility_needs.as_deref().map(str::trim).filter(|s| !s.is_empty());
        match (special, access) {
            (Some(s), Some(a)) => Some(format!("{}\n\nAccessibility: {}", s, a)),
            (Some(s), None) => Some(s.to_string()),
            (None, Some(a)) => Some(format!("Accessibility: {}", a)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Paid,
    Refunded,
    Failed,
}

/// Row in the `bookings` table. Only written after a successful capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub tour_id: Uuid,
    pub start_date: NaiveDate,
    pub participants: u32,
    pub total_amount: f64,
    pub currency: String,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    #[serde(default)]
    pub participant_details: Vec<ParticipantDetail>,
    pub payment_status: PaymentState,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}
