use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus};
use crate::models::payment::Payment;
use crate::models::profile::Profile;
use crate::models::review::Review;
use crate::models::tour::TourPackage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to database failed: {0}")]
    Request(String),

    #[error("database returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected database response: {0}")]
    Decode(String),

    #[error("{0} not found")]
    NotFound(String),
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert keyed on `payment_reference`; a replay returns the row already stored.
    async fn upsert_booking(&self, booking: &Booking) -> Result<Booking, StoreError>;

    /// Insert keyed on `payment_id`; safe to retry.
    async fn upsert_payment(&self, payment: &Payment) -> Result<Payment, StoreError>;

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError>;

    async fn booking_for_user(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Option<Booking>, StoreError>;

    async fn list_bookings(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, StoreError>;

    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Option<Booking>, StoreError>;
}

#[async_trait]
pub trait TourRepository: Send + Sync {
    async fn list_tours(&self) -> Result<Vec<TourPackage>, StoreError>;

    async fn get_tour(&self, tour_id: Uuid) -> Result<Option<TourPackage>, StoreError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn list_reviews(
        &self,
        tour_id: Option<Uuid>,
        approved_only: bool,
    ) -> Result<Vec<Review>, StoreError>;

    async fn insert_review(&self, review: &Review) -> Result<Review, StoreError>;

    async fn set_review_approved(
        &self,
        review_id: Uuid,
        approved: bool,
    ) -> Result<Option<Review>, StoreError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, StoreError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}
