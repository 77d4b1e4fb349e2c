use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config::SupabaseConfig;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::payment::Payment;
use crate::models::profile::Profile;
use crate::models::review::Review;
use crate::models::tour::TourPackage;

use super::repository::{
    BookingRepository, ProfileRepository, ReviewRepository, StoreError, StoreHealth,
    TourRepository,
};

const BOOKINGS: &str = "bookings";
const PAYMENTS: &str = "payments";
const TOURS: &str = "tours";
const REVIEWS: &str = "reviews";
const PROFILES: &str = "profiles";

/// How a conflicting insert is resolved by the REST layer.
#[derive(Debug, Clone, Copy)]
enum OnConflict {
    Ignore,
    Merge,
}

/// Thin client over the hosted database's REST interface, authenticated with the service key.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

pub async fn create_supabase_client(config: &SupabaseConfig) -> Arc<SupabaseClient> {
    log::info!("Connecting to Supabase: {}", config.url);
    let client = SupabaseClient::new(&config.url, config.service_key.clone());

    match client.ping().await {
        Ok(_) => log::info!("Supabase REST endpoint reachable"),
        Err(e) => {
            log::warn!("Supabase ping failed: {}", e);
            log::warn!("The API may still work, but some functionality might be impaired");
        }
    }

    Arc::new(client)
}

impl SupabaseClient {
    pub fn new(base_url: &str, service_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn service_key(&self) -> &str {
        &self.service_key
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let request = self
            .authorized(self.http.get(self.table_url(table)))
            .query(&[("select", "*")])
            .query(query);
        Self::rows(request, table).await
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
        conflict: Option<(&str, OnConflict)>,
    ) -> Result<Vec<T>, StoreError> {
        let mut prefer = String::from("return=representation");
        let mut request = self.authorized(self.http.post(self.table_url(table)));

        if let Some((column, resolution)) = conflict {
            request = request.query(&[("on_conflict", column)]);
            prefer.push_str(match resolution {
                OnConflict::Ignore => ",resolution=ignore-duplicates",
                OnConflict::Merge => ",resolution=merge-duplicates",
            });
        }

        Self::rows(request.header("Prefer", prefer).json(body), table).await
    }

    async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        filter: &[(&str, String)],
        patch: &B,
    ) -> Result<Vec<T>, StoreError> {
        let request = self
            .authorized(self.http.patch(self.table_url(table)))
            .query(filter)
            .header("Prefer", "return=representation")
            .json(patch);
        Self::rows(request, table).await
    }

    async fn rows<T: DeserializeOwned>(
        request: RequestBuilder,
        table: &str,
    ) -> Result<Vec<T>, StoreError> {
        let res = request
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Self::read_rows(res, table).await
    }

    async fn read_rows<T: DeserializeOwned>(res: Response, table: &str) -> Result<Vec<T>, StoreError> {
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !status.is_success() {
            log::error!("Supabase {} request failed ({}): {}", table, status, body);
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| StoreError::Decode(format!("{}: {}", table, e)))
    }
}

fn eq(value: impl ToString) -> String {
    format!("eq.{}", value.to_string())
}

fn first_row<T>(rows: Vec<T>, what: &str) -> Result<T, StoreError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound(what.to_string()))
}

#[async_trait]
impl BookingRepository for SupabaseClient {
    async fn upsert_booking(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let inserted: Vec<Booking> = self
            .insert(
                BOOKINGS,
                booking,
                Some(("payment_reference", OnConflict::Ignore)),
            )
            .await?;

        if let Some(row) = inserted.into_iter().next() {
            return Ok(row);
        }

        // Ignored duplicate: hand back the booking recorded for this capture earlier.
        let reference = booking.payment_reference.clone().unwrap_or_default();
        log::warn!("Booking for payment {} already recorded", reference);
        let existing: Vec<Booking> = self
            .select(BOOKINGS, &[("payment_reference", eq(&reference))])
            .await?;
        first_row(existing, "booking")
    }

    async fn upsert_payment(&self, payment: &Payment) -> Result<Payment, StoreError> {
        let inserted: Vec<Payment> = self
            .insert(PAYMENTS, payment, Some(("payment_id", OnConflict::Ignore)))
            .await?;
        if let Some(row) = inserted.into_iter().next() {
            return Ok(row);
        }

        let existing: Vec<Payment> = self
            .select(PAYMENTS, &[("payment_id", eq(&payment.payment_id))])
            .await?;
        first_row(existing, "payment")
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        self.select(
            BOOKINGS,
            &[
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn booking_for_user(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Option<Booking>, StoreError> {
        let rows: Vec<Booking> = self
            .select(
                BOOKINGS,
                &[("id", eq(booking_id)), ("user_id", eq(user_id))],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_bookings(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, StoreError> {
        let mut query = vec![("order", "created_at.desc".to_string())];
        if let Some(status) = status {
            query.push(("status", eq(status.as_str())));
        }
        self.select(BOOKINGS, &query).await
    }

    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Option<Booking>, StoreError> {
        let rows: Vec<Booking> = self
            .update(
                BOOKINGS,
                &[("id", eq(booking_id))],
                &json!({ "status": status, "updated_at": Utc::now() }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl TourRepository for SupabaseClient {
    async fn list_tours(&self) -> Result<Vec<TourPackage>, StoreError> {
        self.select(TOURS, &[("order", "title.asc".to_string())]).await
    }

    async fn get_tour(&self, tour_id: Uuid) -> Result<Option<TourPackage>, StoreError> {
        let rows: Vec<TourPackage> = self.select(TOURS, &[("id", eq(tour_id))]).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl ReviewRepository for SupabaseClient {
    async fn list_reviews(
        &self,
        tour_id: Option<Uuid>,
        approved_only: bool,
    ) -> Result<Vec<Review>, StoreError> {
        let mut query = vec![("order", "created_at.desc".to_string())];
        if let Some(tour_id) = tour_id {
            query.push(("tour_id", eq(tour_id)));
        }
        if approved_only {
            query.push(("approved", eq(true)));
        }
        self.select(REVIEWS, &query).await
    }

    async fn insert_review(&self, review: &Review) -> Result<Review, StoreError> {
        let rows: Vec<Review> = self.insert(REVIEWS, review, None).await?;
        first_row(rows, "review")
    }

    async fn set_review_approved(
        &self,
        review_id: Uuid,
        approved: bool,
    ) -> Result<Option<Review>, StoreError> {
        let rows: Vec<Review> = self
            .update(
                REVIEWS,
                &[("id", eq(review_id))],
                &json!({ "approved": approved }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl ProfileRepository for SupabaseClient {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let rows: Vec<Profile> = self.select(PROFILES, &[("id", eq(user_id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let rows: Vec<Profile> = self
            .insert(PROFILES, profile, Some(("id", OnConflict::Merge)))
            .await?;
        first_row(rows, "profile")
    }
}

#[async_trait]
impl StoreHealth for SupabaseClient {
    async fn ping(&self) -> Result<(), StoreError> {
        let request = self
            .authorized(self.http.get(self.table_url(TOURS)))
            .query(&[("select", "id"), ("limit", "1")]);
        let _: Vec<serde_json::Value> = Self::rows(request, TOURS).await?;
        Ok(())
    }
}
