#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{body::MessageBody, middleware::Logger, web, App};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

use safari_booking_api::db::repository::{
    BookingRepository, ProfileRepository, ReviewRepository, StoreError, StoreHealth,
    TourRepository,
};
use safari_booking_api::middleware::auth::{AppMetadata, Claims, TOKEN_AUDIENCE};
use safari_booking_api::models::booking::{
    Booking, BookingPayload, BookingStatus, CustomerInfo, ParticipantDetail,
};
use safari_booking_api::models::payment::Payment;
use safari_booking_api::models::profile::Profile;
use safari_booking_api::models::review::Review;
use safari_booking_api::models::tour::{Difficulty, TourPackage};
use safari_booking_api::routes;
use safari_booking_api::services::notification_service::{
    BookingConfirmation, NotificationOutbox, Notifier, NotifyError, RetryPolicy, SurveyRequest,
};
use safari_booking_api::services::order_service::{OrderService, OrderSettings};
use safari_booking_api::services::payment::interface::{GatewayError, PaymentGateway};
use safari_booking_api::services::paypal::models::{OrderCapture, OrderRequest, OrderResponse};
use safari_booking_api::services::pricing_service::PricingService;
use safari_booking_api::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-with-enough-length";
pub const CAPTURE_ID: &str = "3C679366HH908993F";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureMode {
    Completed,
    Pending,
    Declined,
    Fail,
}

/// Payment processor stand-in. Counts calls so tests can assert no request was made.
/// Like the real processor, a second capture of the same order is refused.
pub struct FakeGateway {
    pub configured: bool,
    pub capture_mode: Mutex<CaptureMode>,
    pub create_calls: AtomicUsize,
    pub capture_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    pub captured_orders: Mutex<HashSet<String>>,
    pub last_order: Mutex<Option<OrderRequest>>,
    pub request_ids: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new(configured: bool) -> Self {
        Self {
            configured,
            capture_mode: Mutex::new(CaptureMode::Completed),
            create_calls: AtomicUsize::new(0),
            capture_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            captured_orders: Mutex::new(HashSet::new()),
            last_order: Mutex::new(None),
            request_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn set_capture_mode(&self, mode: CaptureMode) {
        *self.capture_mode.lock().unwrap() = mode;
    }

    fn capture_body(order_id: &str, status: &str) -> OrderCapture {
        serde_json::from_value(json!({
            "id": order_id,
            "status": status,
            "payer": { "payer_id": "QYR5Z8XDVJNXQ", "email_address": "buyer@example.com" },
            "purchase_units": [{
                "reference_id": "default",
                "payments": { "captures": [{
                    "id": CAPTURE_ID,
                    "status": status,
                    "amount": { "currency_code": "USD", "value": "2250.00" },
                    "seller_receivable_breakdown": {
                        "gross_amount": { "currency_code": "USD", "value": "2250.00" },
                        "paypal_fee": { "currency_code": "USD", "value": "78.67" },
                        "net_amount": { "currency_code": "USD", "value": "2171.33" }
                    }
                }]}
            }]
        }))
        .unwrap()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn create_order(
        &self,
        order: &OrderRequest,
        request_id: &str,
    ) -> Result<OrderResponse, GatewayError> {
        if !self.configured {
            return Err(GatewayError::MissingCredentials);
        }
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.request_ids.lock().unwrap().push(request_id.to_string());
        *self.last_order.lock().unwrap() = Some(order.clone());

        Ok(serde_json::from_value(json!({
            "id": "5O190127TN364715T",
            "status": "CREATED",
            "links": [
                { "href": "https://www.sandbox.paypal.com/checkoutnow?token=5O190127TN364715T", "rel": "approve", "method": "GET" }
            ]
        }))
        .unwrap())
    }

    async fn capture_order(
        &self,
        order_id: &str,
        request_id: &str,
    ) -> Result<OrderCapture, GatewayError> {
        if !self.configured {
            return Err(GatewayError::MissingCredentials);
        }
        self.capture_calls.fetch_add(1, Ordering::SeqCst);
        self.request_ids.lock().unwrap().push(request_id.to_string());

        let mode = *self.capture_mode.lock().unwrap();
        let status = match mode {
            CaptureMode::Fail => {
                return Err(GatewayError::Api {
                    status: 422,
                    body: r#"{"name":"UNPROCESSABLE_ENTITY","details":[{"issue":"ORDER_NOT_APPROVED"}]}"#
                        .to_string(),
                })
            }
            CaptureMode::Completed => "COMPLETED",
            CaptureMode::Pending => "PENDING",
            CaptureMode::Declined => "DECLINED",
        };

        if !self.captured_orders.lock().unwrap().insert(order_id.to_string()) {
            return Err(GatewayError::Api {
                status: 422,
                body: r#"{"name":"UNPROCESSABLE_ENTITY","details":[{"issue":"ORDER_ALREADY_CAPTURED"}]}"#
                    .to_string(),
            });
        }
        Ok(Self::capture_body(order_id, status))
    }

    async fn get_order(&self, order_id: &str) -> Result<OrderCapture, GatewayError> {
        if !self.configured {
            return Err(GatewayError::MissingCredentials);
        }
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if !self.captured_orders.lock().unwrap().contains(order_id) {
            return Err(GatewayError::Api {
                status: 404,
                body: r#"{"name":"RESOURCE_NOT_FOUND"}"#.to_string(),
            });
        }
        Ok(Self::capture_body(order_id, "COMPLETED"))
    }
}

/// In-memory stand-in for the hosted database with the same conflict rules.
#[derive(Default)]
pub struct FakeStore {
    pub bookings: Mutex<Vec<Booking>>,
    pub payments: Mutex<Vec<Payment>>,
    pub tours: Mutex<Vec<TourPackage>>,
    pub reviews: Mutex<Vec<Review>>,
    pub profiles: Mutex<Vec<Profile>>,
    pub booking_attempts: AtomicUsize,
    pub payment_attempts: AtomicUsize,
    pub fail_bookings: AtomicBool,
    pub payment_failures_left: AtomicUsize,
    pub offline: AtomicBool,
}

impl FakeStore {
    fn api_error() -> StoreError {
        StoreError::Api {
            status: 503,
            body: "upstream unavailable".to_string(),
        }
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(Self::api_error())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BookingRepository for FakeStore {
    async fn upsert_booking(&self, booking: &Booking) -> Result<Booking, StoreError> {
        self.booking_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_bookings.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 409,
                body: "violates foreign key constraint \"bookings_tour_id_fkey\"".to_string(),
            });
        }

        let mut bookings = self.bookings.lock().unwrap();
        if let Some(existing) = bookings
            .iter()
            .find(|b| b.payment_reference.is_some() && b.payment_reference == booking.payment_reference)
        {
            return Ok(existing.clone());
        }
        bookings.push(booking.clone());
        Ok(booking.clone())
    }

    async fn upsert_payment(&self, payment: &Payment) -> Result<Payment, StoreError> {
        self.payment_attempts.fetch_add(1, Ordering::SeqCst);
        let left = self.payment_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.payment_failures_left.store(left - 1, Ordering::SeqCst);
            return Err(Self::api_error());
        }

        let mut payments = self.payments.lock().unwrap();
        if let Some(existing) = payments.iter().find(|p| p.payment_id == payment.payment_id) {
            return Ok(existing.clone());
        }
        payments.push(payment.clone());
        Ok(payment.clone())
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        self.check_online()?;
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn booking_for_user(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Option<Booking>, StoreError> {
        self.check_online()?;
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == booking_id && b.user_id == Some(user_id))
            .cloned())
    }

    async fn list_bookings(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, StoreError> {
        self.check_online()?;
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| status.map_or(true, |s| b.status == s))
            .cloned()
            .collect())
    }

    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Option<Booking>, StoreError> {
        self.check_online()?;
        let mut bookings = self.bookings.lock().unwrap();
        Ok(bookings.iter_mut().find(|b| b.id == booking_id).map(|b| {
            b.status = status;
            b.updated_at = Utc::now();
            b.clone()
        }))
    }
}

#[async_trait]
impl TourRepository for FakeStore {
    async fn list_tours(&self) -> Result<Vec<TourPackage>, StoreError> {
        self.check_online()?;
        Ok(self.tours.lock().unwrap().clone())
    }

    async fn get_tour(&self, tour_id: Uuid) -> Result<Option<TourPackage>, StoreError> {
        self.check_online()?;
        Ok(self
            .tours
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == tour_id)
            .cloned())
    }
}

#[async_trait]
impl ReviewRepository for FakeStore {
    async fn list_reviews(
        &self,
        tour_id: Option<Uuid>,
        approved_only: bool,
    ) -> Result<Vec<Review>, StoreError> {
        self.check_online()?;
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| tour_id.is_none() || r.tour_id == tour_id)
            .filter(|r| !approved_only || r.approved)
            .cloned()
            .collect())
    }

    async fn insert_review(&self, review: &Review) -> Result<Review, StoreError> {
        self.check_online()?;
        self.reviews.lock().unwrap().push(review.clone());
        Ok(review.clone())
    }

    async fn set_review_approved(
        &self,
        review_id: Uuid,
        approved: bool,
    ) -> Result<Option<Review>, StoreError> {
        self.check_online()?;
        let mut reviews = self.reviews.lock().unwrap();
        Ok(reviews.iter_mut().find(|r| r.id == review_id).map(|r| {
            r.approved = approved;
            r.clone()
        }))
    }
}

#[async_trait]
impl ProfileRepository for FakeStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.check_online()?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == user_id)
            .cloned())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        self.check_online()?;
        let mut profiles = self.profiles.lock().unwrap();
        profiles.retain(|p| p.id != profile.id);
        profiles.push(profile.clone());
        Ok(profile.clone())
    }
}

#[async_trait]
impl StoreHealth for FakeStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub confirmations: Mutex<Vec<BookingConfirmation>>,
    pub surveys: Mutex<Vec<SurveyRequest>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotifyError> {
        self.confirmations.lock().unwrap().push(confirmation.clone());
        Ok(())
    }

    async fn schedule_survey(&self, request: &SurveyRequest) -> Result<(), NotifyError> {
        self.surveys.lock().unwrap().push(request.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub gateway: Arc<FakeGateway>,
    pub store: Arc<FakeStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_gateway(FakeGateway::new(true)).await
    }

    pub async fn with_gateway(gateway: FakeGateway) -> Self {
        let gateway = Arc::new(gateway);
        let store = Arc::new(FakeStore::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let (outbox, _worker) = NotificationOutbox::start(
            notifier.clone(),
            RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(1),
            },
        );
        let settings = OrderSettings {
            payment_retry_delay: Duration::from_millis(1),
            ..OrderSettings::new("https://kilitrails.example", Some("sales@kilitrails.example".into()))
        };
        let orders = OrderService::new(
            gateway.clone(),
            store.clone(),
            store.clone(),
            outbox,
            settings,
        );

        let state = AppState {
            orders: Arc::new(orders),
            bookings: store.clone(),
            tours: store.clone(),
            reviews: store.clone(),
            profiles: store.clone(),
            health: store.clone(),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            environment: "test".to_string(),
        };

        Self {
            gateway,
            store,
            notifier,
            state,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .wrap(Logger::default())
            .configure(routes::config)
    }

    pub fn add_tour(&self, tour: TourPackage) -> TourPackage {
        self.store.tours.lock().unwrap().push(tour.clone());
        tour
    }

    /// Stores the sample tour and returns a correctly priced payload for it.
    pub fn booking_payload(&self, participants: u32) -> BookingPayload {
        let tour = self.add_tour(sample_tour());
        sample_payload(&tour, participants)
    }

    pub fn add_review(&self, review: Review) -> Review {
        self.store.reviews.lock().unwrap().push(review.clone());
        review
    }

    pub fn add_booking(&self, booking: Booking) -> Booking {
        self.store.bookings.lock().unwrap().push(booking.clone());
        booking
    }

    /// Waits for the background outbox worker to deliver `count` jobs.
    pub async fn wait_for_notifications(&self, count: usize) -> usize {
        for _ in 0..100 {
            let delivered = self.notifier.confirmations.lock().unwrap().len()
                + self.notifier.surveys.lock().unwrap().len();
            if delivered >= count {
                return delivered;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.notifier.confirmations.lock().unwrap().len() + self.notifier.surveys.lock().unwrap().len()
    }
}

pub fn issue_token(user_id: Uuid, role: Option<&str>) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        email: Some("guest@example.com".to_string()),
        exp: now + 3600,
        iat: now,
        aud: TOKEN_AUDIENCE.to_string(),
        role: Some("authenticated".to_string()),
        app_metadata: AppMetadata {
            role: role.map(str::to_string),
        },
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

pub fn sample_tour() -> TourPackage {
    TourPackage {
        id: Uuid::new_v4(),
        title: "5-Day Serengeti & Ngorongoro Safari".to_string(),
        description: "Great Migration game drives and the crater floor".to_string(),
        price_usd: 1000.0,
        price_tzs: Some(2_650_000.0),
        duration_days: 5,
        difficulty: Difficulty::Easy,
        min_participants: 1,
        max_participants: 8,
        destinations: vec!["Serengeti".to_string(), "Ngorongoro".to_string()],
        featured: true,
        rating: Some(4.9),
        image_url: None,
        created_at: None,
    }
}

pub fn sample_payload(tour: &TourPackage, participants: u32) -> BookingPayload {
    BookingPayload {
        tour_id: tour.id,
        tour_title: tour.title.clone(),
        price_per_person: tour.price_usd,
        customer: CustomerInfo {
            full_name: "Grace Mollel".to_string(),
            email: "grace@example.com".to_string(),
            phone: "+255713000111".to_string(),
            nationality: "Tanzanian".to_string(),
        },
        start_date: NaiveDate::from_ymd_opt(2027, 2, 1).unwrap(),
        participants,
        special_requests: Some("Vegetarian lunch boxes".to_string()),
        accessibility_needs: None,
        participant_details: (0..participants)
            .map(|i| ParticipantDetail {
                name: format!("Traveller {}", i + 1),
                age: 34,
                nationality: "Tanzanian".to_string(),
                dietary_requirements: None,
                medical_conditions: None,
            })
            .collect(),
        pricing: PricingService::compute(tour.price_usd, participants),
        currency: "USD".to_string(),
    }
}

pub fn sample_booking(user_id: Option<Uuid>, status: BookingStatus) -> Booking {
    let tour = sample_tour();
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        user_id,
        tour_id: tour.id,
        start_date: NaiveDate::from_ymd_opt(2027, 3, 14).unwrap(),
        participants: 2,
        total_amount: 2250.0,
        currency: "USD".to_string(),
        status,
        special_requests: None,
        participant_details: vec![],
        payment_status: safari_booking_api::models::booking::PaymentState::Paid,
        payment_reference: Some(format!("CAP-{}", Uuid::new_v4().simple())),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_review(approved: bool, rating: u8) -> Review {
    Review {
        id: Uuid::new_v4(),
        tour_id: None,
        user_id: None,
        customer_name: "Amani Juma".to_string(),
        country: Some("Kenya".to_string()),
        rating,
        title: Some("Wonderful guides".to_string()),
        content: "We saw the big five within two days of driving.".to_string(),
        approved,
        created_at: Utc::now(),
    }
}
