//! Order creation and capture against the payment processor, plus the booking and payment
//! writes that follow a successful capture.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

use crate::db::repository::{BookingRepository, TourRepository};
use crate::errors::{AppError, Result};
use crate::models::booking::{Booking, BookingPayload, BookingStatus, PaymentState};
use crate::models::payment::{
    CaptureOrderRequest, CaptureOrderResponse, CreateOrderRequest, CreateOrderResponse, Payment,
    PaymentDetails, PAYMENT_METHOD_PAYPAL,
};
use crate::services::notification_service::{
    BookingConfirmation, NotificationJob, NotificationOutbox, SurveyRequest,
};
use crate::services::payment::interface::{GatewayError, PaymentGateway};
use crate::services::paypal::models::{
    AmountBreakdown, AmountWithBreakdown, ApplicationContext, Capture, Item, Money, OrderCapture,
    OrderRequest, Payee, PurchaseUnit,
};
use crate::services::validation::{self, AMOUNT_TOLERANCE};

const ITEM_NAME_MAX: usize = 127;
const DESCRIPTION_MAX: usize = 127;

#[derive(Debug, Clone)]
pub struct OrderSettings {
    pub frontend_url: String,
    pub merchant_email: Option<String>,
    pub brand_name: String,
    pub payment_write_attempts: u32,
    pub payment_retry_delay: Duration,
}

impl OrderSettings {
    pub fn new(frontend_url: &str, merchant_email: Option<String>) -> Self {
        Self {
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            merchant_email,
            brand_name: "Kilimanjaro Trails".to_string(),
            payment_write_attempts: 3,
            payment_retry_delay: Duration::from_millis(250),
        }
    }
}

pub struct OrderService {
    gateway: Arc<dyn PaymentGateway>,
    bookings: Arc<dyn BookingRepository>,
    tours: Arc<dyn TourRepository>,
    outbox: NotificationOutbox,
    settings: OrderSettings,
}

impl OrderService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        bookings: Arc<dyn BookingRepository>,
        tours: Arc<dyn TourRepository>,
        outbox: NotificationOutbox,
        settings: OrderSettings,
    ) -> Self {
        Self {
            gateway,
            bookings,
            tours,
            outbox,
            settings,
        }
    }

    pub fn processor_configured(&self) -> bool {
        self.gateway.is_configured()
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.gateway.is_configured() {
            Ok(())
        } else {
            log::error!("PayPal credentials not configured");
            Err(AppError::Config(
                GatewayError::MissingCredentials.to_string(),
            ))
        }
    }

    /// Rejects a payload whose group size or pricing disagrees with the stored tour.
    async fn check_against_tour(&self, payload: &BookingPayload) -> Result<()> {
        let tour = self.tours.get_tour(payload.tour_id).await?.ok_or_else(|| {
            let mut errors = validation::FieldErrors::new();
            errors.add("tour_id", "Tour not found");
            AppError::InvalidFields(errors)
        })?;

        let errors = validation::validate_against_tour(payload, &tour);
        if !errors.is_empty() {
            log::warn!("Rejected payload for tour {}: {}", tour.id, errors);
        }
        errors.into_result().map_err(AppError::from)
    }

    pub async fn create_order(&self, input: CreateOrderRequest) -> Result<CreateOrderResponse> {
        self.ensure_configured()?;
        validation::validate_payload(&input.booking_data).into_result()?;
        self.check_against_tour(&input.booking_data).await?;

        let payload = &input.booking_data;
        if (input.amount - payload.pricing.total_amount).abs() > AMOUNT_TOLERANCE {
            return Err(AppError::Validation(format!(
                "Amount {:.2} does not match booking total {:.2}",
                input.amount, payload.pricing.total_amount
            )));
        }
        if !input.currency.eq_ignore_ascii_case(&payload.currency) {
            return Err(AppError::Validation(format!(
                "Currency {} does not match booking currency {}",
                input.currency, payload.currency
            )));
        }

        let order = build_order_request(payload, input.description.as_deref(), &self.settings);
        let request_id = request_id("booking");

        let created = self
            .gateway
            .create_order(&order, &request_id)
            .await
            .map_err(|e| gateway_failure(e, "Failed to create PayPal order"))?;

        Ok(CreateOrderResponse {
            id: created.id,
            status: created.status,
            links: created.links,
        })
    }

    /// Captures an approved order and records it. Once funds are captured the booking write is
    /// the only step whose failure is reported to the caller.
    pub async fn capture_order(
        &self,
        input: CaptureOrderRequest,
        user_id: Option<Uuid>,
    ) -> Result<CaptureOrderResponse> {
        self.ensure_configured()?;
        if input.order_id.trim().is_empty() {
            return Err(AppError::Validation("order_id is required".to_string()));
        }
        validation::validate_payload(&input.booking_data).into_result()?;
        self.check_against_tour(&input.booking_data).await?;

        let CaptureOrderRequest {
            order_id,
            booking_data: payload,
        } = input;

        let capture_result = match self
            .gateway
            .capture_order(&order_id, &request_id("capture"))
            .await
        {
            Ok(captured) => captured,
            // A retried approval: load the earlier capture and record it like a fresh one.
            Err(e) if e.is_already_captured() => {
                log::warn!("Order {} was already captured; loading its details", order_id);
                self.gateway
                    .get_order(&order_id)
                    .await
                    .map_err(|e| gateway_failure(e, "Failed to capture PayPal payment"))?
            }
            Err(e) => return Err(gateway_failure(e, "Failed to capture PayPal payment")),
        };

        let capture = capture_result.first_capture().cloned().ok_or_else(|| {
            log::error!("Capture response for order {} has no capture entry", order_id);
            AppError::PaymentProvider("Failed to capture PayPal payment".to_string())
        })?;

        let (booking_status, payment_state, payment_status) = match capture.status.as_str() {
            "COMPLETED" => (BookingStatus::Confirmed, PaymentState::Paid, "completed"),
            "PENDING" => (BookingStatus::Pending, PaymentState::Pending, "pending"),
            other => {
                log::error!("Capture {} for order {} ended as {}", capture.id, order_id, other);
                return Err(AppError::PaymentProvider(
                    "Failed to capture PayPal payment".to_string(),
                ));
            }
        };

        if let Some(captured) = captured_amount_mismatch(&capture, payload.pricing.total_amount) {
            log::error!(
                "Capture {} for order {} took {:.2} but the booking total is {:.2}",
                capture.id,
                order_id,
                captured,
                payload.pricing.total_amount
            );
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id,
            tour_id: payload.tour_id,
            start_date: payload.start_date,
            participants: payload.participants,
            total_amount: payload.pricing.total_amount,
            currency: payload.currency.to_uppercase(),
            status: booking_status,
            special_requests: payload.combined_requests(),
            participant_details: payload.participant_details.clone(),
            payment_status: payment_state,
            payment_reference: Some(capture.id.clone()),
            created_at: now,
            updated_at: now,
        };

        let booking = self.bookings.upsert_booking(&booking).await.map_err(|e| {
            log::error!(
                "Funds captured for order {} (capture {}) but booking insert failed: {}",
                order_id,
                capture.id,
                e
            );
            AppError::BookingNotRecorded {
                order_id: order_id.clone(),
                capture_id: capture.id.clone(),
            }
        })?;
        log::info!(
            "Booking {} recorded for order {} (capture {})",
            booking.id,
            order_id,
            capture.id
        );

        let payment = payment_row(&booking, &capture, &capture_result, &order_id, payment_status);
        self.record_payment(&payment).await;
        self.queue_notifications(&booking, &payload, &capture.id);

        Ok(CaptureOrderResponse {
            success: true,
            booking_id: booking.id,
            payment_details: PaymentDetails::from(&payment),
            capture_result,
        })
    }

    /// Best-effort: retried, then logged and swallowed.
    async fn record_payment(&self, payment: &Payment) -> bool {
        let attempts = self.settings.payment_write_attempts.max(1);
        for attempt in 1..=attempts {
            match self.bookings.upsert_payment(payment).await {
                Ok(_) => return true,
                Err(e) => {
                    log::warn!(
                        "Payment record for booking {} failed (attempt {}/{}): {}",
                        payment.booking_id,
                        attempt,
                        attempts,
                        e
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.settings.payment_retry_delay * attempt).await;
                    }
                }
            }
        }
        log::error!(
            "Payment {} for booking {} was not recorded",
            payment.payment_id,
            payment.booking_id
        );
        false
    }

    fn queue_notifications(&self, booking: &Booking, payload: &BookingPayload, capture_id: &str) {
        self.outbox
            .enqueue(NotificationJob::BookingConfirmation(BookingConfirmation {
                booking_id: booking.id,
                customer_name: payload.customer.full_name.clone(),
                customer_email: payload.customer.email.clone(),
                tour_title: payload.tour_title.clone(),
                start_date: booking.start_date,
                participants: booking.participants,
                total_amount: booking.total_amount,
                currency: booking.currency.clone(),
                payment_reference: capture_id.to_string(),
            }));
        self.outbox
            .enqueue(NotificationJob::SurveySchedule(SurveyRequest {
                booking_id: booking.id,
                customer_email: payload.customer.email.clone(),
                tour_id: booking.tour_id,
                start_date: booking.start_date,
            }));
    }
}

fn gateway_failure(err: GatewayError, summary: &str) -> AppError {
    match err {
        GatewayError::MissingCredentials => AppError::Config(err.to_string()),
        other => {
            log::error!("{}: {}", summary, other);
            AppError::PaymentProvider(summary.to_string())
        }
    }
}

/// The captured amount, when it differs from `expected` by more than half a cent.
pub fn captured_amount_mismatch(capture: &Capture, expected: f64) -> Option<f64> {
    capture
        .amount
        .as_ref()
        .and_then(Money::amount)
        .filter(|captured| (captured - expected).abs() > AMOUNT_TOLERANCE)
}

/// Processor idempotency header value: prefix, epoch millis and a random suffix.
pub fn request_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().timestamp_millis(),
        suffix.to_lowercase()
    )
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// One line for the tour itself (quantity = participants) and one per additional fee.
pub fn build_order_request(
    payload: &BookingPayload,
    description: Option<&str>,
    settings: &OrderSettings,
) -> OrderRequest {
    let currency = payload.currency.to_uppercase();

    let mut items = vec![Item {
        name: truncate(&payload.tour_title, ITEM_NAME_MAX),
        description: Some(format!("Tour starting {}", payload.start_date)),
        quantity: payload.participants.to_string(),
        unit_amount: Money::new(&currency, payload.price_per_person),
    }];
    items.extend(payload.pricing.additional_fees.iter().map(|fee| Item {
        name: truncate(&fee.name, ITEM_NAME_MAX),
        description: Some(truncate(&fee.description, DESCRIPTION_MAX)),
        quantity: "1".to_string(),
        unit_amount: Money::new(&currency, fee.amount),
    }));

    let item_total = payload.pricing.item_total();

    let description = description
        .map(str::to_string)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "{} - {} participant(s) from {}",
                payload.tour_title, payload.participants, payload.start_date
            )
        });

    OrderRequest {
        intent: "CAPTURE".to_string(),
        purchase_units: vec![PurchaseUnit {
            reference_id: Some(payload.tour_id.to_string()),
            description: Some(truncate(&description, DESCRIPTION_MAX)),
            custom_id: Some(truncate(&payload.customer.email, DESCRIPTION_MAX)),
            amount: AmountWithBreakdown {
                currency_code: currency.clone(),
                value: format!("{:.2}", payload.pricing.total_amount),
                breakdown: Some(AmountBreakdown {
                    item_total: Money::new(&currency, item_total),
                }),
            },
            items,
            payee: settings.merchant_email.clone().map(|email_address| Payee { email_address }),
        }],
        application_context: Some(ApplicationContext {
            brand_name: settings.brand_name.clone(),
            landing_page: "NO_PREFERENCE".to_string(),
            user_action: "PAY_NOW".to_string(),
            shipping_preference: "NO_SHIPPING".to_string(),
            return_url: format!("{}/booking/success", settings.frontend_url),
            cancel_url: format!("{}/booking/cancelled", settings.frontend_url),
        }),
    }
}

fn payment_row(
    booking: &Booking,
    capture: &Capture,
    capture_result: &OrderCapture,
    order_id: &str,
    status: &str,
) -> Payment {
    let now = Utc::now();
    Payment {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        payment_method: PAYMENT_METHOD_PAYPAL.to_string(),
        payment_id: capture.id.clone(),
        amount: capture
            .amount
            .as_ref()
            .and_then(Money::amount)
            .unwrap_or(booking.total_amount),
        currency: capture
            .amount
            .as_ref()
            .map(|money| money.currency_code.clone())
            .unwrap_or_else(|| booking.currency.clone()),
        status: status.to_string(),
        transaction_fee: capture.fee(),
        paypal_order_id: order_id.to_string(),
        paypal_payer_id: capture_result.payer_id(),
        created_at: now,
        updated_at: now,
    }
}
