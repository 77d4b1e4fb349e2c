//! Caller side of the two order endpoints: creates the processor order when the buyer opens the
//! payment widget and captures it once they approve.

use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::models::booking::BookingPayload;
use crate::models::payment::{CaptureOrderResponse, CreateOrderResponse, ErrorBody, PaymentDetails};

const SDK_URL: &str = "https://www.paypal.com/sdk/js";
const DISABLED_FUNDING: [&str; 4] = ["card", "credit", "paylater", "venmo"];

#[derive(Debug, Error)]
pub enum PaymentClientError {
    #[error("Payment could not be initialised: {0}")]
    Initialization(String),

    #[error("Invalid payment endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// UI feedback only. Nothing here is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Idle,
    Processing,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Success(PaymentDetails),
    Error(String),
    Cancelled,
}

/// Hosted button configuration: capture intent, booking currency, and the funding sources we
/// do not offer.
#[derive(Debug, Clone)]
pub struct ButtonConfig {
    pub client_id: String,
    pub currency: String,
    pub disabled_funding: Vec<String>,
}

impl ButtonConfig {
    pub fn new(client_id: impl Into<String>, currency: &str) -> Self {
        Self {
            client_id: client_id.into(),
            currency: currency.to_uppercase(),
            disabled_funding: DISABLED_FUNDING.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn sdk_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(SDK_URL)?;
        url.query_pairs_mut()
            .append_pair("client-id", &self.client_id)
            .append_pair("currency", &self.currency)
            .append_pair("intent", "capture");
        if !self.disabled_funding.is_empty() {
            url.query_pairs_mut()
                .append_pair("disable-funding", &self.disabled_funding.join(","));
        }
        Ok(url)
    }
}

pub struct PaymentClient {
    http: reqwest::Client,
    endpoint: Url,
    status: PaymentStatus,
}

impl PaymentClient {
    /// `api_base` is the booking API root, e.g. `https://api.example.com/`.
    pub fn new(api_base: &str) -> Result<Self, PaymentClientError> {
        let mut endpoint = Url::parse(api_base)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.join("api/payments/")?,
            status: PaymentStatus::Idle,
        })
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the processor order id for the widget.
    pub async fn create_order(&mut self, payload: &BookingPayload) -> Result<String, PaymentClientError> {
        self.status = PaymentStatus::Processing;
        let result = self.request_order(payload).await;
        self.status = match &result {
            Ok(_) => PaymentStatus::Idle,
            Err(_) => PaymentStatus::Error,
        };
        result
    }

    async fn request_order(&self, payload: &BookingPayload) -> Result<String, PaymentClientError> {
        let url = self.endpoint.join("create-order")?;
        let body = json!({
            "booking_data": payload,
            "amount": payload.pricing.total_amount,
            "currency": payload.currency,
            "description": format!("{} - {} participant(s)", payload.tour_title, payload.participants),
        });

        let res = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentClientError::Initialization(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let error: ErrorBody = res.json().await.unwrap_or_default();
            log::error!("Order creation failed ({}): {}", status, error.message);
            return Err(PaymentClientError::Initialization(if error.message.is_empty() {
                format!("order endpoint returned {}", status)
            } else {
                error.message
            }));
        }

        let created: CreateOrderResponse = res
            .json()
            .await
            .map_err(|e| PaymentClientError::Initialization(e.to_string()))?;
        Ok(created.id)
    }

    /// Captures the approved order. Any failure here is ambiguous: the buyer may already
    /// have been charged.
    pub async fn on_approve(&mut self, order_id: &str, payload: &BookingPayload) -> PaymentOutcome {
        self.status = PaymentStatus::Processing;

        match self.capture(order_id, payload).await {
            Ok(details) => {
                self.status = PaymentStatus::Success;
                PaymentOutcome::Success(details)
            }
            Err(reason) => {
                log::error!("Capture of order {} failed: {}", order_id, reason);
                self.status = PaymentStatus::Error;
                PaymentOutcome::Error(format!(
                    "We could not confirm your payment. You may have been charged; \
                     please contact support and quote order {}.",
                    order_id
                ))
            }
        }
    }

    async fn capture(&self, order_id: &str, payload: &BookingPayload) -> Result<PaymentDetails, String> {
        let url = self.endpoint.join("capture-order").map_err(|e| e.to_string())?;
        let res = self
            .http
            .post(url)
            .json(&json!({ "order_id": order_id, "booking_data": payload }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = res.status();
        if !status.is_success() {
            let error: ErrorBody = res.json().await.unwrap_or_default();
            return Err(format!("{} {}", status, error.error));
        }

        let captured: CaptureOrderResponse = res.json().await.map_err(|e| e.to_string())?;
        if captured.success {
            Ok(captured.payment_details)
        } else {
            Err("capture reported unsuccessful".to_string())
        }
    }

    pub fn on_error(&mut self, message: &str) -> PaymentOutcome {
        log::warn!("Payment widget error: {}", message);
        self.status = PaymentStatus::Error;
        PaymentOutcome::Error(message.to_string())
    }

    pub fn on_cancel(&mut self) -> PaymentOutcome {
        log::info!("Payment cancelled by buyer");
        self.status = PaymentStatus::Idle;
        PaymentOutcome::Cancelled
    }
}
