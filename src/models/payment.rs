use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::booking::BookingPayload;
use crate::services::paypal::models::{LinkDescription, OrderCapture};

pub const PAYMENT_METHOD_PAYPAL: &str = "paypal";

/// Row in the `payments` table, keyed for upsert by the processor capture id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payment_method: String,
    pub payment_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub transaction_fee: f64,
    pub paypal_order_id: String,
    pub paypal_payer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the capture endpoint reports back to the booking modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payment_method: String,
    pub payment_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub transaction_fee: f64,
    pub paypal_order_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentDetails {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            booking_id: payment.booking_id,
            payment_method: payment.payment_method.clone(),
            payment_id: payment.payment_id.clone(),
            amount: payment.amount,
            currency: payment.currency.clone(),
            status: payment.status.clone(),
            transaction_fee: payment.transaction_fee,
            paypal_order_id: payment.paypal_order_id.clone(),
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub booking_data: BookingPayload,
    pub amount: f64,
    pub currency: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureOrderRequest {
    pub order_id: String,
    pub booking_data: BookingPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureOrderResponse {
    pub success: bool,
    pub booking_id: Uuid,
    pub payment_details: PaymentDetails,
    pub capture_result: OrderCapture,
}

/// Error body returned by every endpoint on failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}
