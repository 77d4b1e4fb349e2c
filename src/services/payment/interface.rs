use async_trait::async_trait;
use thiserror::Error;

use crate::services::paypal::models::{OrderCapture, OrderRequest, OrderResponse};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("PayPal credentials not configured")]
    MissingCredentials,

    #[error("failed to obtain access token: {0}")]
    Auth(String),

    #[error("request to payment processor failed: {0}")]
    Request(String),

    #[error("payment processor returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected payment processor response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// The processor refused a capture because the order was captured by an earlier request.
    pub fn is_already_captured(&self) -> bool {
        matches!(self, GatewayError::Api { status: 422, body } if body.contains("ORDER_ALREADY_CAPTURED"))
    }
}

/// Order lifecycle owned by the external processor: created, approved by the payer, captured.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// `false` when the processor cannot be reached because credentials are absent.
    fn is_configured(&self) -> bool;

    async fn create_order(
        &self,
        order: &OrderRequest,
        request_id: &str,
    ) -> Result<OrderResponse, GatewayError>;

    async fn capture_order(
        &self,
        order_id: &str,
        request_id: &str,
    ) -> Result<OrderCapture, GatewayError>;

    /// Current order details, including captures already made against it.
    async fn get_order(&self, order_id: &str) -> Result<OrderCapture, GatewayError>;
}
