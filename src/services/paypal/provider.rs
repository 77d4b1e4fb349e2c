use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::{PayPalConfig, PayPalCredentials};
use crate::services::payment::interface::{GatewayError, PaymentGateway};

use super::models::{AccessToken, OrderCapture, OrderRequest, OrderResponse};

const REQUEST_ID_HEADER: &str = "PayPal-Request-Id";

/// PayPal REST client. A fresh access token is fetched for every call.
pub struct PayPalProvider {
    http: reqwest::Client,
    api_url: String,
    credentials: Option<PayPalCredentials>,
}

impl PayPalProvider {
    pub fn new(config: &PayPalConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Client-credentials grant. Fails before any network call when credentials are absent.
    async fn access_token(&self) -> Result<String, GatewayError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(GatewayError::MissingCredentials)?;

        let res = self
            .http
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .header("Accept", "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| GatewayError::Auth(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            log::error!("PayPal auth failed ({}): {}", status, body);
            return Err(GatewayError::Auth(format!("status {}", status)));
        }

        let token: AccessToken = res
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        log::debug!(
            "Obtained PayPal {} token valid for {}s",
            token.token_type,
            token.expires_in
        );
        Ok(token.access_token)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, GatewayError> {
        let res = request
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;
        Self::read_json(res, what).await
    }

    async fn read_json<T: DeserializeOwned>(res: Response, what: &str) -> Result<T, GatewayError> {
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !status.is_success() {
            log::error!("PayPal {} failed ({}): {}", what, status, body);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("Unreadable PayPal {} response: {} ({})", what, e, body);
            GatewayError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl PaymentGateway for PayPalProvider {
    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn create_order(
        &self,
        order: &OrderRequest,
        request_id: &str,
    ) -> Result<OrderResponse, GatewayError> {
        let token = self.access_token().await?;
        let request = self
            .http
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(token)
            .header(REQUEST_ID_HEADER, request_id)
            .header("Prefer", "return=representation")
            .json(order);

        let created: OrderResponse = self.send(request, "order create").await?;
        log::info!("Created PayPal order {} ({})", created.id, created.status);
        Ok(created)
    }

    async fn capture_order(
        &self,
        order_id: &str,
        request_id: &str,
    ) -> Result<OrderCapture, GatewayError> {
        let token = self.access_token().await?;
        let request = self
            .http
            .post(self.url(&format!("/v2/checkout/orders/{}/capture", order_id)))
            .bearer_auth(token)
            .header(REQUEST_ID_HEADER, request_id)
            .header("Prefer", "return=representation")
            .header("Content-Type", "application/json");

        let captured: OrderCapture = self.send(request, "order capture").await?;
        log::info!("Captured PayPal order {} ({})", captured.id, captured.status);
        Ok(captured)
    }

    async fn get_order(&self, order_id: &str) -> Result<OrderCapture, GatewayError> {
        let token = self.access_token().await?;
        let request = self
            .http
            .get(self.url(&format!("/v2/checkout/orders/{}", order_id)))
            .bearer_auth(token);
        self.send(request, "order lookup").await
    }
}
