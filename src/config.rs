use std::env;

use crate::errors::{AppError, Result};

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const PAYPAL_SANDBOX_URL: &str = "https://api-m.sandbox.paypal.com";
const FRONTEND_URL: &str = "http://localhost:5173";

/// Client-credentials pair for the payment processor.
#[derive(Debug, Clone)]
pub struct PayPalCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    /// `None` keeps the server running; order endpoints then answer with a configuration error.
    pub credentials: Option<PayPalCredentials>,
    pub api_url: String,
    pub merchant_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub environment: String,
    pub paypal: PayPalConfig,
    pub supabase: SupabaseConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| HOST.to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(PORT);

        let paypal = PayPalConfig {
            credentials: paypal_credentials(optional("PAYPAL_CLIENT_ID"), optional("PAYPAL_CLIENT_SECRET")),
            api_url: optional("PAYPAL_API_URL").unwrap_or_else(|| PAYPAL_SANDBOX_URL.to_string()),
            merchant_email: optional("PAYPAL_MERCHANT_EMAIL"),
        };
        if paypal.credentials.is_none() {
            log::warn!("PAYPAL_CLIENT_ID / PAYPAL_CLIENT_SECRET not set; payment endpoints will be unavailable");
        }

        let supabase = SupabaseConfig {
            url: required("SUPABASE_URL")?,
            service_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            jwt_secret: required("SUPABASE_JWT_SECRET")?,
        };

        Ok(Self {
            host,
            port,
            frontend_url: optional("FRONTEND_URL").unwrap_or_else(|| FRONTEND_URL.to_string()),
            environment: optional("RUST_ENV").unwrap_or_else(|| "development".to_string()),
            paypal,
            supabase,
        })
    }
}

/// Both halves must be present and non-blank for the pair to count as configured.
pub fn paypal_credentials(
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Option<PayPalCredentials> {
    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Some(PayPalCredentials {
            client_id,
            client_secret,
        }),
        _ => None,
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| AppError::Config(format!("{} must be set", name)))
}
