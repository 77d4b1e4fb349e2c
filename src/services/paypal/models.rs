use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub currency_code: String,
    pub value: String,
}

impl Money {
    pub fn new(currency_code: &str, amount: f64) -> Self {
        Self {
            currency_code: currency_code.to_uppercase(),
            value: format!("{:.2}", amount),
        }
    }

    pub fn amount(&self) -> Option<f64> {
        self.value.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AmountBreakdown {
    pub item_total: Money,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct AmountWithBreakdown {
    pub currency_code: String,
    pub value: String,
    pub breakdown: Option<AmountBreakdown>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub name: String,
    pub description: Option<String>,
    pub quantity: String,
    pub unit_amount: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct Payee {
    pub email_address: String,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseUnit {
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub custom_id: Option<String>,
    pub amount: AmountWithBreakdown,
    pub items: Vec<Item>,
    pub payee: Option<Payee>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationContext {
    pub brand_name: String,
    pub landing_page: String,
    pub user_action: String,
    pub shipping_preference: String,
    pub return_url: String,
    pub cancel_url: String,
}

/// Body of `POST /v2/checkout/orders`.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub intent: String,
    pub purchase_units: Vec<PurchaseUnit>,
    pub application_context: Option<ApplicationContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDescription {
    pub href: String,
    pub rel: String,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payer {
    pub payer_id: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SellerReceivableBreakdown {
    pub gross_amount: Option<Money>,
    pub paypal_fee: Option<Money>,
    pub net_amount: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    pub id: String,
    pub status: String,
    pub amount: Option<Money>,
    pub seller_receivable_breakdown: Option<SellerReceivableBreakdown>,
    pub create_time: Option<String>,
}

impl Capture {
    pub fn fee(&self) -> f64 {
        self.seller_receivable_breakdown
            .as_ref()
            .and_then(|breakdown| breakdown.paypal_fee.as_ref())
            .and_then(Money::amount)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapturedPayments {
    #[serde(default)]
    pub captures: Vec<Capture>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapturedUnit {
    pub reference_id: Option<String>,
    pub payments: Option<CapturedPayments>,
}

/// Response of `POST /v2/checkout/orders/{id}/capture`. Unknown fields are carried through
/// so the full processor result can be echoed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCapture {
    pub id: String,
    pub status: String,
    pub payer: Option<Payer>,
    #[serde(default)]
    pub purchase_units: Vec<CapturedUnit>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl OrderCapture {
    pub fn first_capture(&self) -> Option<&Capture> {
        self.purchase_units
            .iter()
            .filter_map(|unit| unit.payments.as_ref())
            .flat_map(|payments| payments.captures.iter())
            .next()
    }

    pub fn payer_id(&self) -> Option<String> {
        self.payer.as_ref().and_then(|payer| payer.payer_id.clone())
    }
}
