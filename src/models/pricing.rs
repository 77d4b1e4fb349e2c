use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalFee {
    pub name: String,
    pub amount: f64,
    pub description: String,
    pub mandatory: bool,
}

/// Derived from a tour price and participant count; recomputed on every count change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub base_price: f64,
    pub additional_fees: Vec<AdditionalFee>,
    pub total_amount: f64,
}

impl PricingBreakdown {
    /// Sum of the order lines sent to the processor; equals `total_amount` once rounded.
    pub fn item_total(&self) -> f64 {
        self.base_price + self.fee_total()
    }

    pub fn fee_total(&self) -> f64 {
        self.additional_fees.iter().map(|fee| fee.amount).sum()
    }

    pub fn fee(&self, name: &str) -> Option<&AdditionalFee> {
        self.additional_fees.iter().find(|fee| fee.name == name)
    }
}
