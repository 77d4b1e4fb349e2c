use crate::models::pricing::{AdditionalFee, PricingBreakdown};

pub const PARK_FEE_PER_PERSON: f64 = 50.0;
pub const INSURANCE_PER_PERSON: f64 = 25.0;
pub const SERVICE_FEE_RATE: f64 = 0.05;

pub struct PricingService;

impl PricingService {
    /// Price a booking: base price plus park fees, service fee and insurance.
    pub fn compute(price_per_person: f64, participants: u32) -> PricingBreakdown {
        let people = f64::from(participants);
        let base_price = round_cents(price_per_person * people);

        let additional_fees = vec![
            AdditionalFee {
                name: "Park Fees".to_string(),
                amount: round_cents(PARK_FEE_PER_PERSON * people),
                description: "National park and conservation area entry fees".to_string(),
                mandatory: true,
            },
            AdditionalFee {
                name: "Service Fee".to_string(),
                amount: Self::calculate_service_fee(base_price),
                description: "Booking and service charge (5%)".to_string(),
                mandatory: true,
            },
            AdditionalFee {
                name: "Insurance".to_string(),
                amount: round_cents(INSURANCE_PER_PERSON * people),
                description: "Travel and rescue insurance".to_string(),
                mandatory: true,
            },
        ];

        let total_amount =
            round_cents(base_price + additional_fees.iter().map(|fee| fee.amount).sum::<f64>());

        PricingBreakdown {
            base_price,
            additional_fees,
            total_amount,
        }
    }

    /// Calculate service fee (5% of the base price, no minimum)
    pub fn calculate_service_fee(base_price: f64) -> f64 {
        round_cents(base_price * SERVICE_FEE_RATE)
    }
}

/// Round half away from zero to currency minor units.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
