//! Field validation shared by every wizard step, the order endpoints, reviews and profiles.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::models::booking::{
    Acknowledgements, BookingFormDraft, BookingPayload, CustomerInfo, ParticipantDetail,
};
use crate::models::pricing::PricingBreakdown;
use crate::models::profile::ProfileUpdate;
use crate::models::review::NewReview;
use crate::models::tour::TourPackage;
use crate::services::pricing_service::PricingService;

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PHONE_LEN: usize = 10;
pub const MIN_REVIEW_LEN: usize = 10;
pub const MAX_REVIEW_LEN: usize = 2000;
/// Tour prices are stored in US dollars.
pub const BOOKING_CURRENCY: &str = "USD";
/// Half a cent.
pub const AMOUNT_TOLERANCE: f64 = 0.005;

/// Field path (e.g. `participant_details[1].age`) to message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$")
            .ok()
    })
    .as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(email.trim()))
}

fn min_chars(errors: &mut FieldErrors, field: &str, value: &str, min: usize, label: &str) {
    if value.trim().chars().count() < min {
        errors.add(field, format!("{} must be at least {} characters", label, min));
    }
}

pub fn validate_customer(customer: &CustomerInfo) -> FieldErrors {
    let mut errors = FieldErrors::new();
    min_chars(&mut errors, "full_name", &customer.full_name, MIN_NAME_LEN, "Name");
    if !is_valid_email(&customer.email) {
        errors.add("email", "Please enter a valid email address");
    }
    min_chars(&mut errors, "phone", &customer.phone, MIN_PHONE_LEN, "Phone number");
    min_chars(&mut errors, "nationality", &customer.nationality, MIN_NAME_LEN, "Nationality");
    errors
}

pub fn validate_participant_count(participants: u32, max_participants: u32) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if participants < 1 {
        errors.add("participants", "At least 1 participant is required");
    } else if participants > max_participants {
        errors.add(
            "participants",
            format!("Maximum {} participants allowed", max_participants),
        );
    }
    errors
}

/// Step 1: identity, start date and group size.
pub fn validate_personal_info(
    draft: &BookingFormDraft,
    max_participants: u32,
    today: NaiveDate,
) -> FieldErrors {
    let mut errors = validate_customer(&draft.customer);
    match draft.start_date {
        None => errors.add("start_date", "Please select a start date"),
        Some(date) if date < today => errors.add("start_date", "Start date cannot be in the past"),
        Some(_) => {}
    }
    errors.merge(validate_participant_count(draft.participants, max_participants));
    errors
}

pub fn validate_participant(index: usize, participant: &ParticipantDetail) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let prefix = format!("participant_details[{}]", index);
    min_chars(
        &mut errors,
        &format!("{}.name", prefix),
        &participant.name,
        MIN_NAME_LEN,
        "Name",
    );
    if !(1..=100).contains(&participant.age) {
        errors.add(format!("{}.age", prefix), "Age must be between 1 and 100");
    }
    min_chars(
        &mut errors,
        &format!("{}.nationality", prefix),
        &participant.nationality,
        MIN_NAME_LEN,
        "Nationality",
    );
    errors
}

/// Step 2: one complete record per participant.
pub fn validate_participants(draft: &BookingFormDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if draft.participant_details.len() != draft.participants as usize {
        errors.add(
            "participant_details",
            format!("Expected details for {} participants", draft.participants),
        );
    }
    for (index, participant) in draft.participant_details.iter().enumerate() {
        errors.merge(validate_participant(index, participant));
    }
    errors
}

/// Step 3: every acknowledgement must be ticked.
pub fn validate_acknowledgements(acks: &Acknowledgements) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if acks.all_accepted() {
        return errors;
    }
    if !acks.terms {
        errors.add("terms", "You must accept the terms and conditions");
    }
    if !acks.cancellation_policy {
        errors.add("cancellation_policy", "You must accept the cancellation policy");
    }
    if !acks.privacy_policy {
        errors.add("privacy_policy", "You must accept the privacy policy");
    }
    errors
}

/// Server-side check of a payload received by the order endpoints.
pub fn validate_payload(payload: &BookingPayload) -> FieldErrors {
    let mut errors = validate_customer(&payload.customer);
    if payload.participants < 1 {
        errors.add("participants", "At least 1 participant is required");
    }
    let draft = BookingFormDraft {
        participants: payload.participants,
        participant_details: payload.participant_details.clone(),
        ..Default::default()
    };
    errors.merge(validate_participants(&draft));
    if !is_currency_code(&payload.currency) {
        errors.add("currency", "Currency must be a 3-letter ISO code");
    }
    if payload.pricing.total_amount <= 0.0 {
        errors.add("pricing.total_amount", "Total amount must be positive");
    }
    errors
}

fn same_amount(a: f64, b: f64) -> bool {
    (a - b).abs() <= AMOUNT_TOLERANCE
}

fn same_pricing(sent: &PricingBreakdown, expected: &PricingBreakdown) -> bool {
    same_amount(sent.base_price, expected.base_price)
        && same_amount(sent.total_amount, expected.total_amount)
        && sent.additional_fees.len() == expected.additional_fees.len()
        && sent
            .additional_fees
            .iter()
            .zip(&expected.additional_fees)
            .all(|(a, b)| a.name == b.name && same_amount(a.amount, b.amount))
}

/// Checks a payload against the stored tour: group size, per-person price and the whole
/// breakdown, which must be exactly what the pricing calculator gives for that tour.
pub fn validate_against_tour(payload: &BookingPayload, tour: &TourPackage) -> FieldErrors {
    let mut errors = validate_participant_count(payload.participants, tour.max_participants);
    if !payload.currency.eq_ignore_ascii_case(BOOKING_CURRENCY) {
        errors.add("currency", format!("Bookings are charged in {}", BOOKING_CURRENCY));
    }
    if !same_amount(payload.price_per_person, tour.price_usd) {
        errors.add(
            "price_per_person",
            format!("Price per person is {:.2} {}", tour.price_usd, BOOKING_CURRENCY),
        );
    }
    let expected = PricingService::compute(tour.price_usd, payload.participants);
    if !same_pricing(&payload.pricing, &expected) {
        errors.add(
            "pricing",
            format!(
                "Pricing does not match the tour; expected a total of {:.2} {}",
                expected.total_amount, BOOKING_CURRENCY
            ),
        );
    }
    errors
}

pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn validate_review(review: &NewReview) -> FieldErrors {
    let mut errors = FieldErrors::new();
    min_chars(&mut errors, "customer_name", &review.customer_name, MIN_NAME_LEN, "Name");
    if !(1..=5).contains(&review.rating) {
        errors.add("rating", "Rating must be between 1 and 5");
    }
    let length = review.content.trim().chars().count();
    if length < MIN_REVIEW_LEN {
        errors.add(
            "content",
            format!("Review must be at least {} characters", MIN_REVIEW_LEN),
        );
    } else if length > MAX_REVIEW_LEN {
        errors.add(
            "content",
            format!("Review must be at most {} characters", MAX_REVIEW_LEN),
        );
    }
    errors
}

pub fn validate_profile_update(update: &ProfileUpdate) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if let Some(name) = &update.full_name {
        min_chars(&mut errors, "full_name", name, MIN_NAME_LEN, "Name");
    }
    if let Some(phone) = &update.phone {
        min_chars(&mut errors, "phone", phone, MIN_PHONE_LEN, "Phone number");
    }
    if let Some(nationality) = &update.nationality {
        min_chars(&mut errors, "nationality", nationality, MIN_NAME_LEN, "Nationality");
    }
    errors
}
