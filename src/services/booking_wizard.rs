//! Three-step booking form as an explicit state machine.
//!
//! `PersonalInfo -> Participants -> ReviewAndTerms -> PaymentPresented`. Forward moves validate
//! the current step only; back moves (2->1, 3->2) never validate. Submitting re-checks every
//! step, since earlier fields stay editable, then freezes a [`BookingPayload`] inside the final
//! state. Dropping the wizard discards everything.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::booking::{
    Acknowledgements, BookingFormDraft, BookingPayload, CustomerInfo, ParticipantDetail,
};
use crate::models::pricing::PricingBreakdown;
use crate::models::tour::TourPackage;
use crate::services::pricing_service::PricingService;
use crate::services::validation::{self, FieldErrors};

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq)]
pub enum WizardStep {
    PersonalInfo,
    Participants,
    ReviewAndTerms,
    PaymentPresented(BookingPayload),
}

impl WizardStep {
    pub fn name(&self) -> &'static str {
        match self {
            WizardStep::PersonalInfo => "personal_info",
            WizardStep::Participants => "participants",
            WizardStep::ReviewAndTerms => "review_and_terms",
            WizardStep::PaymentPresented(_) => "payment_presented",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            WizardStep::PersonalInfo => 1,
            WizardStep::Participants => 2,
            WizardStep::ReviewAndTerms => 3,
            WizardStep::PaymentPresented(_) => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WizardError {
    #[error("{0}")]
    Invalid(FieldErrors),

    #[error("cannot {action} from step {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("booking already submitted for payment")]
    AlreadySubmitted,

    #[error("no participant at position {0}")]
    UnknownParticipant(usize),
}

impl From<FieldErrors> for WizardError {
    fn from(errors: FieldErrors) -> Self {
        WizardError::Invalid(errors)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    Terms,
    CancellationPolicy,
    PrivacyPolicy,
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    tour: TourPackage,
    today: NaiveDate,
    currency: String,
    draft: BookingFormDraft,
    acknowledgements: Acknowledgements,
    pricing: PricingBreakdown,
    step: WizardStep,
}

impl BookingWizard {
    /// Opens the wizard for one tour with a single participant pre-selected.
    pub fn new(tour: TourPackage, today: NaiveDate) -> Self {
        let draft = BookingFormDraft {
            participants: 1,
            participant_details: vec![ParticipantDetail::default()],
            ..Default::default()
        };
        let pricing = PricingService::compute(tour.price_usd, draft.participants);

        Self {
            tour,
            today,
            currency: DEFAULT_CURRENCY.to_string(),
            draft,
            acknowledgements: Acknowledgements::default(),
            pricing,
            step: WizardStep::PersonalInfo,
        }
    }

    pub fn step(&self) -> &WizardStep {
        &self.step
    }

    pub fn draft(&self) -> &BookingFormDraft {
        &self.draft
    }

    pub fn pricing(&self) -> &PricingBreakdown {
        &self.pricing
    }

    pub fn tour(&self) -> &TourPackage {
        &self.tour
    }

    pub fn acknowledgements(&self) -> Acknowledgements {
        self.acknowledgements
    }

    /// The frozen payload, once submitted.
    pub fn payload(&self) -> Option<&BookingPayload> {
        match &self.step {
            WizardStep::PaymentPresented(payload) => Some(payload),
            _ => None,
        }
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        match self.step {
            WizardStep::PaymentPresented(_) => Err(WizardError::AlreadySubmitted),
            _ => Ok(()),
        }
    }

    pub fn set_customer(&mut self, customer: CustomerInfo) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.draft.customer = customer;
        Ok(())
    }

    pub fn set_start_date(&mut self, date: NaiveDate) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.draft.start_date = Some(date);
        Ok(())
    }

    /// Resizes the participant list to exactly `participants` and reprices.
    /// Counts outside `1..=max_participants` are rejected without touching the draft.
    pub fn set_participants(&mut self, participants: u32) -> Result<(), WizardError> {
        self.ensure_editable()?;
        validation::validate_participant_count(participants, self.tour.max_participants)
            .into_result()?;

        self.draft.participants = participants;
        self.draft
            .participant_details
            .resize_with(participants as usize, ParticipantDetail::default);
        self.pricing = PricingService::compute(self.tour.price_usd, participants);
        Ok(())
    }

    pub fn update_participant(
        &mut self,
        index: usize,
        detail: ParticipantDetail,
    ) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let slot = self
            .draft
            .participant_details
            .get_mut(index)
            .ok_or(WizardError::UnknownParticipant(index))?;
        *slot = detail;
        Ok(())
    }

    pub fn set_special_requests(
        &mut self,
        special_requests: Option<String>,
        accessibility_needs: Option<String>,
    ) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.draft.special_requests = special_requests;
        self.draft.accessibility_needs = accessibility_needs;
        Ok(())
    }

    pub fn set_acknowledgement(
        &mut self,
        which: Acknowledgement,
        accepted: bool,
    ) -> Result<(), WizardError> {
        self.ensure_editable()?;
        match which {
            Acknowledgement::Terms => self.acknowledgements.terms = accepted,
            Acknowledgement::CancellationPolicy => {
                self.acknowledgements.cancellation_policy = accepted
            }
            Acknowledgement::PrivacyPolicy => self.acknowledgements.privacy_policy = accepted,
        }
        Ok(())
    }

    /// Errors that currently block leaving this step.
    pub fn step_errors(&self) -> FieldErrors {
        match self.step {
            WizardStep::PersonalInfo => validation::validate_personal_info(
                &self.draft,
                self.tour.max_participants,
                self.today,
            ),
            WizardStep::Participants => validation::validate_participants(&self.draft),
            WizardStep::ReviewAndTerms => {
                validation::validate_acknowledgements(&self.acknowledgements)
            }
            WizardStep::PaymentPresented(_) => FieldErrors::new(),
        }
    }

    pub fn next(&mut self) -> Result<&WizardStep, WizardError> {
        let next = match self.step {
            WizardStep::PersonalInfo => WizardStep::Participants,
            WizardStep::Participants => WizardStep::ReviewAndTerms,
            WizardStep::ReviewAndTerms => {
                return Err(WizardError::InvalidTransition {
                    from: self.step.name(),
                    action: "advance",
                })
            }
            WizardStep::PaymentPresented(_) => return Err(WizardError::AlreadySubmitted),
        };
        self.step_errors().into_result()?;
        self.step = next;
        Ok(&self.step)
    }

    pub fn back(&mut self) -> Result<&WizardStep, WizardError> {
        self.step = match self.step {
            WizardStep::Participants => WizardStep::PersonalInfo,
            WizardStep::ReviewAndTerms => WizardStep::Participants,
            WizardStep::PersonalInfo => {
                return Err(WizardError::InvalidTransition {
                    from: self.step.name(),
                    action: "go back",
                })
            }
            WizardStep::PaymentPresented(_) => return Err(WizardError::AlreadySubmitted),
        };
        Ok(&self.step)
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.step, WizardStep::ReviewAndTerms) && self.submission_errors().is_empty()
    }

    /// Every step's errors together.
    fn submission_errors(&self) -> FieldErrors {
        let mut errors =
            validation::validate_personal_info(&self.draft, self.tour.max_participants, self.today);
        errors.merge(validation::validate_participants(&self.draft));
        errors.merge(validation::validate_acknowledgements(&self.acknowledgements));
        errors
    }

    /// Freezes the draft and pricing into a payload and presents payment.
    pub fn submit(&mut self) -> Result<&BookingPayload, WizardError> {
        match self.step {
            WizardStep::ReviewAndTerms => {}
            WizardStep::PaymentPresented(_) => return Err(WizardError::AlreadySubmitted),
            _ => {
                return Err(WizardError::InvalidTransition {
                    from: self.step.name(),
                    action: "submit",
                })
            }
        }
        self.submission_errors().into_result()?;

        let start_date = self.draft.start_date.ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.add("start_date", "Please select a start date");
            WizardError::Invalid(errors)
        })?;

        let payload = BookingPayload {
            tour_id: self.tour.id,
            tour_title: self.tour.title.clone(),
            price_per_person: self.tour.price_usd,
            customer: self.draft.customer.clone(),
            start_date,
            participants: self.draft.participants,
            special_requests: self.draft.special_requests.clone(),
            accessibility_needs: self.draft.accessibility_needs.clone(),
            participant_details: self.draft.participant_details.clone(),
            pricing: self.pricing.clone(),
            currency: self.currency.clone(),
        };
        log::debug!(
            "Booking for tour {} submitted for payment: {} participants, total {:.2} {}",
            payload.tour_id,
            payload.participants,
            payload.pricing.total_amount,
            payload.currency
        );

        self.step = WizardStep::PaymentPresented(payload);
        self.payload().ok_or(WizardError::InvalidTransition {
            from: "review_and_terms",
            action: "submit",
        })
    }

    /// Closes the modal. Draft, acknowledgements and any payload are dropped; only the tour survives.
    pub fn cancel(self) -> TourPackage {
        log::debug!("Booking wizard for tour {} closed at {}", self.tour.id, self.step.name());
        self.tour
    }
}
