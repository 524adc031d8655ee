use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    api::booking_api::{BookingSubmitter, SubmissionError},
    models::{
        booking::{
            collect_field_errors, Booking, BookingContext, BookingFormFields, BookingPayload,
            FieldErrors, LocationInfo,
        },
        extras::{Extra, ExtrasSelection},
        pricing::PriceBreakdown,
    },
    services::price_engine::BookingPriceEngine,
};

pub const DEFAULT_SUCCESS_RESET_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Validating,
    Submitting,
    Success,
    Error,
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormState::Idle => write!(f, "idle"),
            FormState::Validating => write!(f, "validating"),
            FormState::Submitting => write!(f, "submitting"),
            FormState::Success => write!(f, "success"),
            FormState::Error => write!(f, "error"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum BookingFormError {
    #[error("Booking cannot be submitted while the form is {0}")]
    NotReady(FormState),

    #[error("Please fill in all required fields")]
    Invalid(FieldErrors),

    #[error("No booking submission is in flight")]
    NotSubmitting,
}

/// Result of one press of the submit button.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(Booking),
    Invalid(FieldErrors),
    Failed(String),
    /// A submission was already in flight, or the form is showing a success.
    Ignored,
}

/// State of one booking form: its fields, the lifecycle
/// (`Idle -> Validating -> Submitting -> Success | Error`) and the submission
/// guard.
///
/// At most one submission is in flight per form. The guard is the
/// `Submitting` state itself: it is entered before the backend is called and
/// left only by [`BookingForm::finish_submit`].
pub struct BookingForm {
    context: BookingContext,
    fields: BookingFormFields,
    state: FormState,
    field_errors: FieldErrors,
    error_message: Option<String>,
    success: bool,
    last_booking: Option<Booking>,
    engine: BookingPriceEngine,
    submitter: Arc<dyn BookingSubmitter>,
    success_reset_delay: Duration,
}

impl BookingForm {
    pub fn new(
        context: BookingContext,
        engine: BookingPriceEngine,
        submitter: Arc<dyn BookingSubmitter>,
    ) -> Self {
        Self {
            context,
            fields: BookingFormFields::default(),
            state: FormState::Idle,
            field_errors: FieldErrors::new(),
            error_message: None,
            success: false,
            last_booking: None,
            engine,
            submitter,
            success_reset_delay: DEFAULT_SUCCESS_RESET_DELAY,
        }
    }

    pub fn with_success_reset_delay(mut self, delay: Duration) -> Self {
        self.success_reset_delay = delay;
        self
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn fields(&self) -> &BookingFormFields {
        &self.fields
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn last_booking(&self) -> Option<&Booking> {
        self.last_booking.as_ref()
    }

    pub fn is_submit_enabled(&self) -> bool {
        matches!(self.state, FormState::Idle | FormState::Error)
    }

    /// Live price for the current fields.
    pub fn quote(&self) -> PriceBreakdown {
        self.engine.compute_total(
            self.context.daily_rate,
            &self.fields.extras,
            self.fields.start_date,
            self.fields.end_date,
        )
    }

    // Edits. All of them are ignored while a submission is in flight and
    // return whether they were applied.

    pub fn set_dates(
        &mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> bool {
        self.edit(|fields| {
            fields.start_date = start;
            fields.end_date = end;
        })
    }

    pub fn set_pickup_location(&mut self, location: LocationInfo) -> bool {
        self.edit(|fields| fields.pickup_location = location)
    }

    pub fn set_dropoff_location(&mut self, location: LocationInfo) -> bool {
        self.edit(|fields| fields.dropoff_location = location)
    }

    pub fn toggle_extra(&mut self, extra: Extra) -> bool {
        self.edit(|fields| {
            fields.extras.toggle(extra);
        })
    }

    pub fn set_extras(&mut self, extras: ExtrasSelection) -> bool {
        self.edit(|fields| fields.extras = extras)
    }

    /// The customer signed in or out.
    pub fn set_user(&mut self, user_id: Option<String>) -> bool {
        if self.state == FormState::Submitting {
            return false;
        }
        self.context.user_id = user_id;
        true
    }

    fn edit(&mut self, apply: impl FnOnce(&mut BookingFormFields)) -> bool {
        match self.state {
            FormState::Submitting | FormState::Validating => {
                debug!("Ignoring edit while form is {}", self.state);
                false
            }
            FormState::Success => {
                // a new attempt starts from a clean slate
                self.success = false;
                apply(&mut self.fields);
                self.transition(FormState::Idle);
                true
            }
            FormState::Error => {
                // the message stays visible until the next submit
                apply(&mut self.fields);
                self.transition(FormState::Idle);
                true
            }
            FormState::Idle => {
                apply(&mut self.fields);
                true
            }
        }
    }

    /// Validates the fields and, when they pass, enters `Submitting` and
    /// returns the payload to send. The caller must report the backend's
    /// answer through [`BookingForm::finish_submit`].
    pub fn begin_submit(&mut self) -> Result<BookingPayload, BookingFormError> {
        if !self.is_submit_enabled() {
            debug!("Submit ignored, form is {}", self.state);
            return Err(BookingFormError::NotReady(self.state));
        }

        self.error_message = None;
        self.transition(FormState::Validating);

        let errors = self.validate_fields();
        let total = self.quote().total;
        let payload = BookingPayload::from_form(&self.context, &self.fields, total);

        match payload {
            Some(payload) if errors.is_empty() => {
                self.field_errors.clear();
                self.transition(FormState::Submitting);
                info!(
                    "Submitting booking for vehicle {} totalling {}",
                    payload.vehicle_id, payload.total_amount
                );
                Ok(payload)
            }
            _ => {
                warn!("Booking form invalid: {:?}", errors);
                self.field_errors = errors.clone();
                self.transition(FormState::Idle);
                Err(BookingFormError::Invalid(errors))
            }
        }
    }

    /// Terminal callback of a submission started by [`BookingForm::begin_submit`].
    pub fn finish_submit(
        &mut self,
        result: Result<Booking, SubmissionError>,
    ) -> Result<(), BookingFormError> {
        if self.state != FormState::Submitting {
            return Err(BookingFormError::NotSubmitting);
        }

        match result {
            Ok(booking) => {
                info!("Booking {} created", booking.id);
                self.fields = BookingFormFields::default();
                self.success = true;
                self.last_booking = Some(booking);
                self.transition(FormState::Success);
            }
            Err(e) => {
                warn!("Booking submission failed: {}", e);
                self.error_message = Some(e.to_string());
                self.transition(FormState::Error);
            }
        }
        Ok(())
    }

    /// Validate, call the backend once, and record the outcome.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let payload = match self.begin_submit() {
            Ok(payload) => payload,
            Err(BookingFormError::Invalid(errors)) => return SubmitOutcome::Invalid(errors),
            Err(_) => return SubmitOutcome::Ignored,
        };

        let submitter = Arc::clone(&self.submitter);
        let result = submitter.submit(&payload).await;

        let outcome = match &result {
            Ok(booking) => SubmitOutcome::Submitted(booking.clone()),
            Err(e) => SubmitOutcome::Failed(e.to_string()),
        };
        if let Err(e) = self.finish_submit(result) {
            warn!("Could not record booking outcome: {}", e);
        }
        outcome
    }

    /// User-initiated reset out of `Success` or `Error`. Does nothing while a
    /// submission is in flight.
    pub fn reset(&mut self) -> bool {
        match self.state {
            FormState::Submitting | FormState::Validating => false,
            _ => {
                self.success = false;
                self.error_message = None;
                self.field_errors.clear();
                self.transition(FormState::Idle);
                true
            }
        }
    }

    /// Keeps the success banner up for the configured delay, then resets.
    pub async fn reset_after_success(&mut self) -> bool {
        if self.state != FormState::Success {
            return false;
        }
        tokio::time::sleep(self.success_reset_delay).await;
        self.reset()
    }

    fn validate_fields(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if let Err(e) = self.fields.validate() {
            collect_field_errors(&e, &mut errors);
        }
        if let Err(e) = self.context.validate() {
            collect_field_errors(&e, &mut errors);
        }
        if !self.context.daily_rate.is_finite() {
            errors
                .entry("daily_rate".to_string())
                .or_default()
                .push("Daily rate must be a non-negative number".to_string());
        }
        if let Err(e) = self
            .engine
            .calculator()
            .check_order(self.fields.start_date, self.fields.end_date)
        {
            errors
                .entry("end_date".to_string())
                .or_default()
                .push(e.to_string());
        }

        errors
    }

    fn transition(&mut self, next: FormState) {
        if self.state != next {
            debug!("Booking form: {} -> {}", self.state, next);
            self.state = next;
        }
    }
}
