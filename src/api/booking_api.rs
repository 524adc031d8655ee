use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::booking::{Booking, BookingPayload};

pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to create booking";

/// Failure reported by a booking backend. `Display` is the message meant for
/// the customer, unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Transport(String),

    #[error("Received unexpected response format from server")]
    UnexpectedResponse,
}

/// The one capability the booking form needs from the outside world.
#[async_trait]
pub trait BookingSubmitter: Send + Sync {
    async fn submit(&self, payload: &BookingPayload) -> Result<Booking, SubmissionError>;
}

/// Keeps bookings in memory. Backs `--dry-run` and the tests.
#[derive(Default)]
pub struct InMemoryBookingSubmitter {
    bookings: Mutex<Vec<Booking>>,
    payloads: Mutex<Vec<BookingPayload>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryBookingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following submission fails with `message` until cleared.
    pub fn failing_with(message: impl Into<String>) -> Self {
        let submitter = Self::default();
        submitter.set_failure(Some(message.into()));
        submitter
    }

    pub fn set_failure(&self, message: Option<String>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = message;
        }
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.bookings
            .lock()
            .map(|bookings| bookings.clone())
            .unwrap_or_default()
    }

    /// Submissions received, including the ones that were rejected.
    pub fn call_count(&self) -> usize {
        self.payloads.lock().map(|p| p.len()).unwrap_or_default()
    }
}

#[async_trait]
impl BookingSubmitter for InMemoryBookingSubmitter {
    async fn submit(&self, payload: &BookingPayload) -> Result<Booking, SubmissionError> {
        self.payloads
            .lock()
            .map_err(|_| SubmissionError::Transport(DEFAULT_FAILURE_MESSAGE.to_string()))?
            .push(payload.clone());

        let failure = self
            .failure
            .lock()
            .map_err(|_| SubmissionError::Transport(DEFAULT_FAILURE_MESSAGE.to_string()))?
            .clone();
        if let Some(message) = failure {
            debug!("In-memory submitter rejecting booking: {}", message);
            return Err(SubmissionError::Rejected(message));
        }

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            vehicle_id: payload.vehicle_id.clone(),
            user_id: Some(payload.user_id.clone()),
            start_date: Some(payload.start_date),
            end_date: Some(payload.end_date),
            total_amount: payload.total_amount,
            status: payload.status,
            payment_status: payload.payment_status,
            created_at: Some(Utc::now()),
        };

        self.bookings
            .lock()
            .map_err(|_| SubmissionError::Transport(DEFAULT_FAILURE_MESSAGE.to_string()))?
            .push(booking.clone());

        info!("Stored booking {} in memory", booking.id);
        Ok(booking)
    }
}
