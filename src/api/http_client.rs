use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    api::booking_api::{BookingSubmitter, SubmissionError, DEFAULT_FAILURE_MESSAGE},
    models::booking::{reference_id, Booking, BookingPayload},
};

/// Posts bookings to the storefront's REST API (`POST {base_url}/bookings`).
pub struct HttpBookingSubmitter {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBookingSubmitter {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token,
        }
    }

    pub fn bookings_url(&self) -> String {
        format!("{}/bookings", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl BookingSubmitter for HttpBookingSubmitter {
    async fn submit(&self, payload: &BookingPayload) -> Result<Booking, SubmissionError> {
        let url = self.bookings_url();
        info!("Submitting booking for vehicle {} to {}", payload.vehicle_id, url);

        let mut request = self.client.post(&url).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!("Booking request failed: {}", e);
            SubmissionError::Transport(DEFAULT_FAILURE_MESSAGE.to_string())
        })?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        debug!("Booking API answered {} with {}", status, body);

        if !status.is_success() {
            let message = error_message(&body);
            warn!("Booking rejected with status {}: {}", status, message);
            return Err(SubmissionError::Rejected(message));
        }

        extract_booking(body)
    }
}

/// Message of an API error body, `{"message": ..}` or `{"error": {"message": ..}}`.
pub fn error_message(body: &Value) -> String {
    body.get("message")
        .or_else(|| body.get("error").and_then(|e| e.get("message")))
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(DEFAULT_FAILURE_MESSAGE)
        .to_string()
}

/// The API answers with `{"data": {"booking": ..}}`, `{"booking": ..}` or the
/// bare booking, using either `id` or `_id`.
///
/// Once a booking object is found the booking exists on the server, so a body
/// that does not fully decode still yields a booking carrying its id.
pub fn extract_booking(body: Value) -> Result<Booking, SubmissionError> {
    let booking = match body {
        Value::Object(mut root) => {
            if let Some(booking) = root
                .get_mut("data")
                .and_then(|data| data.get_mut("booking"))
                .map(Value::take)
            {
                booking
            } else if let Some(booking) = root.remove("booking") {
                booking
            } else if root.contains_key("_id") || root.contains_key("id") {
                Value::Object(root)
            } else {
                error!("Unexpected booking response format");
                return Err(SubmissionError::UnexpectedResponse);
            }
        }
        _ => return Err(SubmissionError::UnexpectedResponse),
    };

    if !booking.is_object() {
        error!("Booking response carries no booking object");
        return Err(SubmissionError::UnexpectedResponse);
    }

    match serde_json::from_value::<Booking>(booking.clone()) {
        Ok(decoded) => Ok(decoded),
        Err(e) => {
            warn!("Booking created but its details could not be decoded: {}", e);
            Ok(Booking {
                id: booking
                    .get("_id")
                    .or_else(|| booking.get("id"))
                    .and_then(reference_id)
                    .unwrap_or_default(),
                ..Booking::default()
            })
        }
    }
}
