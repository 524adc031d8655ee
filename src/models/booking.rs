use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::extras::ExtrasSelection;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Active => write!(f, "active"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
            PaymentStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl LocationInfo {
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            coordinates: None,
        }
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some(Coordinates { lat, lng });
        self
    }
}

/// Inclusive pickup/drop-off instants of a rental.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

lazy_static::lazy_static! {
    static ref ADDRESS_REGEX: Regex = Regex::new(r"[\p{L}\p{N}]").unwrap();
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn check_location(
    location: &LocationInfo,
    missing: &'static str,
    unpicked: &'static str,
) -> Result<(), ValidationError> {
    if location.address.trim().is_empty() || !ADDRESS_REGEX.is_match(&location.address) {
        return Err(field_error("required", missing));
    }

    if let Some(coordinates) = location.coordinates {
        // (0, 0) is what an untouched map picker reports
        if coordinates.lat == 0.0 && coordinates.lng == 0.0 {
            return Err(field_error("coordinates_unset", unpicked));
        }
        if !(-90.0..=90.0).contains(&coordinates.lat)
            || !(-180.0..=180.0).contains(&coordinates.lng)
        {
            return Err(field_error("coordinates_range", "Coordinates are out of range"));
        }
    }

    Ok(())
}

fn validate_pickup_location(location: &LocationInfo) -> Result<(), ValidationError> {
    check_location(
        location,
        "Pickup location is required",
        "Please select a pickup location on the map",
    )
}

fn validate_dropoff_location(location: &LocationInfo) -> Result<(), ValidationError> {
    check_location(
        location,
        "Drop-off location is required",
        "Please select a drop-off location on the map",
    )
}

/// Editable fields of a booking form. The `validate` attributes are the
/// form's validation schema.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingFormFields {
    #[validate(required(message = "Start date is required"))]
    pub start_date: Option<DateTime<Utc>>,

    #[validate(required(message = "End date is required"))]
    pub end_date: Option<DateTime<Utc>>,

    #[validate(custom = "validate_pickup_location")]
    pub pickup_location: LocationInfo,

    #[validate(custom = "validate_dropoff_location")]
    pub dropoff_location: LocationInfo,

    pub extras: ExtrasSelection,
}

impl BookingFormFields {
    pub fn date_range(&self) -> Option<DateRange> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            _ => None,
        }
    }
}

/// What the enclosing page knows about the vehicle and the signed-in customer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingContext {
    #[validate(length(min = 1, message = "Vehicle reference is required"))]
    pub vehicle_id: String,

    #[validate(range(min = 0.0, message = "Daily rate must be a non-negative number"))]
    pub daily_rate: f64,

    #[validate(required(message = "You must be logged in to make a booking"))]
    pub user_id: Option<String>,
}

impl BookingContext {
    pub fn new(vehicle_id: impl Into<String>, daily_rate: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            daily_rate,
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Field name -> human readable messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub fn collect_field_errors(errors: &ValidationErrors, into: &mut FieldErrors) {
    for (field, field_errors) in errors.field_errors() {
        let messages = into.entry(field.to_string()).or_default();
        for error in field_errors.iter() {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string());
            messages.push(message);
        }
    }
}

/// Body posted to the booking API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub vehicle_id: String,
    pub user_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub pickup_location: LocationInfo,
    pub dropoff_location: LocationInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropoff_coordinates: Option<Coordinates>,
    pub extras: ExtrasSelection,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

impl BookingPayload {
    /// Returns `None` when the dates or the customer are missing.
    pub fn from_form(
        context: &BookingContext,
        fields: &BookingFormFields,
        total_amount: f64,
    ) -> Option<Self> {
        let range = fields.date_range()?;
        let user_id = context.user_id.clone()?;

        Some(Self {
            vehicle_id: context.vehicle_id.clone(),
            user_id,
            start_date: range.start,
            end_date: range.end,
            pickup_location: fields.pickup_location.clone(),
            dropoff_location: fields.dropoff_location.clone(),
            pickup_coordinates: fields.pickup_location.coordinates,
            dropoff_coordinates: fields.dropoff_location.coordinates,
            extras: fields.extras.clone(),
            total_amount,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
        })
    }
}

/// Booking as acknowledged by the backend.
///
/// References and amounts are read leniently: the backend may populate a
/// reference with the whole document, send `null`, or send numbers as strings.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub vehicle_id: String,
    #[serde(default, deserialize_with = "lenient_optional_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_amount: f64,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Id of a reference that is either a plain id or a populated document.
pub fn reference_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(doc) => doc.get("_id").or_else(|| doc.get("id")).and_then(reference_id),
        _ => None,
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(reference_id(&Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(reference_id(&Value::deserialize(deserializer)?))
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(amount.filter(|a| a.is_finite()).unwrap_or_default())
}
