use serde::{Deserialize, Serialize};

/// Everything a booking form shows and submits about the price.
///
/// `total = base_cost + extras_cost`, where
/// `base_cost = daily_rate * duration_days` and
/// `extras_cost = per_day_extras * duration_days + flat_extras`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub daily_rate: f64,
    pub extras_cost: f64,
    pub duration_days: i64,
    pub total: f64,
    pub base_cost: f64,
    pub per_day_extras: f64,
    pub flat_extras: f64,
}

impl PriceBreakdown {
    /// Vehicle rate plus per-day extras, i.e. what one more day would add.
    pub fn effective_daily_rate(&self) -> f64 {
        self.daily_rate + self.per_day_extras
    }
}
