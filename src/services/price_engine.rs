use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    models::{
        extras::{ExtrasCatalog, ExtrasSelection},
        pricing::PriceBreakdown,
    },
    services::{duration::DurationCalculator, extras_pricer::ExtrasPricer},
};

/// Combines the vehicle's daily rate, the selected extras and the rental
/// duration into a [`PriceBreakdown`].
///
/// Every total in the crate is computed here, with a single convention:
/// `daily_rate * days + per_day_extras * days + flat_extras`.
#[derive(Debug, Clone, Default)]
pub struct BookingPriceEngine {
    calculator: DurationCalculator,
    pricer: ExtrasPricer,
}

impl BookingPriceEngine {
    pub fn new(calculator: DurationCalculator, pricer: ExtrasPricer) -> Self {
        Self { calculator, pricer }
    }

    pub fn with_catalog(catalog: ExtrasCatalog) -> Self {
        Self::new(DurationCalculator::default(), ExtrasPricer::new(catalog))
    }

    pub fn calculator(&self) -> &DurationCalculator {
        &self.calculator
    }

    pub fn pricer(&self) -> &ExtrasPricer {
        &self.pricer
    }

    /// Never fails. Negative or NaN rates flow through to the result; callers
    /// validate their inputs first.
    pub fn compute_total(
        &self,
        daily_rate: f64,
        selection: &ExtrasSelection,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> PriceBreakdown {
        let duration_days = self.calculator.duration_days(start, end);
        let per_day_extras = self.pricer.per_day_cost(selection);
        let flat_extras = self.pricer.flat_cost(selection);

        let base_cost = daily_rate * duration_days as f64;
        let extras_cost = self.pricer.price(selection, duration_days);
        let total = base_cost + extras_cost;

        debug!(
            "Price: {} per day x {} days + {} extras = {}",
            daily_rate, duration_days, extras_cost, total
        );

        PriceBreakdown {
            daily_rate,
            extras_cost,
            duration_days,
            total,
            base_cost,
            per_day_extras,
            flat_extras,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::extras::{Extra, ExtraPrice};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn march(d: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_four_days_without_extras() {
        let engine = BookingPriceEngine::default();
        let breakdown = engine.compute_total(50.0, &ExtrasSelection::new(), march(1), march(5));

        assert_eq!(breakdown.duration_days, 4);
        assert_eq!(breakdown.extras_cost, 0.0);
        assert_eq!(breakdown.total, 200.0);
    }

    #[test]
    fn test_extras_deltas() {
        let catalog = ExtrasCatalog::new(BTreeMap::from([
            (Extra::Gps, ExtraPrice::per_day(5.0)),
            (Extra::BabySeat, ExtraPrice::flat(10.0)),
        ]))
        .unwrap();
        let engine = BookingPriceEngine::with_catalog(catalog);
        let none = ExtrasSelection::new();
        let gps = ExtrasSelection::new().with(Extra::Gps);
        let seat = ExtrasSelection::new().with(Extra::BabySeat);

        let base = engine.compute_total(50.0, &none, march(1), march(5)).total;
        assert_eq!(engine.compute_total(50.0, &gps, march(1), march(5)).total - base, 20.0);
        assert_eq!(engine.compute_total(50.0, &seat, march(1), march(5)).total - base, 10.0);

        let short = engine.compute_total(50.0, &none, march(1), march(2)).total;
        assert_eq!(engine.compute_total(50.0, &seat, march(1), march(2)).total - short, 10.0);
    }

    #[test]
    fn test_at_least_one_day_charged() {
        let engine = BookingPriceEngine::default();
        let breakdown = engine.compute_total(42.0, &ExtrasSelection::new(), None, None);
        assert_eq!(breakdown.duration_days, 1);
        assert!(breakdown.total >= 42.0);
    }

    #[test]
    fn test_invalid_rate_propagates() {
        let engine = BookingPriceEngine::default();
        let breakdown = engine.compute_total(f64::NAN, &ExtrasSelection::new(), march(1), march(3));
        assert!(breakdown.total.is_nan());

        let breakdown = engine.compute_total(-10.0, &ExtrasSelection::new(), march(1), march(3));
        assert_eq!(breakdown.total, -20.0);
    }

    #[test]
    fn test_breakdown_parts_add_up() {
        let engine = BookingPriceEngine::default();
        let selection = ExtrasSelection::new()
            .with(Extra::Driver)
            .with(Extra::Roadside);
        let breakdown = engine.compute_total(30.0, &selection, march(1), march(4));

        assert_eq!(breakdown.base_cost, 90.0);
        assert_eq!(breakdown.per_day_extras, 10.0);
        assert_eq!(breakdown.flat_extras, 15.0);
        assert_eq!(breakdown.extras_cost, 45.0);
        assert_eq!(breakdown.total, breakdown.base_cost + breakdown.extras_cost);
        assert_eq!(breakdown.effective_daily_rate(), 40.0);
    }
}
