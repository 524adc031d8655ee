use crate::models::extras::{BillingMode, ExtrasCatalog, ExtrasSelection};

/// Prices a selection of extras against a catalog.
#[derive(Debug, Clone, Default)]
pub struct ExtrasPricer {
    catalog: ExtrasCatalog,
}

impl ExtrasPricer {
    pub fn new(catalog: ExtrasCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ExtrasCatalog {
        &self.catalog
    }

    /// Daily sum of the selected per-day extras.
    pub fn per_day_cost(&self, selection: &ExtrasSelection) -> f64 {
        self.sum_for(selection, BillingMode::PerDay)
    }

    /// One-off sum of the selected flat extras.
    pub fn flat_cost(&self, selection: &ExtrasSelection) -> f64 {
        self.sum_for(selection, BillingMode::Flat)
    }

    /// Total cost of the selected extras over `duration_days`.
    pub fn price(&self, selection: &ExtrasSelection, duration_days: i64) -> f64 {
        self.per_day_cost(selection) * duration_days as f64 + self.flat_cost(selection)
    }

    fn sum_for(&self, selection: &ExtrasSelection, billing: BillingMode) -> f64 {
        selection
            .iter()
            .filter_map(|extra| self.catalog.price_of(extra))
            .filter(|price| price.billing == billing)
            .map(|price| price.unit_price)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::extras::{Extra, ExtraPrice};
    use std::collections::BTreeMap;

    #[test]
    fn test_empty_selection_is_free() {
        let pricer = ExtrasPricer::default();
        for days in [0, 1, 4, 30] {
            assert_eq!(pricer.price(&ExtrasSelection::new(), days), 0.0);
        }
    }

    #[test]
    fn test_per_day_and_flat_extras() {
        let pricer = ExtrasPricer::default();
        let selection = ExtrasSelection::new()
            .with(Extra::Gps)
            .with(Extra::BabySeat);

        // gps 5/day over 4 days + baby seat 10 once
        assert_eq!(pricer.per_day_cost(&selection), 5.0);
        assert_eq!(pricer.flat_cost(&selection), 10.0);
        assert_eq!(pricer.price(&selection, 4), 30.0);
        assert_eq!(pricer.price(&selection, 1), 15.0);
    }

    #[test]
    fn test_extras_missing_from_catalog_cost_nothing() {
        let catalog =
            ExtrasCatalog::new(BTreeMap::from([(Extra::Roadside, ExtraPrice::flat(15.0))]))
                .unwrap();
        let pricer = ExtrasPricer::new(catalog);
        let selection = ExtrasSelection::new()
            .with(Extra::Roadside)
            .with(Extra::Driver);

        assert_eq!(pricer.price(&selection, 3), 15.0);
    }
}
