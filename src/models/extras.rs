use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Optional add-ons a customer can attach to a rental.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Extra {
    Driver,
    Gps,
    AirConditioning,
    Bluetooth,
    BabySeat,
    AdditionalDriver,
    Roadside,
}

impl Extra {
    pub const ALL: [Extra; 7] = [
        Extra::Driver,
        Extra::Gps,
        Extra::AirConditioning,
        Extra::Bluetooth,
        Extra::BabySeat,
        Extra::AdditionalDriver,
        Extra::Roadside,
    ];

    /// Key used in payloads and catalog files.
    pub fn key(&self) -> &'static str {
        match self {
            Extra::Driver => "driver",
            Extra::Gps => "gps",
            Extra::AirConditioning => "airConditioning",
            Extra::Bluetooth => "bluetooth",
            Extra::BabySeat => "babySeat",
            Extra::AdditionalDriver => "additionalDriver",
            Extra::Roadside => "roadside",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Extra::Driver => "Driver",
            Extra::Gps => "GPS navigation",
            Extra::AirConditioning => "Air conditioning",
            Extra::Bluetooth => "Bluetooth",
            Extra::BabySeat => "Baby seat",
            Extra::AdditionalDriver => "Additional driver",
            Extra::Roadside => "Roadside assistance",
        }
    }
}

impl fmt::Display for Extra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Extra {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], "").to_lowercase();
        Extra::ALL
            .iter()
            .copied()
            .find(|extra| extra.key().to_lowercase() == wanted)
            .ok_or_else(|| CatalogError::UnknownExtra(s.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BillingMode {
    /// Charged once for every rental day.
    PerDay,
    /// Charged once per booking.
    Flat,
}

impl fmt::Display for BillingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingMode::PerDay => write!(f, "per day"),
            BillingMode::Flat => write!(f, "flat"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPrice {
    pub unit_price: f64,
    pub billing: BillingMode,
}

impl ExtraPrice {
    pub fn per_day(unit_price: f64) -> Self {
        Self {
            unit_price,
            billing: BillingMode::PerDay,
        }
    }

    pub fn flat(unit_price: f64) -> Self {
        Self {
            unit_price,
            billing: BillingMode::Flat,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unknown extra: '{0}'")]
    UnknownExtra(String),

    #[error("Price for '{extra}' must be a non-negative number, got {price}")]
    InvalidPrice { extra: Extra, price: f64 },

    #[error("Failed to read extras catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse extras catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Unit price and billing mode of every extra on offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtrasCatalog {
    prices: BTreeMap<Extra, ExtraPrice>,
}

impl Default for ExtrasCatalog {
    fn default() -> Self {
        let prices = BTreeMap::from([
            (Extra::Driver, ExtraPrice::per_day(10.0)),
            (Extra::Gps, ExtraPrice::per_day(5.0)),
            (Extra::AirConditioning, ExtraPrice::per_day(8.0)),
            (Extra::Bluetooth, ExtraPrice::per_day(3.0)),
            (Extra::BabySeat, ExtraPrice::flat(10.0)),
            (Extra::AdditionalDriver, ExtraPrice::flat(20.0)),
            (Extra::Roadside, ExtraPrice::flat(15.0)),
        ]);
        Self { prices }
    }
}

impl ExtrasCatalog {
    pub fn new(prices: BTreeMap<Extra, ExtraPrice>) -> Result<Self, CatalogError> {
        for (extra, price) in &prices {
            if !price.unit_price.is_finite() || price.unit_price < 0.0 {
                return Err(CatalogError::InvalidPrice {
                    extra: *extra,
                    price: price.unit_price,
                });
            }
        }
        Ok(Self { prices })
    }

    /// Load a catalog from a JSON object keyed by extra name.
    /// Extras missing from the file keep their default price.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let overrides: BTreeMap<Extra, ExtraPrice> = serde_json::from_str(raw)?;
        let mut prices = Self::default().prices;
        prices.extend(overrides);
        Self::new(prices)
    }

    pub fn price_of(&self, extra: Extra) -> Option<&ExtraPrice> {
        self.prices.get(&extra)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Extra, &ExtraPrice)> {
        self.prices.iter()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// The extras ticked on a booking form.
///
/// Serialized as a flag for every known extra, the way the booking API expects
/// (`{"driver": true, "gps": false, ...}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<Extra, bool>", from = "BTreeMap<Extra, bool>")]
pub struct ExtrasSelection {
    selected: BTreeSet<Extra>,
}

impl ExtrasSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, extra: Extra) -> Self {
        self.selected.insert(extra);
        self
    }

    /// Flip one extra, returning whether it is now selected.
    pub fn toggle(&mut self, extra: Extra) -> bool {
        if self.selected.remove(&extra) {
            false
        } else {
            self.selected.insert(extra);
            true
        }
    }

    pub fn contains(&self, extra: Extra) -> bool {
        self.selected.contains(&extra)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Extra> + '_ {
        self.selected.iter().copied()
    }
}

impl FromIterator<Extra> for ExtrasSelection {
    fn from_iter<I: IntoIterator<Item = Extra>>(iter: I) -> Self {
        Self {
            selected: iter.into_iter().collect(),
        }
    }
}

impl From<ExtrasSelection> for BTreeMap<Extra, bool> {
    fn from(selection: ExtrasSelection) -> Self {
        Extra::ALL
            .iter()
            .map(|extra| (*extra, selection.contains(*extra)))
            .collect()
    }
}

impl From<BTreeMap<Extra, bool>> for ExtrasSelection {
    fn from(flags: BTreeMap<Extra, bool>) -> Self {
        flags
            .into_iter()
            .filter_map(|(extra, on)| on.then_some(extra))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extra_names() {
        assert_eq!("gps".parse::<Extra>().unwrap(), Extra::Gps);
        assert_eq!("baby-seat".parse::<Extra>().unwrap(), Extra::BabySeat);
        assert_eq!("air_conditioning".parse::<Extra>().unwrap(), Extra::AirConditioning);
        assert!(matches!(
            "jetpack".parse::<Extra>(),
            Err(CatalogError::UnknownExtra(_))
        ));
    }

    #[test]
    fn test_selection_serializes_all_flags() {
        let selection = ExtrasSelection::new().with(Extra::Gps);
        let json = serde_json::to_value(&selection).unwrap();

        assert_eq!(json["gps"], true);
        assert_eq!(json["babySeat"], false);
        assert_eq!(json.as_object().unwrap().len(), Extra::ALL.len());

        let back: ExtrasSelection = serde_json::from_value(json).unwrap();
        assert_eq!(back, selection);
    }

    #[test]
    fn test_toggle() {
        let mut selection = ExtrasSelection::new();
        assert!(selection.toggle(Extra::Driver));
        assert!(selection.contains(Extra::Driver));
        assert!(!selection.toggle(Extra::Driver));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_catalog_overrides_and_rejects_negative_prices() {
        let catalog =
            ExtrasCatalog::from_json_str(r#"{"gps": {"unitPrice": 7, "billing": "flat"}}"#)
                .unwrap();
        assert_eq!(catalog.price_of(Extra::Gps), Some(&ExtraPrice::flat(7.0)));
        assert_eq!(catalog.price_of(Extra::Driver), Some(&ExtraPrice::per_day(10.0)));

        let result =
            ExtrasCatalog::from_json_str(r#"{"roadside": {"unitPrice": -1, "billing": "flat"}}"#);
        assert!(matches!(
            result,
            Err(CatalogError::InvalidPrice { extra: Extra::Roadside, .. })
        ));
    }

    #[test]
    fn test_baby_seat_defaults_to_flat_and_can_bill_per_day() {
        let catalog = ExtrasCatalog::default();
        assert_eq!(catalog.price_of(Extra::BabySeat), Some(&ExtraPrice::flat(10.0)));

        let catalog = ExtrasCatalog::from_json_str(
            r#"{"babySeat": {"unitPrice": 50, "billing": "perDay"}}"#,
        )
        .unwrap();
        assert_eq!(catalog.price_of(Extra::BabySeat), Some(&ExtraPrice::per_day(50.0)));
    }
}
