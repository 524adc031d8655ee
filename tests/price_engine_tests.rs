use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};

use rental_booking::models::extras::{Extra, ExtraPrice, ExtrasCatalog, ExtrasSelection};
use rental_booking::services::duration::duration_days;
use rental_booking::services::extras_pricer::ExtrasPricer;
use rental_booking::services::price_engine::BookingPriceEngine;

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn test_catalog() -> ExtrasCatalog {
    ExtrasCatalog::new(BTreeMap::from([
        (Extra::Gps, ExtraPrice::per_day(5.0)),
        (Extra::BabySeat, ExtraPrice::flat(10.0)),
    ]))
    .unwrap()
}

#[test]
fn test_same_day_rental_is_one_day() {
    for d in [date(2024, 1, 1), date(2024, 2, 29), Utc::now()] {
        assert_eq!(duration_days(Some(d), Some(d)), 1);
    }
}

#[test]
fn test_duration_ignores_direction() {
    let pairs = [
        (date(2024, 3, 1), date(2024, 3, 5)),
        (date(2024, 2, 27), date(2024, 3, 2)),
        (date(2024, 3, 1), date(2024, 3, 1) + Duration::hours(30)),
    ];
    for (a, b) in pairs {
        assert_eq!(duration_days(Some(a), Some(b)), duration_days(Some(b), Some(a)));
    }
}

#[test]
fn test_leap_february() {
    assert_eq!(duration_days(Some(date(2024, 2, 28)), Some(date(2024, 3, 1))), 2);
    assert_eq!(duration_days(Some(date(2023, 2, 28)), Some(date(2023, 3, 1))), 1);
}

#[test]
fn test_no_extras_cost_nothing() {
    let pricer = ExtrasPricer::default();
    for days in 0..10 {
        assert_eq!(pricer.price(&ExtrasSelection::new(), days), 0.0);
    }
}

#[test]
fn test_reference_quote() {
    let engine = BookingPriceEngine::default();
    let breakdown = engine.compute_total(
        50.0,
        &ExtrasSelection::new(),
        Some(date(2024, 3, 1)),
        Some(date(2024, 3, 5)),
    );

    assert_eq!(breakdown.duration_days, 4);
    assert_eq!(breakdown.total, 200.0);
}

#[test]
fn test_per_day_and_flat_extras_change_total_by_exact_amounts() {
    let engine = BookingPriceEngine::with_catalog(test_catalog());
    let start = Some(date(2024, 3, 1));
    let end = Some(date(2024, 3, 5));

    let base = engine.compute_total(50.0, &ExtrasSelection::new(), start, end);
    let with_gps = engine.compute_total(50.0, &ExtrasSelection::new().with(Extra::Gps), start, end);
    let with_seat =
        engine.compute_total(50.0, &ExtrasSelection::new().with(Extra::BabySeat), start, end);

    assert_eq!(with_gps.total - base.total, 20.0);
    assert_eq!(with_seat.total - base.total, 10.0);

    // flat extras do not scale with the rental length
    let long_end = Some(date(2024, 3, 15));
    let long_base = engine.compute_total(50.0, &ExtrasSelection::new(), start, long_end);
    let long_seat =
        engine.compute_total(50.0, &ExtrasSelection::new().with(Extra::BabySeat), start, long_end);
    assert_eq!(long_seat.total - long_base.total, 10.0);
}

#[test]
fn test_total_never_below_one_day_of_rent() {
    let engine = BookingPriceEngine::default();
    for rate in [0.0, 1.0, 35.5, 120.0] {
        let breakdown = engine.compute_total(rate, &ExtrasSelection::new(), None, None);
        assert!(breakdown.total >= rate);
    }
}
