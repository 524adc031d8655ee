use chrono::{DateTime, Local, Utc};
use console::style;
use tabled::{settings::{Alignment, Style}, Table, Tabled};

use crate::models::{
    booking::{Booking, FieldErrors},
    extras::{BillingMode, ExtrasCatalog, ExtrasSelection},
    pricing::PriceBreakdown,
};

#[derive(Tabled)]
struct ExtraTableRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Extra")]
    label: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Billing")]
    billing: String,
}

pub fn format_extras_table(catalog: &ExtrasCatalog) -> String {
    if catalog.is_empty() {
        return String::new();
    }

    let rows: Vec<ExtraTableRow> = catalog
        .iter()
        .map(|(extra, price)| ExtraTableRow {
            key: extra.key().to_string(),
            label: extra.label().to_string(),
            price: format_money(price.unit_price),
            billing: match price.billing {
                BillingMode::PerDay => "per day".to_string(),
                BillingMode::Flat => "once".to_string(),
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded()).with(Alignment::left());

    table.to_string()
}

pub fn format_breakdown(breakdown: &PriceBreakdown, extras: &ExtrasSelection) -> String {
    let mut output = String::new();

    let days = if breakdown.duration_days == 1 { "day" } else { "days" };
    output.push_str(&format!(
        "{}: {} {}\n",
        style("Duration").bold(),
        style(breakdown.duration_days).cyan(),
        days
    ));
    output.push_str(&format!(
        "{}: {} x {} = {}\n",
        style("Vehicle").bold(),
        format_money(breakdown.daily_rate),
        breakdown.duration_days,
        format_money(breakdown.base_cost)
    ));

    if extras.is_empty() {
        output.push_str(&format!("{}: {}\n", style("Extras").bold(), style("none").dim()));
    } else {
        let names: Vec<&str> = extras.iter().map(|extra| extra.label()).collect();
        output.push_str(&format!(
            "{}: {} ({} per day, {} once) = {}\n",
            style("Extras").bold(),
            style(names.join(", ")).dim(),
            format_money(breakdown.per_day_extras),
            format_money(breakdown.flat_extras),
            format_money(breakdown.extras_cost)
        ));
    }

    output.push_str(&format!(
        "{}: {}\n",
        style("Total").bold(),
        style(format_money(breakdown.total)).green().bold()
    ));

    output
}

pub fn format_booking_detail(booking: &Booking) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}: {}\n", style("Booking").bold(), style(&booking.id).cyan()));
    output.push_str(&format!("{}: {}\n", style("Vehicle").bold(), booking.vehicle_id));

    if let (Some(start), Some(end)) = (booking.start_date, booking.end_date) {
        output.push_str(&format!(
            "{}: {} -> {}\n",
            style("Dates").bold(),
            format_date(&start),
            format_date(&end)
        ));
    }

    output.push_str(&format!(
        "{}: {}\n",
        style("Total").bold(),
        style(format_money(booking.total_amount)).green()
    ));
    output.push_str(&format!(
        "{}: {} / payment {}\n",
        style("Status").bold(),
        style(booking.status).yellow(),
        booking.payment_status
    ));

    output
}

pub fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .flat_map(|(field, messages)| {
            messages
                .iter()
                .map(move |message| format!("  {} {}", style(field).red(), message))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_money(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::extras::Extra;

    #[test]
    fn test_money() {
        assert_eq!(format_money(200.0), "$200.00");
        assert_eq!(format_money(12.5), "$12.50");
    }

    #[test]
    fn test_extras_table_lists_every_extra() {
        let table = format_extras_table(&ExtrasCatalog::default());
        for extra in Extra::ALL {
            assert!(table.contains(extra.key()));
        }
        assert!(table.contains("per day"));
        assert!(table.contains("once"));
    }

    #[test]
    fn test_field_errors_one_line_each() {
        let mut errors = FieldErrors::new();
        errors.insert("end_date".to_string(), vec!["End date is required".to_string()]);
        errors.insert(
            "pickup_location".to_string(),
            vec!["Pickup location is required".to_string()],
        );
        let formatted = format_field_errors(&errors);
        assert_eq!(formatted.lines().count(), 2);
        assert!(formatted.contains("End date is required"));
    }
}
