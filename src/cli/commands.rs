use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use console::{style, Emoji};
use dialoguer::{theme::ColorfulTheme, Confirm};
use tracing::{error, info, warn};

use crate::{
    api::{BookingSubmitter, HttpBookingSubmitter, InMemoryBookingSubmitter},
    cli::args::*,
    models::{
        booking::{BookingContext, LocationInfo},
        extras::{Extra, ExtrasSelection},
    },
    services::{BookingForm, BookingPriceEngine, SubmitOutcome},
    utils::{
        formatting::{
            format_booking_detail, format_breakdown, format_extras_table, format_field_errors,
        },
        Config,
    },
};

static CHECKMARK: Emoji<'_, '_> = Emoji("✅ ", "");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "");
static WARNING: Emoji<'_, '_> = Emoji("⚠️ ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️ ", "");
static CAR: Emoji<'_, '_> = Emoji("🚗 ", "");

pub struct CliApp {
    config: Config,
    engine: BookingPriceEngine,
}

impl CliApp {
    pub fn new(mut config: Config, args: &Args) -> Result<Self> {
        if let Some(path) = &args.catalog {
            config.extras_catalog_path = Some(path.into());
        }
        if let Some(mode) = args.duration_mode {
            config.duration_mode = mode.into();
        }

        let engine = config.price_engine()?;
        Ok(Self { config, engine })
    }

    pub async fn run(&self, args: Args) -> Result<()> {
        match args.command {
            Commands::Quote { rate, dates, extras } => self.handle_quote(rate, dates, extras),
            Commands::Extras => self.handle_extras(),
            Commands::Book(book) => self.handle_book(book).await,
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    fn handle_quote(&self, rate: f64, dates: DateArgs, extras: Vec<String>) -> Result<()> {
        let (start, end) = parse_dates(&dates)?;
        let selection = parse_extras(&extras)?;

        if let Err(e) = self.engine.calculator().check_order(start, end) {
            println!("{} {}", WARNING, style(e).yellow());
        }

        let breakdown = self.engine.compute_total(rate, &selection, start, end);
        println!("{} {}", CAR, style("Rental quote").bold().cyan());
        print!("{}", format_breakdown(&breakdown, &selection));
        Ok(())
    }

    fn handle_extras(&self) -> Result<()> {
        let catalog = self.engine.pricer().catalog();
        if catalog.is_empty() {
            println!("{} No extras on offer", INFO);
        } else {
            println!("{} {}", INFO, style(format!("{} extras on offer", catalog.len())).bold());
            println!("{}", format_extras_table(catalog));
        }
        Ok(())
    }

    async fn handle_book(&self, book: BookArgs) -> Result<()> {
        let submitter = self.submitter(book.dry_run);
        let mut context = BookingContext::new(book.vehicle.clone(), book.rate);
        context.user_id = book.user.clone();

        let mut form = BookingForm::new(context, self.engine.clone(), submitter)
            .with_success_reset_delay(self.config.success_reset_delay);

        let (start, end) = parse_dates(&book.dates)?;
        form.set_dates(start, end);
        form.set_pickup_location(parse_location(book.pickup, book.pickup_at)?);
        form.set_dropoff_location(parse_location(book.dropoff, book.dropoff_at)?);
        form.set_extras(parse_extras(&book.extras)?);

        println!("{} {}", CAR, style("New booking").bold().cyan());
        print!("{}", format_breakdown(&form.quote(), &form.fields().extras));

        if !book.yes {
            let theme = ColorfulTheme::default();
            let confirm = Confirm::with_theme(&theme)
                .with_prompt("Submit this booking?")
                .default(true)
                .interact()?;

            if !confirm {
                println!("Booking cancelled");
                return Ok(());
            }
        }

        match form.submit().await {
            SubmitOutcome::Submitted(booking) => {
                println!("{} Booking created successfully!", CHECKMARK);
                print!("{}", format_booking_detail(&booking));
                info!("Booking created: {}", booking.id);
            }
            SubmitOutcome::Invalid(errors) => {
                println!("{} Please fill in all required fields", CROSS);
                println!("{}", format_field_errors(&errors));
                warn!("Booking form rejected with {} invalid fields", errors.len());
            }
            SubmitOutcome::Failed(message) => {
                println!("{} {}", CROSS, style(&message).red());
                error!("Booking failed: {}", message);
            }
            SubmitOutcome::Ignored => {
                println!("{} A booking is already being submitted", WARNING);
            }
        }

        Ok(())
    }

    fn handle_config_command(&self, command: ConfigCommands) -> Result<()> {
        match command {
            ConfigCommands::Show => {
                println!("{} {}", INFO, style("Configuration").bold().cyan());
                println!(
                    "API URL: {}",
                    self.config
                        .api_url
                        .as_deref()
                        .map(|url| style(url.to_string()).green())
                        .unwrap_or_else(|| style("not set (dry run)".to_string()).yellow())
                );
                println!(
                    "API token: {}",
                    if self.config.api_token.is_some() { "set" } else { "not set" }
                );
                println!("Duration mode: {}", style(self.config.duration_mode).cyan());
                println!(
                    "Success banner: {}s",
                    self.config.success_reset_delay.as_secs()
                );
                println!(
                    "Extras catalog: {}",
                    self.config
                        .extras_catalog_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "built-in".to_string())
                );
                println!("Log level: {}", self.config.log_level);
                println!("Environment: {}", self.config.environment);
            }
        }
        Ok(())
    }

    fn submitter(&self, dry_run: bool) -> Arc<dyn BookingSubmitter> {
        match (&self.config.api_url, dry_run) {
            (Some(url), false) => Arc::new(HttpBookingSubmitter::new(
                url.clone(),
                self.config.api_token.clone(),
            )),
            _ => {
                println!("{} Dry run: the booking will not leave this machine", INFO);
                Arc::new(InMemoryBookingSubmitter::new())
            }
        }
    }
}

/// `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| anyhow!("Invalid date: {}", raw));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", raw))
}

fn parse_dates(dates: &DateArgs) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let start = dates.start.as_deref().map(parse_date).transpose()?;
    let end = dates.end.as_deref().map(parse_date).transpose()?;
    Ok((start, end))
}

pub fn parse_extras(raw: &[String]) -> Result<ExtrasSelection> {
    raw.iter()
        .flat_map(|item| item.split(','))
        .filter(|item| !item.trim().is_empty())
        .map(|item| item.parse::<Extra>().map_err(anyhow::Error::from))
        .collect()
}

/// `LAT,LNG`
pub fn parse_coordinates(raw: &str) -> Result<(f64, f64)> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("Coordinates must look like LAT,LNG"))?;
    let lat = lat.trim().parse::<f64>().context("Invalid latitude")?;
    let lng = lng.trim().parse::<f64>().context("Invalid longitude")?;
    Ok((lat, lng))
}

fn parse_location(address: Option<String>, at: Option<String>) -> Result<LocationInfo> {
    let mut location = LocationInfo::address(address.unwrap_or_default());
    if let Some(raw) = at {
        let (lat, lng) = parse_coordinates(&raw)?;
        location = location.with_coordinates(lat, lng);
    }
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let day = parse_date("2024-03-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let instant = parse_date("2024-03-01T10:30:00+02:00").unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-03-01T08:30:00+00:00");

        assert!(parse_date("03/01/2024").is_err());
    }

    #[test]
    fn test_parse_extras_accepts_lists_and_repeats() {
        let selection =
            parse_extras(&["gps,baby-seat".to_string(), "roadside".to_string()]).unwrap();
        assert!(selection.contains(Extra::Gps));
        assert!(selection.contains(Extra::BabySeat));
        assert!(selection.contains(Extra::Roadside));
        assert!(!selection.contains(Extra::Driver));

        assert!(parse_extras(&["sunroof".to_string()]).is_err());
        assert!(parse_extras(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(parse_coordinates("48.85, 2.35").unwrap(), (48.85, 2.35));
        assert!(parse_coordinates("48.85").is_err());
        assert!(parse_coordinates("north,2.35").is_err());
    }
}
