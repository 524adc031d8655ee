use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::fmt;

use crate::services::duration::DurationMode;

#[derive(Parser)]
#[command(name = "rental-cli")]
#[command(about = "Quote and book rental cars from the command line")]
#[command(version = "0.1.0")]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Extras catalog file (JSON), overrides EXTRAS_CATALOG_PATH
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// How to treat a drop-off date before the pickup date, overrides DURATION_MODE
    #[arg(long, global = true)]
    pub duration_mode: Option<DurationModeArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the price of a rental without booking it
    Quote {
        /// Vehicle price per day
        #[arg(short, long)]
        rate: f64,
        #[command(flatten)]
        dates: DateArgs,
        /// Extra to include (repeatable), e.g. gps, baby-seat
        #[arg(short, long = "extra")]
        extras: Vec<String>,
    },
    /// List the extras on offer and their prices
    Extras,
    /// Fill in a booking form and submit it
    Book(BookArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DateArgs {
    /// Pickup date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub start: Option<String>,
    /// Drop-off date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BookArgs {
    /// Vehicle id
    #[arg(long)]
    pub vehicle: String,
    /// Vehicle price per day
    #[arg(short, long)]
    pub rate: f64,
    /// Signed-in customer id
    #[arg(short, long)]
    pub user: Option<String>,
    #[command(flatten)]
    pub dates: DateArgs,
    /// Pickup address
    #[arg(long)]
    pub pickup: Option<String>,
    /// Pickup coordinates as LAT,LNG
    #[arg(long)]
    pub pickup_at: Option<String>,
    /// Drop-off address
    #[arg(long)]
    pub dropoff: Option<String>,
    /// Drop-off coordinates as LAT,LNG
    #[arg(long)]
    pub dropoff_at: Option<String>,
    /// Extra to include (repeatable)
    #[arg(short, long = "extra")]
    pub extras: Vec<String>,
    /// Keep the booking in memory instead of calling the API
    #[arg(long)]
    pub dry_run: bool,
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DurationModeArg {
    Lenient,
    Strict,
}

impl From<DurationModeArg> for DurationMode {
    fn from(arg: DurationModeArg) -> Self {
        match arg {
            DurationModeArg::Lenient => DurationMode::Lenient,
            DurationModeArg::Strict => DurationMode::Strict,
        }
    }
}

impl fmt::Display for DurationModeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationModeArg::Lenient => write!(f, "lenient"),
            DurationModeArg::Strict => write!(f, "strict"),
        }
    }
}
