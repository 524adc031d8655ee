use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::{
    models::extras::ExtrasCatalog,
    services::{
        booking_form::DEFAULT_SUCCESS_RESET_DELAY,
        duration::{DurationCalculator, DurationMode},
        extras_pricer::ExtrasPricer,
        price_engine::BookingPriceEngine,
    },
};

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the booking API. Without it bookings stay in memory.
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub duration_mode: DurationMode,
    pub success_reset_delay: Duration,
    pub extras_catalog_path: Option<PathBuf>,
    pub log_level: String,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: None,
            api_token: None,
            duration_mode: DurationMode::default(),
            success_reset_delay: DEFAULT_SUCCESS_RESET_DELAY,
            extras_catalog_path: None,
            log_level: "warn".to_string(),
            environment: "development".to_string(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let duration_mode = match non_empty_var("DURATION_MODE") {
            Some(raw) => raw.parse::<DurationMode>()?,
            None => DurationMode::default(),
        };

        let success_reset_delay = match non_empty_var("SUCCESS_RESET_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("SUCCESS_RESET_SECS must be a whole number, got '{}'", raw))?,
            ),
            None => DEFAULT_SUCCESS_RESET_DELAY,
        };

        let config = Config {
            api_url: non_empty_var("RENTAL_API_URL"),
            api_token: non_empty_var("RENTAL_API_TOKEN"),
            duration_mode,
            success_reset_delay,
            extras_catalog_path: non_empty_var("EXTRAS_CATALOG_PATH").map(PathBuf::from),
            log_level: non_empty_var("LOG_LEVEL").unwrap_or("warn".to_string()),
            environment: non_empty_var("APP_ENV").unwrap_or("development".to_string()),
        };

        tracing::info!("Config: successfully loaded for {} environment", config.environment);
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(url) = &self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "RENTAL_API_URL must start with 'http://' or 'https://'"
                ));
            }
        }

        if self.is_production() && self.api_url.is_none() {
            return Err(anyhow::anyhow!("RENTAL_API_URL is not set in production"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_dry_run(&self) -> bool {
        self.api_url.is_none()
    }

    pub fn load_catalog(&self) -> anyhow::Result<ExtrasCatalog> {
        match &self.extras_catalog_path {
            Some(path) => {
                let catalog = ExtrasCatalog::from_json_file(path).with_context(|| {
                    format!("Failed to load extras catalog from {}", path.display())
                })?;
                tracing::info!("Loaded extras catalog from {}", path.display());
                Ok(catalog)
            }
            None => Ok(ExtrasCatalog::default()),
        }
    }

    pub fn price_engine(&self) -> anyhow::Result<BookingPriceEngine> {
        Ok(BookingPriceEngine::new(
            DurationCalculator::new(self.duration_mode),
            ExtrasPricer::new(self.load_catalog()?),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::extras::{Extra, ExtraPrice};
    use serial_test::serial;
    use std::io::Write;

    const KEYS: [&str; 7] = [
        "RENTAL_API_URL",
        "RENTAL_API_TOKEN",
        "DURATION_MODE",
        "SUCCESS_RESET_SECS",
        "EXTRAS_CATALOG_PATH",
        "LOG_LEVEL",
        "APP_ENV",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();

        assert!(config.is_dry_run());
        assert_eq!(config.duration_mode, DurationMode::Lenient);
        assert_eq!(config.success_reset_delay, Duration::from_secs(3));
        assert_eq!(config.log_level, "warn");
        assert!(!config.is_production());
    }

    #[test]
    #[serial]
    fn test_reads_overrides() {
        clear_env();
        env::set_var("RENTAL_API_URL", "https://api.example.com/api");
        env::set_var("DURATION_MODE", "strict");
        env::set_var("SUCCESS_RESET_SECS", "5");
        env::set_var("LOG_LEVEL", "rental_booking=debug");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.api_url.as_deref(), Some("https://api.example.com/api"));
        assert_eq!(config.duration_mode, DurationMode::Strict);
        assert_eq!(config.success_reset_delay, Duration::from_secs(5));
        assert_eq!(config.log_level, "rental_booking=debug");
        assert!(!config.is_dry_run());
    }

    #[test]
    #[serial]
    fn test_rejects_bad_values() {
        clear_env();
        env::set_var("RENTAL_API_URL", "ftp://api.example.com");
        assert!(Config::from_env().is_err());

        clear_env();
        env::set_var("DURATION_MODE", "sometimes");
        assert!(Config::from_env().is_err());

        clear_env();
        env::set_var("APP_ENV", "production");
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"babySeat": {{"unitPrice": 12.5, "billing": "flat"}}}}"#).unwrap();

        let config = Config {
            extras_catalog_path: Some(file.path().to_path_buf()),
            ..Config::default()
        };
        let catalog = config.load_catalog().unwrap();
        assert_eq!(catalog.price_of(Extra::BabySeat), Some(&ExtraPrice::flat(12.5)));

        let missing = Config {
            extras_catalog_path: Some(PathBuf::from("/definitely/not/here.json")),
            ..Config::default()
        };
        assert!(missing.load_catalog().is_err());
    }
}
