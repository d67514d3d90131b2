//! Engine settings and recurring schedule seeds loaded from config.toml
//!
//! The `[engine]` table tunes the processing pass and dashboard, and each
//! `[[schedules]]` entry is created in the database on startup if no schedule
//! with the same name exists yet.

use crate::core::{Frequency, ScheduleKind};
use crate::errors::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Processing and dashboard settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// Schedules to seed
    #[serde(default)]
    pub schedules: Vec<ScheduleConfig>,
}

/// Settings for the processing pass and dashboard summary
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Days ahead that count as "due soon"
    pub due_soon_window_days: i64,
    /// Most occurrences a single schedule may generate in one processing run
    pub max_catch_up_steps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            due_soon_window_days: 7,
            max_catch_up_steps: 12,
        }
    }
}

/// Configuration for a single seeded schedule
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    /// Name of the schedule, used to detect existing seeds
    pub name: String,
    /// What the schedule generates
    pub kind: ScheduleKind,
    /// Unit of repetition
    pub frequency: Frequency,
    /// Units between occurrences
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// First occurrence (`"YYYY-MM-DD"`)
    pub start_date: NaiveDate,
    /// Optional inclusive last date
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Value of one occurrence, written as a string (e.g. `"1200.00"`)
    pub amount: Decimal,
    /// ISO currency code
    #[serde(default = "default_currency")]
    pub currency: String,
}

const fn default_interval() -> u32 {
    1
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing or have unknown enum values
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading configuration from {}", path_ref.display());
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.engine.due_soon_window_days < 0 {
        return Err(Error::Config {
            message: "engine.due_soon_window_days must not be negative".to_string(),
        });
    }
    if config.engine.max_catch_up_steps == 0 {
        return Err(Error::Config {
            message: "engine.max_catch_up_steps must be at least 1".to_string(),
        });
    }

    Ok(config)
}

/// Loads configuration from `RECURRING_CONFIG`, or ./config.toml when unset.
///
/// A missing default file yields the built-in defaults with no seeds.
pub fn load_default_config() -> Result<Config> {
    if let Ok(path) = std::env::var("RECURRING_CONFIG") {
        return load_config(path);
    }

    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        load_config(DEFAULT_CONFIG_PATH)
    } else {
        tracing::info!("No {DEFAULT_CONFIG_PATH} found, using default settings");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_schedule_config() {
        let toml_str = r#"
            [engine]
            due_soon_window_days = 14

            [[schedules]]
            name = "Office rent"
            kind = "bill"
            frequency = "MONTHLY"
            start_date = "2024-01-01"
            amount = "2500.00"

            [[schedules]]
            name = "Retainer"
            kind = "invoice"
            frequency = "QUARTERLY"
            interval = 2
            start_date = "2024-02-15"
            end_date = "2025-12-31"
            amount = "900"
            currency = "CAD"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.engine.due_soon_window_days, 14);
        assert_eq!(config.engine.max_catch_up_steps, 12);
        assert_eq!(config.schedules.len(), 2);

        let rent = &config.schedules[0];
        assert_eq!(rent.kind, ScheduleKind::Bill);
        assert_eq!(rent.frequency, Frequency::Monthly);
        assert_eq!(rent.interval, 1);
        assert_eq!(rent.amount, dec!(2500));
        assert_eq!(rent.currency, "USD");
        assert!(rent.end_date.is_none());

        let retainer = &config.schedules[1];
        assert_eq!(retainer.interval, 2);
        assert_eq!(retainer.end_date, NaiveDate::from_ymd_opt(2025, 12, 31));
        assert_eq!(retainer.currency, "CAD");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.schedules.is_empty());
    }

    #[test]
    fn test_rejects_unknown_frequency() {
        let toml_str = r#"
            [[schedules]]
            name = "Odd"
            kind = "transaction"
            frequency = "FORTNIGHTLY"
            start_date = "2024-01-01"
            amount = "1"
        "#;
        assert!(matches!(
            parse_config(toml_str).unwrap_err(),
            Error::Config { .. }
        ));
    }

    #[test]
    fn test_rejects_zero_catch_up_steps() {
        let toml_str = "[engine]\nmax_catch_up_steps = 0\n";
        assert!(parse_config(toml_str).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/definitely/not/here/config.toml");
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
    }
}
