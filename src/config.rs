use crate::domain::{Decimal, Instrument};
use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Layout of `CUTOFF`, interpreted as wall-clock time in `TIMEZONE`.
pub const CUTOFF_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub summary_path: Option<PathBuf>,
    pub instrument: Instrument,
    pub timezone: Tz,
    pub cutoff: DateTime<Tz>,
    pub max_units: Decimal,
    pub pips_multiplier: Decimal,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let input_path = env_map
            .get("INPUT_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnv("INPUT_PATH".to_string()))?;

        let output_path = PathBuf::from(
            env_map
                .get("OUTPUT_PATH")
                .map(|s| s.as_str())
                .unwrap_or("output/result.csv"),
        );

        let summary_path = env_map
            .get("SUMMARY_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let instrument = Instrument::new(
            env_map
                .get("INSTRUMENT")
                .map(|s| s.as_str())
                .unwrap_or("EUR/GBP"),
        );

        let timezone = env_map
            .get("TIMEZONE")
            .map(|s| s.as_str())
            .unwrap_or("Asia/Tokyo")
            .parse::<Tz>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "TIMEZONE".to_string(),
                    "must be an IANA timezone name".to_string(),
                )
            })?;

        let cutoff = parse_cutoff(
            env_map
                .get("CUTOFF")
                .map(|s| s.as_str())
                .unwrap_or("2019-01-20 00:00:00"),
            timezone,
        )?;

        let max_units = parse_positive_decimal(&env_map, "MAX_UNITS", "20000")?;
        let pips_multiplier = parse_positive_decimal(&env_map, "PIPS_MULTIPLIER", "10000")?;

        Ok(Config {
            input_path,
            output_path,
            summary_path,
            instrument,
            timezone,
            cutoff,
            max_units,
            pips_multiplier,
        })
    }
}

fn parse_cutoff(raw: &str, timezone: Tz) -> Result<DateTime<Tz>, ConfigError> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), CUTOFF_FORMAT).map_err(|_| {
        ConfigError::InvalidValue(
            "CUTOFF".to_string(),
            "must be formatted as YYYY-MM-DD HH:MM:SS".to_string(),
        )
    })?;

    // Ambiguous wall-clock times (DST fold) resolve to the earlier instant.
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| {
            ConfigError::InvalidValue(
                "CUTOFF".to_string(),
                format!("{} does not exist in {}", raw, timezone.name()),
            )
        })
}

fn parse_positive_decimal(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<Decimal, ConfigError> {
    let value = env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<Decimal>()
        .map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a decimal number".to_string())
        })?;

    if !value.is_positive() {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("INPUT_PATH".to_string(), "input/20190127.csv".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();

        assert_eq!(config.input_path, PathBuf::from("input/20190127.csv"));
        assert_eq!(config.output_path, PathBuf::from("output/result.csv"));
        assert!(config.summary_path.is_none());
        assert_eq!(config.instrument.as_str(), "EUR/GBP");
        assert_eq!(config.timezone, chrono_tz::Asia::Tokyo);
        assert_eq!(config.max_units.to_canonical_string(), "20000");
        assert_eq!(config.pips_multiplier.to_canonical_string(), "10000");
        assert_eq!(
            config.cutoff.format("%Y-%m-%d %H:%M:%S %z %Z").to_string(),
            "2019-01-20 00:00:00 +0900 JST"
        );
        assert_eq!(config.cutoff.offset().fix().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_missing_input_path() {
        let mut env_map = setup_required_env();
        env_map.remove("INPUT_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "INPUT_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_timezone() {
        let mut env_map = setup_required_env();
        env_map.insert("TIMEZONE".to_string(), "Mars/Olympus".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "TIMEZONE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_cutoff() {
        let mut env_map = setup_required_env();
        env_map.insert("CUTOFF".to_string(), "2019/01/20".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "CUTOFF"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_max_units_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("MAX_UNITS".to_string(), "0".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "MAX_UNITS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_non_numeric_multiplier_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("PIPS_MULTIPLIER".to_string(), "lots".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PIPS_MULTIPLIER"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_overrides() {
        let mut env_map = setup_required_env();
        env_map.insert("OUTPUT_PATH".to_string(), "/tmp/out.csv".to_string());
        env_map.insert("SUMMARY_PATH".to_string(), "/tmp/summary.json".to_string());
        env_map.insert("INSTRUMENT".to_string(), "USD/JPY".to_string());
        env_map.insert("TIMEZONE".to_string(), "UTC".to_string());
        env_map.insert("CUTOFF".to_string(), "2020-06-01 12:30:00".to_string());
        env_map.insert("PIPS_MULTIPLIER".to_string(), "100".to_string());

        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.csv"));
        assert_eq!(config.summary_path, Some(PathBuf::from("/tmp/summary.json")));
        assert_eq!(config.instrument.as_str(), "USD/JPY");
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert_eq!(
            config.cutoff.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2020-06-01 12:30:00"
        );
        assert_eq!(config.pips_multiplier.to_canonical_string(), "100");
    }

    #[test]
    fn test_blank_summary_path_is_unset() {
        let mut env_map = setup_required_env();
        env_map.insert("SUMMARY_PATH".to_string(), "  ".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert!(config.summary_path.is_none());
    }
}
