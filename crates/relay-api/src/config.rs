//! Startup configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use relay_ledger::LedgerPaths;

use crate::error::AppError;

/// Everything the server needs to boot.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bind address.
    pub addr: SocketAddr,
    /// Live ledger and archive locations.
    pub ledger: LedgerPaths,
    /// Root directory for delivered reports.
    pub results_dir: PathBuf,
    /// Initial per-turn deadline.
    pub turn_deadline: TimeDelta,
    /// How often the watchdog polls.
    pub watchdog_interval: Duration,
    /// Upper bound on each notification or report delivery.
    pub delivery_timeout: Duration,
    /// Initial results destination.
    pub results_destination: Option<String>,
    /// Token required on admin routes. `None` refuses every admin request.
    pub admin_token: Option<String>,
    /// Fixed RNG seed for reproducible games.
    pub rng_seed: Option<u64>,
    /// OTLP collector endpoint.
    pub otlp_endpoint: Option<String>,
}

impl RelayConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = text("HOST", "0.0.0.0");
        let port: u16 = parse(&lookup, "PORT", 3000)?;
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;

        let deadline_secs: i64 = parse(&lookup, "RELAY_TURN_DEADLINE_SECS", 43_200)?;
        let turn_deadline = TimeDelta::try_seconds(deadline_secs)
            .filter(|d| *d > TimeDelta::zero())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "RELAY_TURN_DEADLINE_SECS must be positive, got {deadline_secs}"
                ))
            })?;

        let watchdog_secs: u64 = parse(&lookup, "RELAY_WATCHDOG_INTERVAL_SECS", 5)?;
        if watchdog_secs == 0 {
            return Err(AppError::Config(
                "RELAY_WATCHDOG_INTERVAL_SECS must be at least 1".into(),
            ));
        }
        let delivery_ms: u64 = parse(&lookup, "RELAY_DELIVERY_TIMEOUT_MS", 5000)?;

        let rng_seed = match optional("RELAY_RNG_SEED") {
            Some(raw) => Some(raw.parse().map_err(|e| {
                AppError::Config(format!("RELAY_RNG_SEED must be a valid u64: {e}"))
            })?),
            None => None,
        };

        Ok(Self {
            addr,
            ledger: LedgerPaths {
                database: text("RELAY_DATABASE_PATH", "game_data.db").into(),
                audit_log: text("RELAY_AUDIT_LOG_PATH", "game_log.json").into(),
                archive_dir: text("RELAY_ARCHIVE_DIR", "archives").into(),
            },
            results_dir: text("RELAY_RESULTS_DIR", "results").into(),
            turn_deadline,
            watchdog_interval: Duration::from_secs(watchdog_secs),
            delivery_timeout: Duration::from_millis(delivery_ms),
            results_destination: optional("RELAY_RESULTS_DESTINATION"),
            admin_token: optional("RELAY_ADMIN_TOKEN"),
            rng_seed,
            otlp_endpoint: optional("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be a valid number: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<RelayConfig, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RelayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.ledger.database, PathBuf::from("game_data.db"));
        assert_eq!(config.ledger.audit_log, PathBuf::from("game_log.json"));
        assert_eq!(config.ledger.archive_dir, PathBuf::from("archives"));
        assert_eq!(config.results_dir, PathBuf::from("results"));
        assert_eq!(config.turn_deadline, TimeDelta::hours(12));
        assert_eq!(config.watchdog_interval, Duration::from_secs(5));
        assert_eq!(config.delivery_timeout, Duration::from_millis(5000));
        assert!(config.results_destination.is_none());
        assert!(config.admin_token.is_none());
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("RELAY_TURN_DEADLINE_SECS", "600"),
            ("RELAY_RESULTS_DESTINATION", "hall-of-fame"),
            ("RELAY_ADMIN_TOKEN", "s3cret"),
            ("RELAY_RNG_SEED", "42"),
        ])
        .unwrap();

        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.turn_deadline, TimeDelta::minutes(10));
        assert_eq!(config.results_destination.as_deref(), Some("hall-of-fame"));
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.rng_seed, Some(42));
    }

    #[test]
    fn test_blank_optional_values_count_as_unset() {
        let config = config_from(&[("RELAY_ADMIN_TOKEN", "  ")]).unwrap();

        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_invalid_port_is_a_config_error() {
        let err = config_from(&[("PORT", "not-a-port")]).unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_non_positive_deadline_is_a_config_error() {
        let err = config_from(&[("RELAY_TURN_DEADLINE_SECS", "0")]).unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_zero_watchdog_interval_is_a_config_error() {
        let err = config_from(&[("RELAY_WATCHDOG_INTERVAL_SECS", "0")]).unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
    }
}
