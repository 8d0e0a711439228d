//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (retention > 0, tick interval bounds)
//! - Check that URLs use a scheme their transport understands
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::MonitorConfig;
use crate::timer::MAX_COUNTDOWN_SECS;

/// Smallest accepted local tick interval.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;
/// Largest accepted local tick interval.
pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("logging.log_dir must not be empty")]
    EmptyLogDir,

    #[error("logging.retention_days must be greater than zero")]
    ZeroRetention,

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("health.degraded_errors ({degraded}) must be lower than health.unhealthy_errors ({unhealthy})")]
    ThresholdOrder { degraded: u64, unhealthy: u64 },

    #[error("timer.history_capacity must be greater than zero")]
    ZeroHistoryCapacity,

    #[error("timer.tick_interval_ms ({0}) must be between 10 and 60000")]
    TickIntervalOutOfRange(u64),

    #[error("timer.full_duration_secs ({0}) must be between 1 and 315360000")]
    FullDurationOutOfRange(u64),

    #[error("timer.{field} '{url}' must use one of: {expected}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        expected: &'static str,
    },
}

/// Validate a parsed configuration, collecting every violation.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let logging = &config.logging;
    if logging.log_dir.trim().is_empty() {
        errors.push(ValidationError::EmptyLogDir);
    }
    if logging.retention_days == 0 {
        errors.push(ValidationError::ZeroRetention);
    }
    if logging.cleanup_interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval("logging.cleanup_interval_secs"));
    }
    if logging.uptime_refresh_secs == 0 {
        errors.push(ValidationError::ZeroInterval("logging.uptime_refresh_secs"));
    }

    let health = &config.health;
    if health.degraded_errors >= health.unhealthy_errors {
        errors.push(ValidationError::ThresholdOrder {
            degraded: health.degraded_errors,
            unhealthy: health.unhealthy_errors,
        });
    }

    let timer = &config.timer;
    if timer.history_capacity == 0 {
        errors.push(ValidationError::ZeroHistoryCapacity);
    }
    if !(MIN_TICK_INTERVAL_MS..=MAX_TICK_INTERVAL_MS).contains(&timer.tick_interval_ms) {
        errors.push(ValidationError::TickIntervalOutOfRange(timer.tick_interval_ms));
    }
    if timer.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroInterval("timer.poll_interval_ms"));
    }
    if !(1..=MAX_COUNTDOWN_SECS).contains(&timer.full_duration_secs) {
        errors.push(ValidationError::FullDurationOutOfRange(timer.full_duration_secs));
    }
    check_url(&mut errors, "ws_url", &timer.ws_url, &["ws", "wss"], "ws, wss");
    check_url(
        &mut errors,
        "poll_url",
        &timer.poll_url,
        &["http", "https"],
        "http, https",
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    raw: &str,
    schemes: &[&str],
    expected: &'static str,
) {
    if raw.is_empty() {
        return;
    }
    let valid = url::Url::parse(raw)
        .map(|u| schemes.contains(&u.scheme()))
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            url: raw.to_string(),
            expected,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&MonitorConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_violation() {
        let mut config = MonitorConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.logging.log_dir = "  ".into();
        config.logging.retention_days = 0;
        config.health.degraded_errors = 100;
        config.timer.history_capacity = 0;
        config.timer.tick_interval_ms = 1;
        config.timer.ws_url = "http://example.com/timer".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 7);
        assert!(errors.contains(&ValidationError::EmptyLogDir));
        assert!(errors.contains(&ValidationError::ThresholdOrder {
            degraded: 100,
            unhealthy: 100
        }));
        assert!(errors.contains(&ValidationError::TickIntervalOutOfRange(1)));
    }

    #[test]
    fn test_rejects_unusable_timer_durations() {
        let mut config = MonitorConfig::default();
        config.timer.poll_interval_ms = 0;
        config.timer.full_duration_secs = u64::MAX;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroInterval("timer.poll_interval_ms"),
                ValidationError::FullDurationOutOfRange(u64::MAX),
            ]
        );

        config.timer.poll_interval_ms = 1;
        config.timer.full_duration_secs = MAX_COUNTDOWN_SECS;
        assert_eq!(validate_config(&config), Ok(()));

        config.timer.full_duration_secs = 0;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::FullDurationOutOfRange(0)])
        );
    }

    #[test]
    fn test_accepts_transport_urls() {
        let mut config = MonitorConfig::default();
        config.timer.ws_url = "wss://vault.example.com/timer".into();
        config.timer.poll_url = "https://vault.example.com/api/timer".into();
        assert!(validate_config(&config).is_ok());

        config.timer.poll_url = "ws://vault.example.com/api/timer".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidUrl { field: "poll_url", .. }
        ));
    }
}
