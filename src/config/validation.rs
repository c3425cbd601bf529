//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and endpoint URL schemes
//! - Validate value ranges (timers > 0 and at most a week, multiplier >= 1.0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AgentConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;
use thiserror::Error;
use url::Url;

use crate::config::schema::AgentConfig;

/// Longest accepted timer period (one week).
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: unsupported scheme '{scheme}', expected one of {expected}")]
    UnsupportedScheme {
        field: &'static str,
        scheme: String,
        expected: &'static str,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

const WS_SCHEMES: &[&str] = &["ws", "wss"];
const HTTP_SCHEMES: &[&str] = &["http", "https"];

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.contract.address.parse::<Address>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "contract.address",
            value: config.contract.address.clone(),
        });
    }
    if !config.contract.event_signature.contains('(') {
        errors.push(ValidationError::Invalid {
            field: "contract.event_signature",
            reason: format!("'{}' is not a Solidity event signature", config.contract.event_signature),
        });
    }

    check_url(&mut errors, "observation.ws_url", &config.observation.ws_url, WS_SCHEMES, "ws, wss");
    check_url(&mut errors, "observation.rpc_url", &config.observation.rpc_url, HTTP_SCHEMES, "http, https");
    for url in &config.observation.failover_urls {
        check_url(&mut errors, "observation.failover_urls", url, HTTP_SCHEMES, "http, https");
    }
    check_url(&mut errors, "submission.rpc_url", &config.submission.rpc_url, HTTP_SCHEMES, "http, https");
    for url in &config.submission.failover_urls {
        check_url(&mut errors, "submission.failover_urls", url, HTTP_SCHEMES, "http, https");
    }

    let non_zero = [
        ("observation.rpc_timeout_secs", config.observation.rpc_timeout_secs),
        ("observation.connect_timeout_secs", config.observation.connect_timeout_secs),
        ("observation.buffer_size", config.observation.buffer_size as u64),
        ("submission.rpc_timeout_secs", config.submission.rpc_timeout_secs),
        ("submission.confirmation_timeout_secs", config.submission.confirmation_timeout_secs),
        ("submission.receipt_poll_ms", config.submission.receipt_poll_ms),
        ("submission.gas_limit", config.submission.gas_limit),
        ("supervisor.retry_delay_ms", config.supervisor.retry_delay_ms),
        ("supervisor.rotation_interval_secs", config.supervisor.rotation_interval_secs),
        ("health.interval_secs", config.health.interval_secs),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let bounded = [
        ("supervisor.rotation_interval_secs", config.supervisor.rotation_interval_secs),
        ("health.interval_secs", config.health.interval_secs),
    ];
    for (field, value) in bounded {
        if value > MAX_INTERVAL_SECS {
            errors.push(ValidationError::Invalid {
                field,
                reason: format!("{} exceeds the maximum of {} seconds", value, MAX_INTERVAL_SECS),
            });
        }
    }

    if config.supervisor.max_delay_ms < config.supervisor.retry_delay_ms {
        errors.push(ValidationError::Invalid {
            field: "supervisor.max_delay_ms",
            reason: "must not be smaller than supervisor.retry_delay_ms".to_string(),
        });
    }

    if !(config.submission.gas_price_multiplier >= 1.0) {
        errors.push(ValidationError::Invalid {
            field: "submission.gas_price_multiplier",
            reason: format!("{} is below 1.0", config.submission.gas_price_multiplier),
        });
    }

    if config.telegram.enabled {
        if config.telegram.bot_token.is_empty() {
            errors.push(ValidationError::Invalid {
                field: "telegram.bot_token",
                reason: "required when telegram is enabled".to_string(),
            });
        }
        if config.telegram.chat_id.is_empty() {
            errors.push(ValidationError::Invalid {
                field: "telegram.chat_id",
                reason: "required when telegram is enabled".to_string(),
            });
        }
        check_url(&mut errors, "telegram.api_base", &config.telegram.api_base, HTTP_SCHEMES, "http, https");
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::Invalid {
            field: "observability.metrics_address",
            reason: format!("'{}' is not a socket address", config.observability.metrics_address),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
    schemes: &[&str],
    expected: &'static str,
) {
    match Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(url) => errors.push(ValidationError::UnsupportedScheme {
            field,
            scheme: url.scheme().to_string(),
            expected,
        }),
        Err(_) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}
