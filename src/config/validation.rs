//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration, collecting every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    if config.request.timeout_secs == 0 {
        errors.push(ValidationError::new("request.timeout_secs", "must be greater than 0"));
    }

    if HeaderName::from_bytes(config.request.request_id_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "request.request_id_header",
            format!("`{}` is not a valid header name", config.request.request_id_header),
        ));
    }

    if config.context.pool_capacity == 0 {
        errors.push(ValidationError::new("context.pool_capacity", "must be greater than 0"));
    }

    if config.throttle.enabled {
        if config.throttle.rate == 0 {
            errors.push(ValidationError::new("throttle.rate", "must be greater than 0"));
        }
        if config.throttle.window_ms == 0 {
            errors.push(ValidationError::new("throttle.window_ms", "must be greater than 0"));
        }
    }

    if config.slowdown.enabled && config.slowdown.max_concurrency == 0 {
        errors.push(ValidationError::new("slowdown.max_concurrency", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
