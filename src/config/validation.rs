//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0)
//! - Check locale prefixes are usable path segments
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: CoreConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::CoreConfig;

/// A single semantic violation found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "shutdown.drain_poll_interval_ms").
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &CoreConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.keep_alive_secs == 0 {
        errors.push(ValidationError {
            field: "listener.keep_alive_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.request_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if config.shutdown.drain_poll_interval_ms == 0 {
        errors.push(ValidationError {
            field: "shutdown.drain_poll_interval_ms".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if config.locale.default.is_empty() {
        errors.push(ValidationError {
            field: "locale.default".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    for (prefix, tag) in &config.locale.prefixes {
        if prefix.len() != 2 || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            errors.push(ValidationError {
                field: format!("locale.prefixes.{prefix}"),
                message: "prefix must be exactly two ASCII letters".to_string(),
            });
        }
        if tag.is_empty() {
            errors.push(ValidationError {
                field: format!("locale.prefixes.{prefix}"),
                message: "locale tag must not be empty".to_string(),
            });
        }
    }

    if let Some(database) = &config.database {
        if database.url.is_empty() {
            errors.push(ValidationError {
                field: "database.url".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if database.max_connections == 0 {
            errors.push(ValidationError {
                field: "database.max_connections".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
