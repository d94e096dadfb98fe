//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the core.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the supervisor and its services.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CoreConfig {
    /// Database resource acquired at supervisor construction. Absent means
    /// the supervisor owns no database handle.
    pub database: Option<DatabaseConfig>,

    /// Listener settings applied to every HTTP service.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Graceful-shutdown settings (drain window and poll cadence).
    pub shutdown: ShutdownConfig,

    /// Locale derivation table for the request pipeline.
    pub locale: LocaleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (e.g., "sqlite://app.db").
    pub url: String,

    /// Maximum pool connections.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 8,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// TCP keep-alive interval applied to accepted connections, in seconds.
    pub keep_alive_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            keep_alive_secs: 180,
        }
    }
}

impl ListenerConfig {
    /// Keep-alive interval as a [`Duration`].
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

/// Timeout configuration for request handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

impl TimeoutConfig {
    /// Request timeout as a [`Duration`].
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

/// Graceful-shutdown configuration.
///
/// Stopping an HTTP service waits for in-flight requests to finish, polling
/// the in-flight gauge at `drain_poll_interval_ms` until it reaches zero,
/// bounded by `drain_timeout_secs`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Hard ceiling on the drain wait, in seconds.
    pub drain_timeout_secs: u64,

    /// Poll interval for the in-flight gauge, in milliseconds.
    pub drain_poll_interval_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 180,
            drain_poll_interval_ms: 50,
        }
    }
}

impl ShutdownConfig {
    /// Drain ceiling as a [`Duration`].
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    /// Drain poll interval as a [`Duration`].
    pub fn drain_poll_interval(&self) -> Duration {
        Duration::from_millis(self.drain_poll_interval_ms)
    }
}

/// Locale derivation configuration.
///
/// A request path whose first segment case-insensitively matches a key in
/// `prefixes` is rewritten with that segment stripped and the mapped tag
/// recorded. Anything else keeps `default` and an untouched path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Locale tag used when no recognized prefix is present.
    pub default: String,

    /// Recognized two-letter path prefixes mapped to locale tags.
    pub prefixes: HashMap<String, String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        let mut prefixes = HashMap::new();
        prefixes.insert("en".to_string(), "en-ca".to_string());
        prefixes.insert("fr".to_string(), "fr-fr".to_string());
        Self {
            default: "fr-fr".to_string(),
            prefixes,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
