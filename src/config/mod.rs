//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CoreConfig (validated, immutable)
//!     → handed to Supervisor::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::CoreConfig;
pub use schema::DatabaseConfig;
pub use schema::ListenerConfig;
pub use schema::LocaleConfig;
pub use schema::ObservabilityConfig;
pub use schema::ShutdownConfig;
pub use schema::TimeoutConfig;
