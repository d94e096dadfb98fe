//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; every subsystem logs with fields
//! - The request ID flows from the pipeline into every request span
//! - No metrics endpoint: the in-flight gauge exists solely for drain
//!   decisions and is not exported

pub mod logging;
