//! External resources owned by the supervisor.
//!
//! # Design Decisions
//! - The supervisor treats resources as opaque: acquire at construction with
//!   an explicit failure, close once at the end of shutdown
//! - close() must be idempotent-safe; the supervisor guarantees it is only
//!   invoked once, but the contract keeps repeated closes harmless

pub mod database;

use async_trait::async_trait;

pub use database::Database;

/// An externally acquired handle released at the end of supervisor close.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Stable identifier for logs.
    fn name(&self) -> &str;

    /// Release the resource. Safe to call on an already-closed handle.
    async fn close(&self);
}
