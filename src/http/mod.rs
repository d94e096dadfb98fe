//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted TCP stream
//!     → pipeline.rs (request id, locale rewrite, context install)
//!     → shared router (controllers' handlers run here)
//!     → pipeline.rs deferred stage (panic → 500, buffer, content type)
//!     → response.rs (single commit of the buffered response)
//! ```
//!
//! # Design Decisions
//! - The response is buffered so metadata decided during routing (locale,
//!   content type) can still reach the headers after the body exists
//! - Panics are isolated per request; the process never dies for a handler
//! - Streaming responses bypass the buffer and keep their own headers

pub mod context;
pub mod locale;
pub mod pipeline;
pub mod response;

pub use context::Context;
pub use pipeline::{RequestPipeline, X_REQUEST_ID};
pub use response::ResponseBuffer;
