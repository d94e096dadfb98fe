//! Process-wide supervisor for long-lived network services.
//!
//! `webcore` runs zero or more start/stop-capable services (primarily HTTP
//! listeners) inside one application and coordinates orderly startup and
//! graceful, bounded shutdown.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 SUPERVISOR                    │
//!                         │                                              │
//!   Client Request        │  ┌─────────┐   ┌──────────┐   ┌───────────┐ │
//!   ──────────────────────┼─▶│   net   │──▶│   http   │──▶│  routing  │ │
//!                         │  │listener │   │ pipeline │   │ (shared   │ │
//!                         │  └─────────┘   └──────────┘   │  router)  │ │
//!                         │       ▲              │        └─────┬─────┘ │
//!                         │       │              ▼              │       │
//!   Client Response       │       │        ┌──────────┐   controllers  │
//!   ◀─────────────────────┼───────┼────────│ buffered │◀───────┘       │
//!                         │       │        │ response │                │
//!                         │       │        └──────────┘                │
//!                         │       │                                    │
//!                         │  ┌────┴────────────────────────────────┐   │
//!                         │  │            lifecycle                 │   │
//!                         │  │  close: stop accept → drain → join  │   │
//!                         │  │  barrier → destroy → release        │   │
//!                         │  └─────────────────────────────────────┘   │
//!                         └──────────────────────────────────────────────┘
//! ```
//!
//! The entry point builds one [`Supervisor`], registers controllers (each
//! contributes routes at registration time), starts services
//! ([`Supervisor::serve`] for HTTP, [`Supervisor::run_service`] for anything
//! else) and parks on [`Supervisor::wait`]. An OS signal or a programmatic
//! [`Supervisor::close`] stops every service, waits for their tasks to
//! return, then tears down controllers and external resources.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;
pub mod service;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resource;

pub use config::CoreConfig;
pub use error::CoreError;
pub use http::{Context, ResponseBuffer};
pub use lifecycle::signals::close_on_interrupt;
pub use lifecycle::Supervisor;
pub use resource::{Database, Resource};
pub use routing::{Controller, Routes};
pub use service::{HttpService, Service};
