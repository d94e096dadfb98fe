//! Route registration subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor::add_controller(controller)
//!     → controller.init(&mut Routes)   (registers the routes it owns)
//!     → Supervisor::serve snapshots the Routes into an HTTP service
//!     → pipeline dispatches requests against the snapshot
//! ```
//!
//! # Design Decisions
//! - Controllers are an explicit capability trait ({init, destroy, name}),
//!   not a reflected base type
//! - Registration is serialized by the supervisor's lock; a serve call sees
//!   every controller registered before it

pub mod controller;
pub mod routes;

pub use controller::Controller;
pub use routes::Routes;
