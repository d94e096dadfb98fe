//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Supervisor::new (acquire resources) → add_controller* → serve*/run_service*
//!     → Supervisor::wait (entry point parks here)
//!
//! Shutdown (signal or programmatic close):
//!     mark closed → stop every service (stop accept, drain, bounded)
//!     → join barrier reaches zero (every start() returned)
//!     → destroy controllers → release resources
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, then tear down
//! - close() is idempotent; the closed flag guards the stop loop, and the
//!   teardown registries are drained so repeats tear down nothing twice
//! - The join barrier is the only thing wait() and close() block on

pub mod barrier;
pub mod signals;
pub mod supervisor;

pub use barrier::JoinBarrier;
pub use supervisor::Supervisor;
