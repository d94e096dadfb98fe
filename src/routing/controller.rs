//! Controller contract.

use crate::routing::routes::Routes;

/// A unit of route ownership with a two-point lifecycle.
///
/// `init` runs exactly once, synchronously, when the controller is
/// registered with the supervisor; it must register every route the
/// controller owns. `destroy` runs exactly once during supervisor close,
/// after all services have stopped. `name` is a stable identifier, also
/// usable as a URL segment or template namespace.
pub trait Controller: Send + Sync + 'static {
    /// Stable identifier for logs and namespacing.
    fn name(&self) -> &str;

    /// Register this controller's routes. Called once at registration.
    fn init(&mut self, routes: &mut Routes);

    /// Release per-controller resources. Called once during close, after
    /// every service has stopped.
    fn destroy(&mut self);
}
