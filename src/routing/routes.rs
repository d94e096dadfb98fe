//! Mutable route registry handed to controllers.

use axum::routing::MethodRouter;
use axum::Router;

/// Builder over the shared router.
///
/// Controllers receive `&mut Routes` in [`init`](crate::Controller::init)
/// and append the routes they own. [`snapshot`](Routes::snapshot) hands a
/// clone of the current router to a service; later registrations are not
/// reflected in earlier snapshots.
#[derive(Debug, Default)]
pub struct Routes {
    router: Router,
    registered: usize,
}

impl Routes {
    /// An empty route registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route at `path`.
    ///
    /// Paths use the router's syntax (e.g., `/users/{id}`). Registering the
    /// same path twice panics, matching the router's own contract; route
    /// ownership between controllers is an application-level agreement.
    pub fn route(&mut self, path: &str, handler: MethodRouter) -> &mut Self {
        let router = std::mem::take(&mut self.router);
        self.router = router.route(path, handler);
        self.registered += 1;
        self
    }

    /// Merge a pre-built router (e.g., a controller with nested structure).
    pub fn merge(&mut self, other: Router) -> &mut Self {
        let router = std::mem::take(&mut self.router);
        self.router = router.merge(other);
        self.registered += 1;
        self
    }

    /// Number of registration calls so far.
    pub fn registered(&self) -> usize {
        self.registered
    }

    /// Clone the current router for a service.
    pub fn snapshot(&self) -> Router {
        self.router.clone()
    }
}
