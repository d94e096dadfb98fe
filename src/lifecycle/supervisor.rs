//! The process-wide supervisor.
//!
//! # Responsibilities
//! - Own the controller, service and resource registries
//! - Serialize every registry mutation behind one lock
//! - Provide idempotent, signal-safe close with a join barrier over
//!   running services
//!
//! # Design Decisions
//! - The closed flag guards the stop loop, not the whole close(): concurrent
//!   closers skip the stop loop but still wait for the barrier
//! - Controllers and resources are drained out of the registries before
//!   teardown, so destroy/close run exactly once no matter how many times
//!   close() is invoked
//! - run_service enters the barrier before spawning, so wait() can never
//!   slip through between registration and launch

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::schema::CoreConfig;
use crate::error::CoreError;
use crate::lifecycle::barrier::JoinBarrier;
use crate::net::listener::{CancellableListener, ListenerError};
use crate::resource::{Database, Resource};
use crate::routing::controller::Controller;
use crate::routing::routes::Routes;
use crate::service::http::HttpService;
use crate::service::Service;

/// Top-level owner of all services, controllers and external resources.
///
/// Created once per process, torn down by one [`close`](Supervisor::close).
pub struct Supervisor {
    config: CoreConfig,
    state: Mutex<State>,
    barrier: JoinBarrier,
    database: Option<Arc<Database>>,
}

/// Registries and the closed flag, all behind the supervisor's one lock.
struct State {
    closed: bool,
    controllers: Vec<Box<dyn Controller>>,
    services: Vec<Arc<dyn Service>>,
    resources: Vec<Arc<dyn Resource>>,
    routes: Routes,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("running", &self.running())
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Build a supervisor, acquiring the externally configured resources.
    ///
    /// Fails with [`CoreError::ResourceUnavailable`] when an acquisition
    /// fails; nothing is partially started in that case.
    pub async fn new(config: CoreConfig) -> Result<Self, CoreError> {
        let mut resources: Vec<Arc<dyn Resource>> = Vec::new();

        let database = match &config.database {
            Some(database_config) => {
                let database = Arc::new(Database::connect(database_config).await?);
                resources.push(database.clone());
                Some(database)
            }
            None => None,
        };

        Ok(Self {
            config,
            state: Mutex::new(State {
                closed: false,
                controllers: Vec::new(),
                services: Vec::new(),
                resources,
                routes: Routes::new(),
            }),
            barrier: JoinBarrier::new(),
            database,
        })
    }

    /// The database resource, when one was configured.
    pub fn database(&self) -> Option<&Arc<Database>> {
        self.database.as_ref()
    }

    /// Register a controller: its `init` runs now, under the lock, and adds
    /// the controller's routes to the shared registry.
    pub async fn add_controller(&self, mut controller: Box<dyn Controller>) {
        let mut state = self.state.lock().await;
        if state.closed {
            tracing::warn!(
                controller = controller.name(),
                "Supervisor closed; controller not registered"
            );
            return;
        }

        controller.init(&mut state.routes);
        tracing::info!(
            controller = controller.name(),
            routes = state.routes.registered(),
            "Controller registered"
        );
        state.controllers.push(controller);
    }

    /// Register an extra opaque resource to be released during close.
    pub async fn add_resource(&self, resource: Arc<dyn Resource>) {
        let mut state = self.state.lock().await;
        state.resources.push(resource);
    }

    /// Append a service and launch its `start` task.
    ///
    /// Yields once before returning so the new task gets a scheduling
    /// opportunity; callers must not assume the service has fully bound or
    /// begun accepting by the time this returns.
    pub async fn run_service(&self, service: Arc<dyn Service>) {
        {
            let mut state = self.state.lock().await;
            if state.closed {
                tracing::warn!(
                    service = service.name(),
                    "Supervisor closed; service not started"
                );
                return;
            }

            state.services.push(service.clone());

            let token = self.barrier.enter();
            tokio::spawn(async move {
                let _token = token;
                if let Err(error) = service.start().await {
                    tracing::error!(service = service.name(), %error, "Service terminated with error");
                }
            });
        }

        tokio::task::yield_now().await;
    }

    /// Bind an HTTP service on `addr` ("host:port"; empty host defaults to
    /// the standard HTTP port) serving a snapshot of the registered routes,
    /// and run it. Bind failures surface here, synchronously.
    pub async fn serve(&self, addr: &str) -> Result<SocketAddr, CoreError> {
        let listener =
            CancellableListener::bind(addr, self.config.listener.keep_alive())
                .await
                .map_err(|error| match error {
                    ListenerError::Bind(source) => CoreError::BindFailed {
                        addr: addr.to_string(),
                        source,
                    },
                    other => CoreError::Listener(other),
                })?;

        let local_addr = listener.local_addr();

        let router = self.state.lock().await.routes.snapshot();
        let service = Arc::new(HttpService::new(listener, router, &self.config));

        self.run_service(service).await;

        Ok(local_addr)
    }

    /// Stop everything, exactly once, no matter how many callers race here.
    ///
    /// The closer that flips the flag stops every service in registration
    /// order; every caller then waits for all service tasks to return before
    /// controllers are destroyed and resources released.
    pub async fn close(&self) {
        {
            let mut state = self.state.lock().await;
            if !state.closed {
                state.closed = true;
                tracing::info!(services = state.services.len(), "Supervisor closing");

                for service in &state.services {
                    service.stop().await;
                }
            }
        }

        self.barrier.wait().await;

        let (controllers, resources) = {
            let mut state = self.state.lock().await;
            (
                std::mem::take(&mut state.controllers),
                std::mem::take(&mut state.resources),
            )
        };

        for mut controller in controllers {
            tracing::debug!(controller = controller.name(), "Destroying controller");
            controller.destroy();
        }

        for resource in resources {
            tracing::debug!(resource = resource.name(), "Releasing resource");
            resource.close().await;
        }
    }

    /// Block until every running service's `start` task has returned.
    pub async fn wait(&self) {
        self.barrier.wait().await;
    }

    /// Number of services whose `start` task has not yet returned.
    pub fn running(&self) -> usize {
        self.barrier.running()
    }
}
