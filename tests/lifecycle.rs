//! Supervisor lifecycle: registration, concurrent close, drain, teardown.

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::routing::get;
use tokio::sync::Notify;
use webcore::{Controller, CoreError, Routes, Service, Supervisor};

use common::test_config;

/// Controller registering one route named after itself.
struct NamedController {
    name: &'static str,
    destroyed: Arc<AtomicUsize>,
}

impl NamedController {
    fn new(name: &'static str) -> (Self, Arc<AtomicUsize>) {
        let destroyed = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name,
                destroyed: destroyed.clone(),
            },
            destroyed,
        )
    }
}

impl Controller for NamedController {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&mut self, routes: &mut Routes) {
        let name = self.name;
        routes.route(&format!("/{}", name), get(move || async move { name }));
    }

    fn destroy(&mut self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Service that parks in start() until stopped, counting stop calls.
struct ParkedService {
    stops: AtomicUsize,
    started: AtomicBool,
    finished: AtomicBool,
    release: Notify,
}

impl ParkedService {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            stops: AtomicUsize::new(0),
            started: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl Service for ParkedService {
    fn name(&self) -> &str {
        "parked"
    }

    async fn start(&self) -> Result<(), CoreError> {
        self.started.store(true, Ordering::SeqCst);
        self.release.notified().await;
        // Simulate teardown work after the stop signal arrives; close() must
        // not return before this completes.
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.release.notify_one();
    }
}

#[tokio::test]
async fn controllers_register_routes_in_call_order() {
    let supervisor = Supervisor::new(test_config()).await.unwrap();

    let (alpha, _) = NamedController::new("alpha");
    let (beta, _) = NamedController::new("beta");
    supervisor.add_controller(Box::new(alpha)).await;
    supervisor.add_controller(Box::new(beta)).await;

    let addr = supervisor.serve("127.0.0.1:0").await.unwrap();

    for name in ["alpha", "beta"] {
        let response = common::get(addr, &format!("/{}", name)).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), name);
    }

    supervisor.close().await;
}

#[tokio::test]
async fn concurrent_close_stops_each_service_once() {
    let supervisor = Arc::new(Supervisor::new(test_config()).await.unwrap());

    let service = ParkedService::new();
    supervisor.run_service(service.clone()).await;
    assert_eq!(supervisor.running(), 1);

    tokio::join!(supervisor.close(), supervisor.close(), supervisor.close());

    assert_eq!(service.stops.load(Ordering::SeqCst), 1);
    assert_eq!(supervisor.running(), 0);

    // A later close is still a no-op.
    supervisor.close().await;
    assert_eq!(service.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn close_returns_only_after_start_tasks_finish() {
    let supervisor = Supervisor::new(test_config()).await.unwrap();

    let service = ParkedService::new();
    supervisor.run_service(service.clone()).await;
    if !service.started.load(Ordering::SeqCst) {
        // run_service only yields; give the task a moment if it lost the race.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(service.started.load(Ordering::SeqCst));

    supervisor.close().await;
    assert!(service.finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn wait_unblocks_when_closed_elsewhere() {
    let supervisor = Arc::new(Supervisor::new(test_config()).await.unwrap());
    supervisor.run_service(ParkedService::new()).await;

    let closer = {
        let supervisor = supervisor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            supervisor.close().await;
        })
    };

    tokio::time::timeout(Duration::from_secs(2), supervisor.wait())
        .await
        .expect("wait() never unblocked");
    closer.await.unwrap();
}

#[tokio::test]
async fn close_drains_in_flight_http_requests() {
    let supervisor = Arc::new(Supervisor::new(test_config()).await.unwrap());

    let (controller, _) = NamedController::new("unused");
    supervisor.add_controller(Box::new(controller)).await;

    // A slow route registered directly for this test.
    struct SlowController;
    impl Controller for SlowController {
        fn name(&self) -> &str {
            "slow"
        }
        fn init(&mut self, routes: &mut Routes) {
            routes.route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    "done"
                }),
            );
        }
        fn destroy(&mut self) {}
    }
    supervisor.add_controller(Box::new(SlowController)).await;

    let addr = supervisor.serve("127.0.0.1:0").await.unwrap();

    let request = tokio::spawn(async move {
        let response = common::get(addr, "/slow").await;
        (response.status().as_u16(), response.text().await.unwrap())
    });

    // Let the request get in flight before closing.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let closing = Instant::now();
    supervisor.close().await;
    let close_elapsed = closing.elapsed();

    let (status, body) = request.await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, "done");
    assert!(
        close_elapsed >= Duration::from_millis(200),
        "close returned before the in-flight request drained"
    );

    // The listener is gone: a fresh connection must fail.
    assert!(reqwest::get(format!("http://{}/slow", addr)).await.is_err());
}

#[tokio::test]
async fn serve_surfaces_bind_failure_synchronously() {
    let supervisor = Supervisor::new(test_config()).await.unwrap();
    let addr = supervisor.serve("127.0.0.1:0").await.unwrap();

    let error = supervisor.serve(&addr.to_string()).await.unwrap_err();
    assert!(matches!(error, CoreError::BindFailed { .. }));

    supervisor.close().await;
}

#[tokio::test]
async fn closed_supervisor_refuses_new_services() {
    let supervisor = Supervisor::new(test_config()).await.unwrap();
    supervisor.close().await;

    let service = ParkedService::new();
    supervisor.run_service(service.clone()).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!service.started.load(Ordering::SeqCst));
    assert_eq!(supervisor.running(), 0);
}

/// Resource that counts how many times it was released.
struct CountingResource {
    closes: AtomicUsize,
}

#[async_trait]
impl webcore::Resource for CountingResource {
    fn name(&self) -> &str {
        "counting"
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn teardown_runs_exactly_once_per_controller_and_resource() {
    let mut config = test_config();
    config.database = Some(webcore::config::DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 2,
    });

    let supervisor = Arc::new(Supervisor::new(config).await.unwrap());

    let (controller, destroyed) = NamedController::new("once");
    supervisor.add_controller(Box::new(controller)).await;

    let resource = Arc::new(CountingResource {
        closes: AtomicUsize::new(0),
    });
    supervisor.add_resource(resource.clone()).await;

    let database = supervisor.database().unwrap().clone();
    assert!(!database.pool().is_closed());

    tokio::join!(supervisor.close(), supervisor.close());
    supervisor.close().await;

    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(resource.closes.load(Ordering::SeqCst), 1);
    assert!(database.pool().is_closed());
}

#[tokio::test]
async fn resource_unavailable_surfaces_from_new() {
    let mut config = test_config();
    config.database = Some(webcore::config::DatabaseConfig {
        url: "sqlite:///no/such/dir/app.db".to_string(),
        max_connections: 1,
    });

    let error = Supervisor::new(config).await.unwrap_err();
    assert!(matches!(error, CoreError::ResourceUnavailable { .. }));
}
