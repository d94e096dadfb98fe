//! Shared utilities for integration tests.

use std::net::SocketAddr;

use webcore::CoreConfig;

/// Config with a short drain window so shutdown tests stay fast.
pub fn test_config() -> CoreConfig {
    let mut config = CoreConfig::default();
    config.shutdown.drain_timeout_secs = 5;
    config.shutdown.drain_poll_interval_ms = 10;
    config
}

/// GET `path` from a served address with a fresh client (no pooled
/// connections, so a stopped listener is actually observed).
#[allow(dead_code)]
pub async fn get(addr: SocketAddr, path: &str) -> reqwest::Response {
    reqwest::get(format!("http://{}{}", addr, path))
        .await
        .expect("request failed")
}
