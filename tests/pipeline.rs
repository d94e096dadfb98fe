//! End-to-end request pipeline behavior over a real listener.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::Response;
use axum::routing::get;
use axum::Extension;
use webcore::{Context, Controller, Routes, Supervisor};

use common::test_config;

struct AppController;

async fn hello() -> &'static str {
    "hello"
}

async fn raw() -> Response<Body> {
    // No content type on purpose; the pipeline fills in the default.
    Response::new(Body::from("raw"))
}

async fn boom() -> &'static str {
    panic!("kaboom");
}

async fn locale(Extension(context): Extension<Context>) -> String {
    context.locale()
}

async fn csv(Extension(context): Extension<Context>) -> &'static str {
    context.set_content_type("text/csv");
    "a,b\n1,2\n"
}

async fn stream(Extension(context): Extension<Context>) -> Response<Body> {
    // The annotation must be ignored: this response streams, so its headers
    // are already committed.
    context.set_content_type("text/csv");
    let chunks = futures_util::stream::iter(vec![
        Ok::<_, std::io::Error>("chunk-one;"),
        Ok("chunk-two"),
    ]);
    Response::builder()
        .header("content-type", "application/octet-stream")
        .body(Body::from_stream(chunks))
        .unwrap()
}

impl Controller for AppController {
    fn name(&self) -> &str {
        "app"
    }

    fn init(&mut self, routes: &mut Routes) {
        routes
            .route("/hello", get(hello))
            .route("/raw", get(raw))
            .route("/boom", get(boom))
            .route("/locale", get(locale))
            .route("/csv", get(csv))
            .route("/stream", get(stream));
    }

    fn destroy(&mut self) {}
}

async fn serve_app() -> (Supervisor, SocketAddr) {
    let supervisor = Supervisor::new(test_config()).await.unwrap();
    supervisor.add_controller(Box::new(AppController)).await;
    let addr = supervisor.serve("127.0.0.1:0").await.unwrap();
    (supervisor, addr)
}

#[tokio::test]
async fn panic_is_isolated_to_its_request() {
    let (supervisor, addr) = serve_app().await;

    let slow_hello = tokio::spawn(async move {
        let response = common::get(addr, "/hello").await;
        (response.status().as_u16(), response.text().await.unwrap())
    });

    let response = common::get(addr, "/boom").await;
    assert_eq!(response.status(), 500);
    let body = response.text().await.unwrap();
    assert!(!body.is_empty());
    assert!(body.starts_with("Internal error:"));

    // The panicking request affected nothing else; the service still serves.
    let (status, body) = slow_hello.await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, "hello");

    let response = common::get(addr, "/hello").await;
    assert_eq!(response.status(), 200);

    supervisor.close().await;
}

#[tokio::test]
async fn content_type_annotation_wins_over_handler_headers() {
    let (supervisor, addr) = serve_app().await;

    let response = common::get(addr, "/csv").await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv"
    );
    assert_eq!(response.text().await.unwrap(), "a,b\n1,2\n");

    supervisor.close().await;
}

#[tokio::test]
async fn missing_content_type_defaults_to_html() {
    let (supervisor, addr) = serve_app().await;

    let response = common::get(addr, "/raw").await;
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/html"
    );
    assert_eq!(response.text().await.unwrap(), "raw");

    supervisor.close().await;
}

#[tokio::test]
async fn locale_prefixes_rewrite_the_routed_path() {
    let (supervisor, addr) = serve_app().await;

    let response = common::get(addr, "/en/locale").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "en-ca");

    let response = common::get(addr, "/fr/locale").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "fr-fr");

    let response = common::get(addr, "/locale").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "fr-fr");

    // Unrecognized prefix: default locale, path untouched, so no route.
    let response = common::get(addr, "/xx/locale").await;
    assert_eq!(response.status(), 404);

    supervisor.close().await;
}

#[tokio::test]
async fn streaming_responses_keep_their_own_headers() {
    let (supervisor, addr) = serve_app().await;

    let response = common::get(addr, "/stream").await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/octet-stream"
    );
    assert_eq!(response.text().await.unwrap(), "chunk-one;chunk-two");

    supervisor.close().await;
}

#[tokio::test]
async fn request_id_is_minted_and_echoed() {
    let (supervisor, addr) = serve_app().await;

    let response = common::get(addr, "/hello").await;
    assert!(response.headers().contains_key("x-request-id"));

    let response = reqwest::Client::new()
        .get(format!("http://{}/hello", addr))
        .header("x-request-id", "req-observed-7")
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-observed-7"
    );

    supervisor.close().await;
}
