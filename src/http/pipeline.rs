//! Per-request pipeline.
//!
//! # Responsibilities
//! - Track every request in the service's in-flight gauge
//! - Assign a request ID and a trace span
//! - Derive the locale prefix and rewrite the path before routing
//! - Install the request context and effective client address
//! - Dispatch to the shared router
//! - Recover handler panics into 500 responses
//! - Buffer the response so the content-type annotation can still reach the
//!   headers, then commit exactly once
//!
//! # Design Decisions
//! - Panic isolation lives here, not in the router, so it covers middleware
//!   layers as well as handlers
//! - Streaming responses (no exact size) bypass the buffer; late annotations
//!   are silently ignored for them — headers are already on their way
//! - The in-flight guard is held across the whole future, so cancelled
//!   connection tasks and panics both release their count

use std::convert::Infallible;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::HeaderValue;
use axum::http::{HeaderMap, Request, Response, StatusCode, Uri};
use axum::Router;
use futures_util::FutureExt;
use hyper::body::Body as HttpBody;
use hyper::body::Incoming;
use tower::ServiceExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::schema::LocaleConfig;
use crate::http::context::{Context, DEFAULT_CONTENT_TYPE};
use crate::http::locale;
use crate::http::response::ResponseBuffer;
use crate::net::inflight::InflightCounter;

/// Header carrying the request ID, inbound and outbound.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The per-request service installed on every accepted connection.
///
/// One pipeline is built per HTTP service and cloned per connection with the
/// peer address filled in; all clones share the router and in-flight gauge.
#[derive(Clone)]
pub struct RequestPipeline {
    router: Router,
    inflight: InflightCounter,
    locale: Arc<LocaleConfig>,
    peer: SocketAddr,
}

impl RequestPipeline {
    /// Build the pipeline template for a service.
    pub fn new(router: Router, inflight: InflightCounter, locale: Arc<LocaleConfig>) -> Self {
        Self {
            router,
            inflight,
            locale,
            peer: SocketAddr::from(([0, 0, 0, 0], 0)),
        }
    }

    /// Clone the pipeline for one accepted connection.
    pub fn for_peer(&self, peer: SocketAddr) -> Self {
        let mut pipeline = self.clone();
        pipeline.peer = peer;
        pipeline
    }

    async fn handle(self, mut request: Request<Body>) -> Response<Body> {
        let _guard = self.inflight.track();

        let request_id = request_id(request.headers());
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            request.headers_mut().entry(X_REQUEST_ID).or_insert(value);
        }

        let derived = locale::derive(&self.locale, request.uri().path());
        if derived.path != request.uri().path() {
            *request.uri_mut() = rewrite_path(request.uri(), &derived.path);
        }

        let context = Context::new(derived.tag.clone());
        request.extensions_mut().insert(context.clone());
        let connect_info = ConnectInfo(self.client_addr(request.headers()));
        request.extensions_mut().insert(connect_info);

        let span = tracing::debug_span!(
            "request",
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            locale = %derived.tag,
        );

        let router = self.router.clone();
        let dispatch = async move { router.oneshot(request).await };
        let outcome = AssertUnwindSafe(dispatch.instrument(span)).catch_unwind().await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(never)) => match never {},
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    request_id = %request_id,
                    panic = %message,
                    "Handler panicked"
                );
                panic_response(&message)
            }
        };

        let mut response = finalize(response, &context).await;
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(X_REQUEST_ID, value);
        }
        response
    }

    /// Effective client address: a leading `x-forwarded-for` entry wins over
    /// the socket peer, mirroring proxy-header handling upstream of us.
    fn client_addr(&self, headers: &HeaderMap) -> SocketAddr {
        forwarded_for(headers)
            .map(|ip| SocketAddr::new(ip, 0))
            .unwrap_or(self.peer)
    }
}

impl hyper::service::Service<Request<Incoming>> for RequestPipeline {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: Request<Incoming>) -> Self::Future {
        let pipeline = self.clone();
        Box::pin(async move { Ok(pipeline.handle(request.map(Body::new)).await) })
    }
}

/// Deferred stage: buffer the response, apply the content-type annotation,
/// commit once. Streaming responses pass through untouched.
async fn finalize(response: Response<Body>, context: &Context) -> Response<Body> {
    if HttpBody::size_hint(response.body()).exact().is_none() {
        // Headers are effectively committed for a streaming body.
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!(%error, "Failed to buffer response body");
            return panic_response("response body unavailable");
        }
    };

    let mut buffer = ResponseBuffer::from_parts(parts);
    buffer.write(&bytes);

    match context.content_type_annotation() {
        Some(annotation) => buffer.set_content_type(&annotation),
        None => {
            if !buffer.has_content_type() {
                buffer.set_content_type(DEFAULT_CONTENT_TYPE);
            }
        }
    }

    buffer.commit()
}

/// Build the generic 500 returned for recovered panics. The body carries
/// only the panic's display text, never internal state.
fn panic_response(message: &str) -> Response<Body> {
    let mut buffer = ResponseBuffer::new();
    buffer.set_status(StatusCode::INTERNAL_SERVER_ERROR);
    buffer.write(format!("Internal error: {}", message).as_bytes());
    buffer.commit()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Reuse the inbound request ID when present, otherwise mint one.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Swap the path while preserving the query string. A rewrite that fails to
/// parse keeps the original URI.
fn rewrite_path(uri: &Uri, new_path: &str) -> Uri {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", new_path, query),
        None => new_path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    match path_and_query.parse() {
        Ok(path_and_query) => {
            parts.path_and_query = Some(path_and_query);
            Uri::from_parts(parts).unwrap_or_else(|_| uri.clone())
        }
        Err(_) => uri.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Extension;
    use bytes::Bytes;

    fn pipeline(router: Router) -> RequestPipeline {
        RequestPipeline::new(
            router,
            InflightCounter::new(),
            Arc::new(LocaleConfig::default()),
        )
    }

    async fn body_bytes(response: Response<Body>) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn default_content_type_fills_missing_header() {
        let router = Router::new().route(
            "/plain",
            get(|| async { Response::new(Body::from("hello")) }),
        );

        let request = Request::builder()
            .uri("/plain")
            .body(Body::empty())
            .unwrap();
        let response = pipeline(router).handle(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            DEFAULT_CONTENT_TYPE
        );
        assert_eq!(body_bytes(response).await.as_ref(), b"hello");
    }

    #[tokio::test]
    async fn annotation_set_during_dispatch_wins() {
        let router = Router::new().route(
            "/csv",
            get(|Extension(context): Extension<Context>| async move {
                context.set_content_type("text/csv");
                "a,b\n1,2\n"
            }),
        );

        let request = Request::builder().uri("/csv").body(Body::empty()).unwrap();
        let response = pipeline(router).handle(request).await;

        assert_eq!(response.headers().get("content-type").unwrap(), "text/csv");
        assert_eq!(body_bytes(response).await.as_ref(), b"a,b\n1,2\n");
    }

    async fn boom() -> &'static str {
        panic!("the database is on fire");
    }

    #[tokio::test]
    async fn panic_becomes_generic_500() {
        let router = Router::new().route("/boom", get(boom));

        let request = Request::builder().uri("/boom").body(Body::empty()).unwrap();
        let response = pipeline(router).handle(request).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_bytes(response).await;
        assert!(body.starts_with(b"Internal error:"));
    }

    #[tokio::test]
    async fn locale_prefix_is_stripped_before_routing() {
        let router = Router::new().route(
            "/greet",
            get(|Extension(context): Extension<Context>| async move { context.locale() }),
        );

        let request = Request::builder()
            .uri("/en/greet")
            .body(Body::empty())
            .unwrap();
        let response = pipeline(router.clone()).handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await.as_ref(), b"en-ca");

        // An unrecognized prefix leaves the path alone, so the route misses.
        let request = Request::builder()
            .uri("/xx/greet")
            .body(Body::empty())
            .unwrap();
        let response = pipeline(router).handle(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn response_carries_request_id() {
        let router = Router::new().route("/ok", get(|| async { "ok" }));

        let request = Request::builder()
            .uri("/ok")
            .header(X_REQUEST_ID, "req-42")
            .body(Body::empty())
            .unwrap();
        let response = pipeline(router).handle(request).await;

        assert_eq!(response.headers().get(X_REQUEST_ID).unwrap(), "req-42");
    }
}
