//! Per-request shared state.
//!
//! # Responsibilities
//! - Carry arbitrary render data between middleware and handlers
//! - Record the content-type annotation applied at commit time
//! - Expose the locale derived from the request path
//! - Offer a cooperative cancellation flag for handler chains
//!
//! The context is created by the pipeline for every inbound request,
//! inserted into the request extensions, and dropped when the request
//! completes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

/// Content type applied when neither the handler's response nor the context
/// annotation specifies one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Handle to the per-request state store.
///
/// Cheap to clone; all clones observe the same request's state. Retrieve it
/// in handlers with `axum::Extension<Context>`.
#[derive(Debug, Clone, Default)]
pub struct Context {
    inner: Arc<ContextInner>,
}

#[derive(Debug, Default)]
struct ContextInner {
    /// Arbitrary render data keyed by name.
    data: Mutex<HashMap<String, Value>>,
    /// Content type recorded by a handler; `None` means unannotated.
    content_type: Mutex<Option<String>>,
    /// Locale tag derived from the request path.
    locale: Mutex<String>,
    /// Set when further pipeline processing should stop for this request.
    cancelled: AtomicBool,
}

impl Context {
    /// Create a context with the given locale tag.
    pub fn new(locale: impl Into<String>) -> Self {
        let context = Self::default();
        *context.inner.locale.lock().expect("context lock poisoned") = locale.into();
        context
    }

    /// Store a render value under `key`.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.inner
            .data
            .lock()
            .expect("context lock poisoned")
            .insert(key.into(), value);
    }

    /// Fetch a render value by `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner
            .data
            .lock()
            .expect("context lock poisoned")
            .get(key)
            .cloned()
    }

    /// Annotate the response content type. The annotation is applied to the
    /// headers when the buffered response commits, overriding whatever the
    /// handler's response carried.
    pub fn set_content_type(&self, content_type: impl Into<String>) {
        *self.inner.content_type.lock().expect("context lock poisoned") =
            Some(content_type.into());
    }

    /// The recorded annotation, if a handler set one.
    pub fn content_type_annotation(&self) -> Option<String> {
        self.inner
            .content_type
            .lock()
            .expect("context lock poisoned")
            .clone()
    }

    /// Effective content type: the annotation, or the `text/html` default.
    pub fn content_type(&self) -> String {
        self.content_type_annotation()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
    }

    /// Locale tag derived for this request.
    pub fn locale(&self) -> String {
        self.inner
            .locale
            .lock()
            .expect("context lock poisoned")
            .clone()
    }

    /// Ask the rest of the pipeline to stop processing this request.
    /// Cooperative: handler chains are expected to check [`is_cancelled`].
    ///
    /// [`is_cancelled`]: Context::is_cancelled
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether this request's processing has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }
}
