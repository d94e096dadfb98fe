//! Two-phase buffered response assembly.
//!
//! # Responsibilities
//! - Accumulate body writes while status and headers stay mutable
//! - Commit exactly once, producing the final response
//!
//! # Design Decisions
//! - Commit consumes the buffer, so a second flush is unrepresentable
//! - Bytes reach the wire exactly as written, in order
//! - Header mutation after commit is impossible by construction; that is the
//!   whole point of buffering (content type is decided during routing but
//!   headers are finalized at commit)

use axum::body::Body;
use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::response::Parts;
use axum::http::{HeaderMap, Response, StatusCode};
use bytes::{Bytes, BytesMut};

/// A response under assembly.
///
/// Writes accumulate in an internal buffer; status and headers remain
/// mutable until [`commit`](ResponseBuffer::commit) seals the response.
#[derive(Debug)]
pub struct ResponseBuffer {
    parts: Parts,
    buffer: BytesMut,
}

impl ResponseBuffer {
    /// Start a buffered response with default status and empty headers.
    pub fn new() -> Self {
        let (parts, _) = Response::new(()).into_parts();
        Self {
            parts,
            buffer: BytesMut::new(),
        }
    }

    /// Start a buffered response from existing parts (status and headers are
    /// carried over and stay mutable).
    pub fn from_parts(parts: Parts) -> Self {
        Self {
            parts,
            buffer: BytesMut::new(),
        }
    }

    /// Append bytes to the buffered body.
    pub fn write(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of bytes buffered so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.parts.status = status;
    }

    /// Mutable access to the headers; valid until commit.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    /// Set the `Content-Type` header, replacing any existing value.
    /// Invalid header values are dropped rather than aborting the response.
    pub fn set_content_type(&mut self, content_type: &str) {
        match HeaderValue::from_str(content_type) {
            Ok(value) => {
                self.parts.headers.insert(CONTENT_TYPE, value);
            }
            Err(error) => {
                tracing::warn!(content_type, %error, "Ignoring invalid content-type annotation");
            }
        }
    }

    /// Whether a `Content-Type` header is present.
    pub fn has_content_type(&self) -> bool {
        self.parts.headers.contains_key(CONTENT_TYPE)
    }

    /// Seal the response. Consuming `self` makes the commit single-shot:
    /// there is no buffer left to flush a second time.
    pub fn commit(self) -> Response<Body> {
        let body: Bytes = self.buffer.freeze();
        Response::from_parts(self.parts, Body::from(body))
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}
