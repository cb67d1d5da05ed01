//! HTTP request-context accessor.
//!
//! Handlers sometimes need values from the surrounding HTTP request (a
//! bearer token, a header, a path segment) without depending on the web
//! framework itself. [`RequestAccessor`] exposes a snapshot of the current
//! request; running outside a web call is an `Empty`, never a crash.

use std::collections::HashMap;

use common::{CorrelationId, Optional};

/// An immutable snapshot of one HTTP request.
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
    method: String,
    path: String,
    headers: HashMap<String, String>,
}

impl RequestSnapshot {
    /// Builds a snapshot from the request line and headers.
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers,
        }
    }

    /// The request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// A header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Optional<String> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
            .into()
    }

    /// The bearer token from the `Authorization` header, with the scheme
    /// prefix stripped.
    pub fn bearer_token(&self) -> Optional<String> {
        self.header("authorization").and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .map(|token| token.to_string())
                .into()
        })
    }

    /// The correlation id the caller advertised via `X-Correlation-Id`.
    ///
    /// A missing header is `Empty`; a header that does not parse is
    /// `Failed`, so a caller sending garbage is distinguishable from one
    /// sending nothing.
    pub fn correlation_id(&self) -> Optional<CorrelationId> {
        self.header("x-correlation-id")
            .and_then(|value| match value.parse() {
                Ok(id) => Optional::value(id),
                Err(error) => Optional::failed(error),
            })
    }

    /// The zero-based path segment at `index`, skipping empty segments.
    pub fn path_segment(&self, index: usize) -> Optional<String> {
        self.path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .nth(index)
            .map(|segment| segment.to_string())
            .into()
    }
}

/// Access to the current request, if any.
pub trait RequestAccessor: Send + Sync {
    /// The current request snapshot; `Empty` outside a web call.
    fn current(&self) -> Optional<RequestSnapshot>;

    /// A header from the current request.
    fn header(&self, name: &str) -> Optional<String> {
        self.current().and_then(|request| request.header(name))
    }

    /// The bearer token from the current request.
    fn bearer_token(&self) -> Optional<String> {
        self.current().and_then(|request| request.bearer_token())
    }

    /// The caller-advertised correlation id from the current request.
    fn correlation_id(&self) -> Optional<CorrelationId> {
        self.current().and_then(|request| request.correlation_id())
    }

    /// A path segment from the current request.
    fn path_segment(&self, index: usize) -> Optional<String> {
        self.current()
            .and_then(|request| request.path_segment(index))
    }
}

/// A fixed accessor for tests and non-web entry points.
#[derive(Debug, Clone, Default)]
pub struct StaticRequestAccessor {
    snapshot: Option<RequestSnapshot>,
}

impl StaticRequestAccessor {
    /// An accessor with no current request.
    pub fn absent() -> Self {
        Self::default()
    }

    /// An accessor always returning `snapshot`.
    pub fn with_request(snapshot: RequestSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }
}

impl RequestAccessor for StaticRequestAccessor {
    fn current(&self) -> Optional<RequestSnapshot> {
        self.snapshot.clone().into()
    }
}
