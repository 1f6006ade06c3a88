//! Collaborators of the fetch pipeline, injected through the reducer's
//! environment:
//!
//! - [`HttpTransport`]: issues one HTTP request
//! - [`HydrationStore`]: previously computed results keyed by cache key
//! - [`CredentialSource`]: the session's bearer token
//! - [`MessageSink`]: the one-shot server → client message slot
//! - [`Navigator`]: current location and navigation
//!
//! Production implementations live in `pantry-runtime` and `pantry-session`;
//! mocks live in `pantry-testing`.

use crate::cache_key::CacheKey;
use crate::error::TransportError;
use crate::registry::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

/// One HTTP request, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Base URL (scheme + host + optional prefix)
    pub base_url: String,
    /// Compiled path
    pub url: String,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Query pairs, in order
    pub query: Vec<(String, String)>,
    /// JSON body, only when a payload is present
    pub body: Option<Value>,
}

impl HttpRequest {
    /// `base_url` joined with `url`, without the query string.
    #[must_use]
    pub fn full_url(&self) -> String {
        match (self.base_url.ends_with('/'), self.url.starts_with('/')) {
            (true, true) => format!("{}{}", self.base_url, &self.url[1..]),
            (false, false) if !self.url.is_empty() && !self.base_url.is_empty() => {
                format!("{}/{}", self.base_url, self.url)
            },
            _ => format!("{}{}", self.base_url, self.url),
        }
    }

    /// Header value by (case-insensitive) name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A successful HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status
    pub status: u16,
    /// Parsed JSON body
    pub body: Value,
}

/// Issues HTTP requests.
///
/// Implementations return `Ok` only for success statuses; any other status
/// becomes a [`TransportError`] carrying the status and the parsed body.
pub trait HttpTransport: Send + Sync {
    /// Execute `request`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response is received or the status
    /// is not a success.
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// Results computed earlier (e.g. during server rendering), keyed by cache key.
pub trait HydrationStore: Send + Sync {
    /// Cached value for `key`.
    fn get(&self, key: &CacheKey) -> Option<Value>;

    /// Store a value for `key`.
    fn insert(&self, key: CacheKey, value: Value);
}

/// The session's bearer credential.
pub trait CredentialSource: Send + Sync {
    /// Current token, `None` when signed out.
    fn token(&self) -> Option<String>;
}

/// Kind of a cross-phase message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Error notice
    Error,
    /// Informational notice
    Info,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Info => f.write_str("info"),
        }
    }
}

/// Write side of the server → client message slot.
pub trait MessageSink: Send + Sync {
    /// Leave a message for the client phase.
    fn set_message(&self, kind: MessageKind, message: &str);
}

/// Where to navigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NavigationTarget {
    /// A path such as `/`
    Path(String),
    /// A named route with query parameters
    Route {
        /// Route name
        name: String,
        /// Query parameters
        #[serde(default)]
        query: BTreeMap<String, String>,
    },
}

impl NavigationTarget {
    /// Path target.
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Named route target without query.
    pub fn route(name: impl Into<String>) -> Self {
        Self::Route {
            name: name.into(),
            query: BTreeMap::new(),
        }
    }

    /// Add a query parameter to a route target (no-op for paths).
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Route { query, .. } = &mut self {
            query.insert(key.into(), value.into());
        }
        self
    }

    /// Returns `true` if this target is the location `path`.
    ///
    /// Named routes are never considered equal to a path.
    #[must_use]
    pub fn is_location(&self, path: &str) -> bool {
        matches!(self, Self::Path(target) if target == path)
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Route { name, .. } => write!(f, "route:{name}"),
        }
    }
}

/// Navigation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing
    pub replace: bool,
}

impl NavigateOptions {
    /// Options with `replace` set.
    #[must_use]
    pub const fn replace() -> Self {
        Self { replace: true }
    }
}

/// Current location and navigation.
pub trait Navigator: Send + Sync {
    /// Full path of the current location.
    fn current_path(&self) -> String;

    /// Navigate to `target`.
    fn navigate_to(
        &self,
        target: &NavigationTarget,
        options: NavigateOptions,
    ) -> impl Future<Output = ()> + Send;
}

/// Which side of a server-to-client handoff code runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPhase {
    /// Server rendering
    Server,
    /// Client, after hydration
    #[default]
    Client,
}
