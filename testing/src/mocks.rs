//! Mock implementations of the environment traits.
//!
//! Every mock keeps its state behind `Arc<Mutex<..>>`, so a clone handed to
//! the code under test and the clone kept by the test observe the same calls.

use pantry_core::cache_key::CacheKey;
use pantry_core::environment::{
    CredentialSource, HttpRequest, HttpResponse, HttpTransport, HydrationStore, MessageKind,
    MessageSink, NavigateOptions, NavigationTarget, Navigator,
};
use pantry_core::error::{ClassifiedError, TransportError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One scripted transport answer.
#[derive(Debug, Clone)]
struct Scripted {
    result: Result<HttpResponse, TransportError>,
    delay: Option<Duration>,
}

/// Scripted HTTP transport.
///
/// Answers are consumed in call order. A call with nothing queued fails with
/// a network error. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// Transport with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON answer. Non-2xx statuses fail the way the real transport
    /// does, with the body attached.
    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push(status_result(status, body), None)
    }

    /// Queue a JSON answer delivered after `delay`.
    pub fn push_delayed(&self, delay: Duration, status: u16, body: Value) -> &Self {
        self.push(status_result(status, body), Some(delay))
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) -> &Self {
        self.push(Err(error), None)
    }

    fn push(&self, result: Result<HttpResponse, TransportError>, delay: Option<Duration>) -> &Self {
        lock(&self.script).push_back(Scripted { result, delay });
        self
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }
}

fn status_result(status: u16, body: Value) -> Result<HttpResponse, TransportError> {
    if (200..300).contains(&status) {
        Ok(HttpResponse { status, body })
    } else {
        Err(TransportError::status(status, Some(body), format!("HTTP {status}")))
    }
}

impl HttpTransport for MockTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        lock(&self.requests).push(request);
        let next = lock(&self.script).pop_front();

        async move {
            let Some(scripted) = next else {
                return Err(TransportError::network("no mock response queued"));
            };
            if let Some(delay) = scripted.delay {
                tokio::time::sleep(delay).await;
            }
            scripted.result
        }
    }
}

/// In-memory hydration payload.
#[derive(Debug, Clone, Default)]
pub struct MemoryHydrationStore {
    entries: Arc<Mutex<HashMap<CacheKey, Value>>>,
}

impl MemoryHydrationStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HydrationStore for MemoryHydrationStore {
    fn get(&self, key: &CacheKey) -> Option<Value> {
        lock(&self.entries).get(key).cloned()
    }

    fn insert(&self, key: CacheKey, value: Value) {
        lock(&self.entries).insert(key, value);
    }
}

/// Navigator that records navigations and follows path targets.
#[derive(Debug, Clone)]
pub struct RecordingNavigator {
    current: Arc<Mutex<String>>,
    navigations: Arc<Mutex<Vec<(NavigationTarget, NavigateOptions)>>>,
}

impl RecordingNavigator {
    /// Navigator sitting at `path`.
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            current: Arc::new(Mutex::new(path.into())),
            navigations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Move to `path` without recording a navigation.
    pub fn set_current_path(&self, path: impl Into<String>) {
        *lock(&self.current) = path.into();
    }

    /// Navigations performed so far.
    #[must_use]
    pub fn navigations(&self) -> Vec<(NavigationTarget, NavigateOptions)> {
        lock(&self.navigations).clone()
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::at("/")
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        lock(&self.current).clone()
    }

    fn navigate_to(
        &self,
        target: &NavigationTarget,
        options: NavigateOptions,
    ) -> impl Future<Output = ()> + Send {
        lock(&self.navigations).push((target.clone(), options));
        if let NavigationTarget::Path(path) = target {
            self.set_current_path(path.clone());
        }
        async {}
    }
}

/// Message sink that records every message.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessageSink {
    messages: Arc<Mutex<Vec<(MessageKind, String)>>>,
}

impl RecordingMessageSink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<(MessageKind, String)> {
        lock(&self.messages).clone()
    }
}

impl MessageSink for RecordingMessageSink {
    fn set_message(&self, kind: MessageKind, message: &str) {
        lock(&self.messages).push((kind, message.to_string()));
    }
}

/// Fixed credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCredential(pub Option<String>);

impl StaticCredential {
    /// Signed-in credential.
    pub fn token(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// Signed-out credential.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredential {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Collects the errors passed to a custom error handler.
#[derive(Debug, Clone, Default)]
pub struct RecordingErrorHandler {
    errors: Arc<Mutex<Vec<ClassifiedError>>>,
}

impl RecordingErrorHandler {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler closure feeding this recorder.
    #[must_use]
    pub fn callback(&self) -> impl Fn(&ClassifiedError) + Send + Sync + 'static {
        let errors = Arc::clone(&self.errors);
        move |error| lock(&errors).push(error.clone())
    }

    /// Errors handled so far.
    #[must_use]
    pub fn errors(&self) -> Vec<ClassifiedError> {
        lock(&self.errors).clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use pantry_core::HttpMethod;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            base_url: "https://api.test".to_string(),
            url: "/x".to_string(),
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_transport_script_order() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({ "ok": true })).push_json(404, json!({ "message": "gone" }));

        let first = transport.execute(request()).await.unwrap();
        assert_eq!(first.body, json!({ "ok": true }));

        let second = transport.execute(request()).await.unwrap_err();
        assert_eq!(second.status, Some(404));

        let third = transport.execute(request()).await.unwrap_err();
        assert_eq!(third.status, None);
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_navigator_follows_paths() {
        let navigator = RecordingNavigator::at("/recipes");
        navigator.navigate_to(&NavigationTarget::path("/"), NavigateOptions::replace()).await;
        assert_eq!(navigator.current_path(), "/");

        navigator.navigate_to(&NavigationTarget::route("login"), NavigateOptions::default()).await;
        assert_eq!(navigator.current_path(), "/");
        assert_eq!(navigator.navigations().len(), 2);
    }

    #[test]
    fn test_error_handler_records() {
        let recorder = RecordingErrorHandler::new();
        let callback = recorder.callback();
        callback(&ClassifiedError {
            status_code: Some(400),
            raw_error_data: None,
            message: "error.bad-request".to_string(),
            origin_from_schema: false,
        });
        assert_eq!(recorder.errors().len(), 1);
    }
}
