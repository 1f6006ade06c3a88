//! Fetch environment.
//!
//! This module defines the environment type for dependency injection
//! in the fetch reducer.

use crate::config::ApiConfig;
use pantry_core::classify::ClassifierConfig;
use pantry_core::environment::{
    CredentialSource, HttpTransport, HydrationStore, MessageSink, Navigator, RenderPhase,
};
use pantry_core::request::RequestContext;
use std::sync::Arc;

/// Fetch environment.
///
/// Contains every external collaborator of one call site.
///
/// # Type Parameters
///
/// - `T`: HTTP transport
/// - `H`: Hydration store
/// - `C`: Credential source
/// - `N`: Navigator
/// - `M`: Cross-phase message sink
#[derive(Clone)]
pub struct FetchEnvironment<T, H, C, N, M>
where
    T: HttpTransport + Clone,
    H: HydrationStore + Clone,
    C: CredentialSource + Clone,
    N: Navigator + Clone,
    M: MessageSink + Clone,
{
    /// HTTP transport.
    pub transport: T,
    /// Results computed earlier, keyed by cache key.
    pub hydration: H,
    /// Session bearer token.
    pub credentials: C,
    /// Current location and navigation.
    pub navigator: N,
    /// Server → client message slot.
    pub messages: M,
    /// API settings.
    pub config: Arc<ApiConfig>,
    /// Which side of the render handoff this runs on.
    pub phase: RenderPhase,
}

impl<T, H, C, N, M> FetchEnvironment<T, H, C, N, M>
where
    T: HttpTransport + Clone,
    H: HydrationStore + Clone,
    C: CredentialSource + Clone,
    N: Navigator + Clone,
    M: MessageSink + Clone,
{
    /// Create a new fetch environment for the client phase.
    #[must_use]
    pub fn new(
        transport: T,
        hydration: H,
        credentials: C,
        navigator: N,
        messages: M,
        config: Arc<ApiConfig>,
    ) -> Self {
        Self {
            transport,
            hydration,
            credentials,
            navigator,
            messages,
            config,
            phase: RenderPhase::Client,
        }
    }

    /// Set the render phase.
    #[must_use]
    pub const fn with_phase(mut self, phase: RenderPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Request context with the current token.
    #[must_use]
    pub fn request_context(&self) -> RequestContext {
        self.config.request_context(self.credentials.token())
    }

    /// Navigation targets for the classifier.
    #[must_use]
    pub fn classifier_config(&self) -> ClassifierConfig {
        self.config.classifier_config()
    }
}

impl<T, H, C, N, M> std::fmt::Debug for FetchEnvironment<T, H, C, N, M>
where
    T: HttpTransport + Clone,
    H: HydrationStore + Clone,
    C: CredentialSource + Clone,
    N: Navigator + Clone,
    M: MessageSink + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchEnvironment")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
