//! The fetch state machine.
//!
//! ```text
//! Idle ─Start─▶ (ValidationFailed | UrlFailed)       inputs rejected, fatal
//!           └─▶ DataReady                            hydration hit
//!           └─▶ Requesting ─Responded─▶ DataReady
//!                                   └─▶ RequestFailed ─Handled─▶ pending cleared
//! ```
//!
//! Validation and URL compilation run synchronously inside the `Start`
//! reduction ([`prepare`]), so their in-progress phases are never observable;
//! only their failure phases are.
//!
//! Every started request gets a new generation. A `Responded` action whose
//! generation is not the current one belongs to a superseded request and is
//! dropped.

use crate::environment::FetchEnvironment;
use crate::handling::{FetchOptions, apply_outcome, settle};
use pantry_core::cache_key::CacheKey;
use pantry_core::classify::{ErrorOutcome, classify, decide};
use pantry_core::effect::Effect;
use pantry_core::environment::{
    CredentialSource, HttpResponse, HttpTransport, HydrationStore, MessageSink, Navigator,
};
use pantry_core::error::{ClassifiedError, FetchError, TransportError};
use pantry_core::reducer::Reducer;
use pantry_core::registry::EndpointDefinition;
use pantry_core::request::{RequestDescriptor, RequestInputs, prepare};
use pantry_core::{SmallVec, smallvec};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Where a call site is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPhase {
    /// Nothing started yet
    #[default]
    Idle,
    /// An input failed its schema; no request was sent
    ValidationFailed,
    /// The URL template could not be filled; no request was sent
    UrlFailed,
    /// Waiting for the transport
    Requesting,
    /// Validated data is published
    DataReady,
    /// A classified error is published
    RequestFailed,
}

impl FetchPhase {
    /// Returns `true` for phases that end a request.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Idle | Self::Requesting)
    }

    /// Returns `true` for the phases that reject inputs before any I/O.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::ValidationFailed | Self::UrlFailed)
    }
}

/// The reactive triple exposed to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchResult {
    /// Validated response data
    pub data: Option<Value>,
    /// Classified error of the last attempt
    pub error: Option<ClassifiedError>,
    /// A request is in flight or its failure is being handled
    pub pending: bool,
}

/// State of one call site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchState {
    /// Lifecycle phase
    pub phase: FetchPhase,
    /// Published data
    pub data: Option<Value>,
    /// Published error
    pub error: Option<ClassifiedError>,
    /// In-flight flag
    pub pending: bool,
    /// Generation of the latest started request
    pub generation: u64,
    /// Descriptor of the latest accepted inputs
    pub descriptor: Option<RequestDescriptor>,
    /// Why the latest inputs were rejected
    pub fatal: Option<FetchError>,
    /// Default handling chosen for the latest failure
    pub outcome: Option<ErrorOutcome>,
}

impl FetchState {
    /// The published triple.
    #[must_use]
    pub fn result(&self) -> FetchResult {
        FetchResult {
            data: self.data.clone(),
            error: self.error.clone(),
            pending: self.pending,
        }
    }

    /// Cache key of the latest accepted inputs.
    #[must_use]
    pub fn cache_key(&self) -> Option<&CacheKey> {
        self.descriptor.as_ref().map(|descriptor| &descriptor.cache_key)
    }
}

/// Actions of the fetch state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchAction {
    /// Inputs were set or changed.
    ///
    /// Restarts only if the cache key differs from the current one, unless
    /// `refresh` is set. `refresh` also bypasses the hydration store.
    Start {
        /// Raw inputs
        inputs: RequestInputs,
        /// Restart unconditionally and skip hydration
        refresh: bool,
    },

    /// The transport answered (or failed).
    Responded {
        /// Generation the request was started with
        generation: u64,
        /// Transport result
        result: Result<HttpResponse, TransportError>,
    },

    /// Default handling of a failure finished.
    Handled {
        /// Generation of the failed request
        generation: u64,
    },
}

/// Reducer of one call site, bound to one endpoint.
///
/// # Type Parameters
///
/// Same as [`FetchEnvironment`].
#[derive(Clone)]
pub struct FetchReducer<T, H, C, N, M> {
    endpoint: Arc<EndpointDefinition>,
    options: FetchOptions,
    _phantom: std::marker::PhantomData<(T, H, C, N, M)>,
}

impl<T, H, C, N, M> FetchReducer<T, H, C, N, M> {
    /// Reducer for `endpoint`.
    #[must_use]
    pub const fn new(endpoint: Arc<EndpointDefinition>, options: FetchOptions) -> Self {
        Self {
            endpoint,
            options,
            _phantom: std::marker::PhantomData,
        }
    }

    /// The endpoint this reducer calls.
    #[must_use]
    pub const fn endpoint(&self) -> &Arc<EndpointDefinition> {
        &self.endpoint
    }
}

impl<T, H, C, N, M> std::fmt::Debug for FetchReducer<T, H, C, N, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchReducer")
            .field("endpoint", &self.endpoint.name())
            .field("options", &self.options)
            .finish()
    }
}

impl<T, H, C, N, M> FetchReducer<T, H, C, N, M>
where
    T: HttpTransport + Clone + 'static,
    H: HydrationStore + Clone + 'static,
    C: CredentialSource + Clone + 'static,
    N: Navigator + Clone + 'static,
    M: MessageSink + Clone + 'static,
{
    fn start(
        &self,
        state: &mut FetchState,
        inputs: &RequestInputs,
        refresh: bool,
        env: &FetchEnvironment<T, H, C, N, M>,
    ) -> SmallVec<[Effect<FetchAction>; 4]> {
        let descriptor = match prepare(&self.endpoint, inputs, &env.request_context()) {
            Ok(descriptor) => descriptor,
            Err(error) => {
                tracing::error!(endpoint = self.endpoint.name(), %error, "Inputs rejected");
                state.phase = match error {
                    FetchError::UrlCompilation(_) => FetchPhase::UrlFailed,
                    _ => FetchPhase::ValidationFailed,
                };
                // A rejected invocation still supersedes whatever is in flight.
                state.generation += 1;
                state.pending = false;
                state.descriptor = None;
                state.fatal = Some(error);
                return smallvec![Effect::None];
            },
        };
        state.fatal = None;

        let unchanged = state.cache_key() == Some(&descriptor.cache_key);
        if unchanged && !refresh {
            tracing::trace!(key = %descriptor.cache_key, "Cache key unchanged, not restarting");
            state.descriptor = Some(descriptor);
            return smallvec![Effect::None];
        }

        state.generation += 1;
        state.outcome = None;

        if !refresh {
            if let Some(value) = env.hydration.get(&descriptor.cache_key) {
                tracing::debug!(
                    endpoint = self.endpoint.name(),
                    key = %descriptor.cache_key,
                    "Serving hydrated value"
                );
                state.phase = FetchPhase::DataReady;
                state.data = Some(value);
                state.error = None;
                state.pending = false;
                state.descriptor = Some(descriptor);
                return smallvec![Effect::None];
            }
        }

        let generation = state.generation;
        let transport = env.transport.clone();
        let request = descriptor.to_http_request();
        tracing::debug!(
            endpoint = self.endpoint.name(),
            method = %request.method,
            url = %request.full_url(),
            generation,
            "Requesting"
        );

        state.phase = FetchPhase::Requesting;
        state.pending = true;
        state.descriptor = Some(descriptor);

        smallvec![Effect::Future(Box::pin(async move {
            let result = transport.execute(request).await;
            Some(FetchAction::Responded { generation, result })
        }))]
    }

    fn respond(
        &self,
        state: &mut FetchState,
        generation: u64,
        result: Result<HttpResponse, TransportError>,
        env: &FetchEnvironment<T, H, C, N, M>,
    ) -> SmallVec<[Effect<FetchAction>; 4]> {
        if generation != state.generation {
            tracing::debug!(
                endpoint = self.endpoint.name(),
                generation,
                current = state.generation,
                "Discarding stale response"
            );
            return smallvec![Effect::None];
        }
        let Some(key) = state.cache_key().cloned() else {
            return smallvec![Effect::None];
        };

        let failure = match settle(&self.endpoint, result) {
            Ok(value) => {
                state.phase = FetchPhase::DataReady;
                state.data = Some(value.clone());
                state.error = None;
                state.pending = false;

                let hydration = env.hydration.clone();
                return smallvec![Effect::Future(Box::pin(async move {
                    hydration.insert(key, value);
                    None
                }))];
            },
            Err(failure) => failure,
        };

        let classification = classify(&failure, &env.classifier_config());
        let outcome = decide(
            &classification,
            &env.navigator.current_path(),
            self.options.handling(),
        );

        state.phase = FetchPhase::RequestFailed;
        state.data = None;
        state.error = Some(classification.error.clone());
        state.outcome = Some(outcome.clone());
        // pending stays set until default handling has run

        let error = classification.error;
        let handler = self.options.error_handler.clone();
        let navigator = env.navigator.clone();
        let messages = env.messages.clone();
        let phase = env.phase;

        smallvec![Effect::Future(Box::pin(async move {
            apply_outcome(&outcome, &error, handler.as_ref(), &navigator, &messages, phase).await;
            Some(FetchAction::Handled { generation })
        }))]
    }
}

impl<T, H, C, N, M> Reducer for FetchReducer<T, H, C, N, M>
where
    T: HttpTransport + Clone + 'static,
    H: HydrationStore + Clone + 'static,
    C: CredentialSource + Clone + 'static,
    N: Navigator + Clone + 'static,
    M: MessageSink + Clone + 'static,
{
    type State = FetchState;
    type Action = FetchAction;
    type Environment = FetchEnvironment<T, H, C, N, M>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FetchAction::Start { inputs, refresh } => self.start(state, &inputs, refresh, env),
            FetchAction::Responded { generation, result } => {
                self.respond(state, generation, result, env)
            },
            FetchAction::Handled { generation } => {
                if generation == state.generation {
                    state.pending = false;
                }
                smallvec![Effect::None]
            },
        }
    }
}
