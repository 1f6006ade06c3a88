//! The per-call-site handle.
//!
//! [`use_api`] binds one endpoint to a [`Store`] running the
//! [`FetchReducer`], starts the first request and returns a [`UseApi`]
//! handle. Setting inputs on the handle recomputes the request and restarts
//! it only when the cache key changed; [`UseApi::refresh`] always restarts.
//! Dropping the handle closes the store, so late results are dropped.

use crate::environment::FetchEnvironment;
use crate::handling::FetchOptions;
use crate::reducer::{FetchAction, FetchPhase, FetchReducer, FetchResult, FetchState};
use pantry_core::cache_key::CacheKey;
use pantry_core::classify::ErrorOutcome;
use pantry_core::environment::{
    CredentialSource, HttpTransport, HydrationStore, MessageSink, Navigator,
};
use pantry_core::error::{FetchError, Slot};
use pantry_core::registry::{ApiRegistry, Endpoint};
use pantry_core::request::{RequestInputs, to_slot_value};
use pantry_runtime::Store;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tokio::sync::watch;

type FetchStore<T, H, C, N, M> =
    Store<FetchState, FetchAction, FetchEnvironment<T, H, C, N, M>, FetchReducer<T, H, C, N, M>>;

/// Reactive handle of one call site.
pub struct UseApi<T, H, C, N, M>
where
    T: HttpTransport + Clone + 'static,
    H: HydrationStore + Clone + 'static,
    C: CredentialSource + Clone + 'static,
    N: Navigator + Clone + 'static,
    M: MessageSink + Clone + 'static,
{
    store: FetchStore<T, H, C, N, M>,
    inputs: RequestInputs,
    result: watch::Receiver<FetchResult>,
}

/// Call the endpoint registered as `name` and keep its result up to date.
///
/// # Errors
///
/// Returns the fatal [`FetchError`] (unknown endpoint, invalid inputs,
/// uncompilable URL) synchronously. Runtime failures are classified and
/// published on the handle instead.
#[tracing::instrument(skip(registry, inputs, env, options))]
pub async fn use_api<T, H, C, N, M>(
    registry: &ApiRegistry,
    name: &str,
    inputs: RequestInputs,
    env: FetchEnvironment<T, H, C, N, M>,
    options: FetchOptions,
) -> Result<UseApi<T, H, C, N, M>, FetchError>
where
    T: HttpTransport + Clone + 'static,
    H: HydrationStore + Clone + 'static,
    C: CredentialSource + Clone + 'static,
    N: Navigator + Clone + 'static,
    M: MessageSink + Clone + 'static,
{
    let endpoint = registry.lookup(name).inspect_err(|e| tracing::error!("{e}"))?;
    let store = Store::new(
        FetchState::default(),
        FetchReducer::new(endpoint, options),
        env,
    );
    let result = store.observe(FetchState::result).await;

    let api = UseApi {
        store,
        inputs,
        result,
    };
    api.start(false).await?;
    Ok(api)
}

/// [`use_api`] for a typed [`Endpoint`].
///
/// # Errors
///
/// Same as [`use_api`], plus [`FetchError::InvalidInput`] when an input
/// cannot be serialized.
pub async fn use_endpoint<E, T, H, C, N, M>(
    registry: &ApiRegistry,
    path_params: &E::PathParams,
    query: &E::Query,
    payload: &E::Payload,
    env: FetchEnvironment<T, H, C, N, M>,
    options: FetchOptions,
) -> Result<UseApi<T, H, C, N, M>, FetchError>
where
    E: Endpoint,
    T: HttpTransport + Clone + 'static,
    H: HydrationStore + Clone + 'static,
    C: CredentialSource + Clone + 'static,
    N: Navigator + Clone + 'static,
    M: MessageSink + Clone + 'static,
{
    let inputs = endpoint_inputs::<E>(path_params, query, payload)?;
    use_api(registry, E::NAME, inputs, env, options).await
}

/// Raw inputs from the typed inputs of `E`.
///
/// # Errors
///
/// Returns [`FetchError::InvalidInput`] when an input cannot be serialized.
pub fn endpoint_inputs<E: Endpoint>(
    path_params: &E::PathParams,
    query: &E::Query,
    payload: &E::Payload,
) -> Result<RequestInputs, FetchError> {
    RequestInputs::new()
        .with_path_params(path_params)?
        .with_query(query)?
        .with_payload(payload)
}

impl<T, H, C, N, M> UseApi<T, H, C, N, M>
where
    T: HttpTransport + Clone + 'static,
    H: HydrationStore + Clone + 'static,
    C: CredentialSource + Clone + 'static,
    N: Navigator + Clone + 'static,
    M: MessageSink + Clone + 'static,
{
    /// Current data, error and pending flag.
    #[must_use]
    pub fn result(&self) -> FetchResult {
        self.result.borrow().clone()
    }

    /// Receiver updated whenever the result changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FetchResult> {
        self.result.clone()
    }

    /// Wait until no request is pending and return the result.
    pub async fn wait(&self) -> FetchResult {
        let mut result = self.result.clone();
        let settled = result.wait_for(|r| !r.pending).await.map(|r| r.clone());
        settled.unwrap_or_else(|_| self.result())
    }

    /// Current data deserialized as `R`.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the data does not fit `R`.
    pub fn data_as<R: DeserializeOwned>(&self) -> Result<Option<R>, serde_json::Error> {
        self.result
            .borrow()
            .data
            .clone()
            .map(serde_json::from_value::<R>)
            .transpose()
    }

    /// Lifecycle phase.
    pub async fn phase(&self) -> FetchPhase {
        self.store.state(|s| s.phase).await
    }

    /// Cache key of the current inputs.
    pub async fn cache_key(&self) -> Option<CacheKey> {
        self.store.state(|s| s.cache_key().cloned()).await
    }

    /// Default handling chosen for the latest failure.
    pub async fn outcome(&self) -> Option<ErrorOutcome> {
        self.store.state(|s| s.outcome.clone()).await
    }

    /// Current raw inputs.
    #[must_use]
    pub const fn inputs(&self) -> &RequestInputs {
        &self.inputs
    }

    /// Replace the path parameters. Returns `true` if a new request started.
    ///
    /// # Errors
    ///
    /// Returns fatal [`FetchError`]s like [`use_api`].
    pub async fn set_path_params<P>(&mut self, path_params: &P) -> Result<bool, FetchError>
    where
        P: Serialize + ?Sized,
    {
        self.inputs.path_params = to_slot_value(Slot::PathParams, path_params)?;
        self.start(false).await
    }

    /// Replace the query. Returns `true` if a new request started.
    ///
    /// # Errors
    ///
    /// Returns fatal [`FetchError`]s like [`use_api`].
    pub async fn set_query<Q>(&mut self, query: &Q) -> Result<bool, FetchError>
    where
        Q: Serialize + ?Sized,
    {
        self.inputs.query = to_slot_value(Slot::Query, query)?;
        self.start(false).await
    }

    /// Replace the payload. Returns `true` if a new request started.
    ///
    /// # Errors
    ///
    /// Returns fatal [`FetchError`]s like [`use_api`].
    pub async fn set_payload<P>(&mut self, payload: &P) -> Result<bool, FetchError>
    where
        P: Serialize + ?Sized,
    {
        self.inputs.payload = to_slot_value(Slot::Payload, payload)?;
        self.start(false).await
    }

    /// Replace the caller headers. Returns `true` if a new request started.
    ///
    /// # Errors
    ///
    /// Returns fatal [`FetchError`]s like [`use_api`].
    pub async fn set_headers(
        &mut self,
        headers: BTreeMap<String, String>,
    ) -> Result<bool, FetchError> {
        self.inputs.headers = headers;
        self.start(false).await
    }

    /// Send the request again, ignoring hydrated values.
    ///
    /// # Errors
    ///
    /// Returns fatal [`FetchError`]s like [`use_api`].
    pub async fn refresh(&self) -> Result<(), FetchError> {
        self.start(true).await.map(|_| ())
    }

    async fn start(&self, refresh: bool) -> Result<bool, FetchError> {
        let before = self.store.state(|s| s.generation).await;

        let action = FetchAction::Start {
            inputs: self.inputs.clone(),
            refresh,
        };
        if let Err(e) = self.store.send(action).await {
            tracing::warn!(error = %e, "Inputs not applied");
            return Ok(false);
        }

        let (fatal, generation) = self
            .store
            .state(|s| (s.fatal.clone(), s.generation))
            .await;
        match fatal {
            Some(error) => Err(error),
            None => Ok(generation != before),
        }
    }
}

impl<T, H, C, N, M> Drop for UseApi<T, H, C, N, M>
where
    T: HttpTransport + Clone + 'static,
    H: HydrationStore + Clone + 'static,
    C: CredentialSource + Clone + 'static,
    N: Navigator + Clone + 'static,
    M: MessageSink + Clone + 'static,
{
    fn drop(&mut self) {
        self.store.close();
    }
}

impl<T, H, C, N, M> std::fmt::Debug for UseApi<T, H, C, N, M>
where
    T: HttpTransport + Clone + 'static,
    H: HydrationStore + Clone + 'static,
    C: CredentialSource + Clone + 'static,
    N: Navigator + Clone + 'static,
    M: MessageSink + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UseApi")
            .field("inputs", &self.inputs)
            .field("result", &*self.result.borrow())
            .finish_non_exhaustive()
    }
}
