//! One-shot fetching.
//!
//! The same pipeline as [`use_api`](crate::use_api) without a store: no
//! reactive result, no hydration, no restarts. Useful in event handlers
//! (form submissions, button clicks) where the caller awaits the outcome.

use crate::environment::FetchEnvironment;
use crate::handling::{FetchOptions, apply_outcome, settle};
use pantry_core::classify::{classify, decide};
use pantry_core::environment::{
    CredentialSource, HttpTransport, HydrationStore, MessageSink, Navigator,
};
use pantry_core::error::FetchError;
use pantry_core::registry::{ApiRegistry, Endpoint};
use pantry_core::request::{RequestInputs, prepare};
use serde_json::Value;

/// Call the endpoint registered as `name` once.
///
/// Failures go through default handling (handler, message, navigation) before
/// being returned as [`FetchError::Classified`]. With `skip_error` nothing is
/// handled and the raw [`FetchError::Transport`] or
/// [`FetchError::ResponseValidation`] is returned.
///
/// # Errors
///
/// Returns fatal errors before any I/O and runtime failures as described above.
#[tracing::instrument(skip(registry, inputs, env, options))]
pub async fn fetch_once<T, H, C, N, M>(
    registry: &ApiRegistry,
    name: &str,
    inputs: &RequestInputs,
    env: &FetchEnvironment<T, H, C, N, M>,
    options: &FetchOptions,
) -> Result<Value, FetchError>
where
    T: HttpTransport + Clone,
    H: HydrationStore + Clone,
    C: CredentialSource + Clone,
    N: Navigator + Clone,
    M: MessageSink + Clone,
{
    let endpoint = registry.lookup(name)?;
    let descriptor = prepare(&endpoint, inputs, &env.request_context())?;

    let result = env.transport.execute(descriptor.to_http_request()).await;
    let failure = match settle(&endpoint, result) {
        Ok(value) => return Ok(value),
        Err(failure) => failure,
    };

    if options.skip_error {
        return Err(failure.into());
    }

    let classification = classify(&failure, &env.classifier_config());
    let outcome = decide(
        &classification,
        &env.navigator.current_path(),
        options.handling(),
    );
    apply_outcome(
        &outcome,
        &classification.error,
        options.error_handler.as_ref(),
        &env.navigator,
        &env.messages,
        env.phase,
    )
    .await;

    Err(FetchError::Classified(classification.error))
}

/// [`fetch_once`] for a typed [`Endpoint`], deserializing the response.
///
/// # Errors
///
/// Same as [`fetch_once`], plus [`FetchError::Deserialize`] when the
/// validated body does not fit `E::Response`.
pub async fn fetch_endpoint<E, T, H, C, N, M>(
    registry: &ApiRegistry,
    path_params: &E::PathParams,
    query: &E::Query,
    payload: &E::Payload,
    env: &FetchEnvironment<T, H, C, N, M>,
    options: &FetchOptions,
) -> Result<E::Response, FetchError>
where
    E: Endpoint,
    T: HttpTransport + Clone,
    H: HydrationStore + Clone,
    C: CredentialSource + Clone,
    N: Navigator + Clone,
    M: MessageSink + Clone,
{
    let inputs = crate::use_api::endpoint_inputs::<E>(path_params, query, payload)?;
    let value = fetch_once(registry, E::NAME, &inputs, env, options).await?;

    serde_json::from_value(value).map_err(|e| FetchError::Deserialize {
        endpoint: E::NAME.to_string(),
        message: e.to_string(),
    })
}
