//! Default failure handling.
//!
//! After a failed attempt is classified and [`decide`](pantry_core::decide)
//! picked an [`ErrorOutcome`], [`apply_outcome`] carries it out: hand the
//! error to the caller's handler, or store the message for the client and
//! navigate, or just log.

use pantry_core::classify::{ErrorOutcome, HandlingOptions};
use pantry_core::environment::{HttpResponse, MessageKind, MessageSink, Navigator, RenderPhase};
use pantry_core::error::{ClassifiedError, Failure, TransportError};
use pantry_core::registry::EndpointDefinition;
use pantry_core::validation::validate_response;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied error handler. When present, navigation is suppressed.
pub type ErrorHandler = Arc<dyn Fn(&ClassifiedError) + Send + Sync>;

/// Per-call options.
#[derive(Clone, Default)]
pub struct FetchOptions {
    /// Skip default handling; the error is still published
    pub skip_error: bool,
    /// Custom handler replacing navigation
    pub error_handler: Option<ErrorHandler>,
}

impl FetchOptions {
    /// Options with default handling.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip default handling.
    #[must_use]
    pub const fn skip_error(mut self) -> Self {
        self.skip_error = true;
        self
    }

    /// Handle failures with `handler` instead of navigating.
    #[must_use]
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ClassifiedError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// The flags [`decide`](pantry_core::decide) needs.
    #[must_use]
    pub const fn handling(&self) -> HandlingOptions {
        HandlingOptions {
            skip_error: self.skip_error,
            has_custom_handler: self.error_handler.is_some(),
        }
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("skip_error", &self.skip_error)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

/// Validate a transport result against the endpoint's response schema.
///
/// # Errors
///
/// Returns the [`Failure`] to classify.
pub fn settle(
    endpoint: &EndpointDefinition,
    result: Result<HttpResponse, TransportError>,
) -> Result<Value, Failure> {
    match result {
        Ok(response) => validate_response(endpoint, response.body).map_err(|error| {
            tracing::error!(
                endpoint = endpoint.name(),
                status = response.status,
                path = %error.path(),
                "{error}"
            );
            Failure::ResponseValidation {
                status: response.status,
                error,
            }
        }),
        Err(error) => {
            tracing::error!(endpoint = endpoint.name(), status = ?error.status, "{error}");
            Err(Failure::Transport(error))
        },
    }
}

/// Carry out `outcome` for `error`.
///
/// On [`ErrorOutcome::Navigate`] during server rendering the message is left
/// in the cross-phase slot first, so the client can show it after the
/// redirect.
pub async fn apply_outcome<N, M>(
    outcome: &ErrorOutcome,
    error: &ClassifiedError,
    handler: Option<&ErrorHandler>,
    navigator: &N,
    messages: &M,
    phase: RenderPhase,
) where
    N: Navigator,
    M: MessageSink,
{
    match outcome {
        ErrorOutcome::Skipped => {
            tracing::debug!(status = ?error.status_code, "Default error handling skipped");
        },
        ErrorOutcome::Delegated => {
            if let Some(handler) = handler {
                handler(error);
            }
        },
        ErrorOutcome::LoopGuarded { target } => {
            tracing::warn!(destination = %target, "Navigation target is the current location, staying put");
        },
        ErrorOutcome::Navigate(navigation) => {
            if phase == RenderPhase::Server {
                messages.set_message(MessageKind::Error, &error.message);
            }
            tracing::info!(
                destination = %navigation.target,
                replace = navigation.options.replace,
                status = ?error.status_code,
                "Navigating after failed request"
            );
            navigator.navigate_to(&navigation.target, navigation.options).await;
        },
        ErrorOutcome::Reported => {
            tracing::debug!(status = ?error.status_code, text = %error.message, "Error published");
        },
    }
}
