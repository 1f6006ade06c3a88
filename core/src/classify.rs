//! Error classification and the navigation decision.
//!
//! Classification is a pure function of the failure:
//!
//! | status    | fallback message            | navigation            |
//! |-----------|-----------------------------|-----------------------|
//! | 400       | `error.bad-request`         | none                  |
//! | 401       | `error.unauthorized`        | configurable (none)   |
//! | 403       | `error.permission-denied`   | home, replace         |
//! | 404, 405  | `error.resource-not-found`  | home, replace         |
//! | other     | `error.unknown`             | none                  |
//!
//! When the error body matches [`ErrorEnvelope`], its `message` replaces the
//! fallback key. [`decide`] then turns a classification into an
//! [`ErrorOutcome`], applying the custom-handler and loop-guard rules.

use crate::environment::{NavigateOptions, NavigationTarget};
use crate::error::{ClassifiedError, Failure};
use serde::Deserialize;
use serde_json::Value;

/// Message keys used when the server gives no message.
pub mod messages {
    /// 400
    pub const BAD_REQUEST: &str = "error.bad-request";
    /// 401
    pub const UNAUTHORIZED: &str = "error.unauthorized";
    /// 403
    pub const PERMISSION_DENIED: &str = "error.permission-denied";
    /// 404 and 405
    pub const RESOURCE_NOT_FOUND: &str = "error.resource-not-found";
    /// Anything else
    pub const UNKNOWN: &str = "error.unknown";
}

/// Error body shape the API uses for failures.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorEnvelope {
    /// Numeric error code
    pub code: f64,
    /// Human-readable message
    pub message: String,
    /// Status text
    pub status: String,
}

impl ErrorEnvelope {
    /// Parse `body` as an envelope, `None` if it does not match.
    #[must_use]
    pub fn parse(body: Option<&Value>) -> Option<Self> {
        body.and_then(|value| Self::deserialize(value).ok())
    }
}

/// Where failures navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Target for 403/404/405
    pub home: NavigationTarget,
    /// Target for 401, `None` to stay put
    pub unauthorized_redirect: Option<NavigationTarget>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            home: NavigationTarget::path("/"),
            unauthorized_redirect: None,
        }
    }
}

/// A navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Destination
    pub target: NavigationTarget,
    /// Options
    pub options: NavigateOptions,
}

/// Result of classifying one failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The normalized error
    pub error: ClassifiedError,
    /// Suggested navigation
    pub navigation: Option<Navigation>,
}

/// Classify a failure.
///
/// ```
/// use pantry_core::classify::{classify, ClassifierConfig};
/// use pantry_core::environment::NavigationTarget;
/// use pantry_core::error::{Failure, TransportError};
///
/// let failure = Failure::Transport(TransportError::status(403, None, "Forbidden"));
/// let classification = classify(&failure, &ClassifierConfig::default());
///
/// assert_eq!(classification.error.message, "error.permission-denied");
/// assert_eq!(
///     classification.navigation.map(|n| n.target),
///     Some(NavigationTarget::path("/"))
/// );
/// ```
#[must_use]
pub fn classify(failure: &Failure, config: &ClassifierConfig) -> Classification {
    let raw = failure.raw_data();
    let envelope = match failure {
        Failure::Transport(error) => ErrorEnvelope::parse(error.body.as_ref()),
        Failure::ResponseValidation { .. } => None,
    };

    let home = || {
        Some(Navigation {
            target: config.home.clone(),
            options: NavigateOptions::replace(),
        })
    };

    let (fallback, navigation) = match failure.status() {
        Some(400) => (messages::BAD_REQUEST, None),
        Some(401) => (
            messages::UNAUTHORIZED,
            config.unauthorized_redirect.clone().map(|target| Navigation {
                target,
                options: NavigateOptions::replace(),
            }),
        ),
        Some(403) => (messages::PERMISSION_DENIED, home()),
        Some(404 | 405) => (messages::RESOURCE_NOT_FOUND, home()),
        _ => (messages::UNKNOWN, None),
    };

    let message = envelope
        .map(|envelope| envelope.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string());

    Classification {
        error: ClassifiedError {
            status_code: failure.status(),
            raw_error_data: raw,
            message,
            origin_from_schema: failure.is_schema(),
        },
        navigation,
    }
}

/// How the caller wants failures handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlingOptions {
    /// Skip default handling entirely
    pub skip_error: bool,
    /// A custom error handler takes over (navigation suppressed)
    pub has_custom_handler: bool,
}

/// What default handling does with a classified failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorOutcome {
    /// `skip_error` was set; nothing happens
    Skipped,
    /// Handed to the caller's handler; no navigation
    Delegated,
    /// Navigation target equals the current location; navigation cancelled
    LoopGuarded {
        /// The cancelled target
        target: NavigationTarget,
    },
    /// Navigate
    Navigate(Navigation),
    /// No navigation applies; the error is only published
    Reported,
}

/// Decide what default handling does.
#[must_use]
pub fn decide(
    classification: &Classification,
    current_path: &str,
    options: HandlingOptions,
) -> ErrorOutcome {
    if options.skip_error {
        return ErrorOutcome::Skipped;
    }
    if options.has_custom_handler {
        return ErrorOutcome::Delegated;
    }

    match &classification.navigation {
        Some(navigation) if navigation.target.is_location(current_path) => {
            ErrorOutcome::LoopGuarded {
                target: navigation.target.clone(),
            }
        },
        Some(navigation) => ErrorOutcome::Navigate(navigation.clone()),
        None => ErrorOutcome::Reported,
    }
}
