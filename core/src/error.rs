//! Error types for API fetching.
//!
//! The taxonomy splits into two families:
//!
//! - **Fatal** errors are caller bugs and surface synchronously, before any
//!   network I/O: [`FetchError::UnknownEndpoint`], [`FetchError::InvalidInput`],
//!   [`FetchError::RequestValidation`], [`FetchError::UrlCompilation`].
//! - **Runtime failures** come back from the server or the network
//!   ([`FetchError::Transport`], [`FetchError::ResponseValidation`]). They are
//!   classified into a [`ClassifiedError`] and published on the same channel
//!   as data; they are never retried.

use crate::schema::{FieldPath, SchemaIssue};
use crate::url::UrlCompileError;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

/// Which part of a request or response a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    /// URL path parameters
    PathParams,
    /// Query string
    Query,
    /// Request body
    Payload,
    /// Response body
    Response,
}

impl Slot {
    /// Name used in messages (`pathParams`, `query`, `payload`, `response`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PathParams => "pathParams",
            Self::Query => "query",
            Self::Payload => "payload",
            Self::Response => "response",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value failed its endpoint's schema.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[useApi] {message} ({issue})")]
pub struct ValidationError {
    /// Endpoint name
    pub endpoint: String,
    /// Slot that failed
    pub slot: Slot,
    /// First mismatch found
    pub issue: SchemaIssue,
    /// The whole raw value of the slot
    pub raw: Option<Value>,
    /// Human-readable message naming the endpoint and slot
    pub message: String,
}

impl ValidationError {
    /// Build a validation error with the standard message for `slot`.
    #[must_use]
    pub fn new(endpoint: &str, slot: Slot, issue: SchemaIssue, raw: Option<Value>) -> Self {
        let message = match slot {
            Slot::Response => format!("Failed to parse \"{endpoint}\" API response: {issue}"),
            _ => format!("Failed to call \"{endpoint}\" API: parsing {slot} object error."),
        };

        Self {
            endpoint: endpoint.to_string(),
            slot,
            issue,
            raw,
            message,
        }
    }

    /// Path of the offending field.
    #[must_use]
    pub const fn path(&self) -> &FieldPath {
        &self.issue.path
    }

    /// The offending value, `None` if it was missing.
    #[must_use]
    pub const fn offending_value(&self) -> Option<&Value> {
        self.issue.value.as_ref()
    }

    /// JSON rendering, used as the raw data of a classified error.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "endpoint": self.endpoint,
            "slot": self.slot,
            "path": self.issue.path.to_string(),
            "expected": self.issue.expected,
            "received": self.issue.received,
            "message": self.message,
            "data": self.raw,
        })
    }
}

/// The transport failed, or the server answered with a non-success status.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status, `None` when no response was received
    pub status: Option<u16>,
    /// Response body, parsed as JSON when possible (otherwise a JSON string)
    pub body: Option<Value>,
    /// Description of the failure
    pub message: String,
}

impl TransportError {
    /// A failure without any response (DNS, connection refused, ...).
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// A non-success HTTP response.
    #[must_use]
    pub fn status(status: u16, body: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body,
            message: message.into(),
        }
    }
}

/// A runtime failure ready for classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// Network or HTTP failure
    Transport(TransportError),
    /// The server answered but the body did not match the response schema
    ResponseValidation {
        /// HTTP status of the response that failed validation
        status: u16,
        /// The validation failure
        error: ValidationError,
    },
}

impl Failure {
    /// HTTP status, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(error) => error.status,
            Self::ResponseValidation { status, .. } => Some(*status),
        }
    }

    /// Raw error data: the transport body, or the validation report.
    #[must_use]
    pub fn raw_data(&self) -> Option<Value> {
        match self {
            Self::Transport(error) => error.body.clone(),
            Self::ResponseValidation { error, .. } => Some(error.to_json()),
        }
    }

    /// Returns `true` when the failure came from response validation.
    #[must_use]
    pub const fn is_schema(&self) -> bool {
        matches!(self, Self::ResponseValidation { .. })
    }
}

impl From<TransportError> for Failure {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<Failure> for FetchError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Transport(error) => Self::Transport(error),
            Failure::ResponseValidation { error, .. } => Self::ResponseValidation(error),
        }
    }
}

/// A normalized failure, as published to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ClassifiedError {
    /// HTTP status, `None` for network failures
    pub status_code: Option<u16>,
    /// Raw error body or validation report
    pub raw_error_data: Option<Value>,
    /// User-facing message or message key (`error.unknown`, ...)
    pub message: String,
    /// `true` when the response failed schema validation
    pub origin_from_schema: bool,
}

/// Errors produced by the fetch pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// No endpoint is registered under this name.
    #[error("[useApi] Unknown API endpoint \"{name}\"")]
    UnknownEndpoint {
        /// Requested name
        name: String,
    },

    /// A request input could not be turned into JSON.
    #[error("[useApi] Failed to serialize {slot} input: {message}")]
    InvalidInput {
        /// Slot of the input
        slot: Slot,
        /// Serializer message
        message: String,
    },

    /// A request input failed its schema.
    #[error(transparent)]
    RequestValidation(ValidationError),

    /// The URL template could not be compiled.
    #[error(transparent)]
    UrlCompilation(#[from] UrlCompileError),

    /// The response body failed its schema.
    #[error(transparent)]
    ResponseValidation(ValidationError),

    /// Network or HTTP failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A runtime failure after classification and default handling.
    #[error(transparent)]
    Classified(#[from] ClassifiedError),

    /// A validated response did not fit the caller's Rust type.
    #[error("[useApi] Failed to deserialize \"{endpoint}\" response: {message}")]
    Deserialize {
        /// Endpoint name
        endpoint: String,
        /// Deserializer message
        message: String,
    },
}

impl FetchError {
    /// Returns `true` for caller bugs that are raised before any I/O.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pantry_core::FetchError;
    /// assert!(FetchError::UnknownEndpoint { name: "nope".into() }.is_fatal());
    /// ```
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownEndpoint { .. }
                | Self::InvalidInput { .. }
                | Self::RequestValidation(_)
                | Self::UrlCompilation(_)
        )
    }

    /// The classified error, if this is one.
    #[must_use]
    pub const fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Classified(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    fn issue() -> SchemaIssue {
        Schema::object([("query", Schema::string())])
            .validate(Some(&json!({ "query": 1 })))
            .unwrap_err()
    }

    #[test]
    fn test_request_slot_message_names_endpoint_and_slot() {
        let error = ValidationError::new("searchIngredient", Slot::Query, issue(), None);
        assert_eq!(
            error.message,
            "Failed to call \"searchIngredient\" API: parsing query object error."
        );
        assert_eq!(error.path().to_string(), "query");
        assert_eq!(error.offending_value(), Some(&json!(1)));
    }

    #[test]
    fn test_response_slot_message_includes_issue() {
        let error = ValidationError::new("getIngredientInfo", Slot::Response, issue(), None);
        assert!(error.message.starts_with("Failed to parse \"getIngredientInfo\" API response"));
        assert!(error.message.contains("expected string, received number"));
    }

    #[test]
    fn test_fatal_split() {
        let validation = ValidationError::new("x", Slot::Payload, issue(), None);
        assert!(FetchError::RequestValidation(validation.clone()).is_fatal());
        assert!(!FetchError::ResponseValidation(validation).is_fatal());
        assert!(!FetchError::Transport(TransportError::network("offline")).is_fatal());
    }

    #[test]
    fn test_failure_raw_data() {
        let failure = Failure::Transport(TransportError::status(
            404,
            Some(json!({ "message": "gone" })),
            "Not Found",
        ));
        assert_eq!(failure.status(), Some(404));
        assert_eq!(failure.raw_data(), Some(json!({ "message": "gone" })));
        assert!(!failure.is_schema());

        let validation = ValidationError::new("x", Slot::Response, issue(), Some(json!({})));
        let failure = Failure::ResponseValidation { status: 200, error: validation };
        assert!(failure.is_schema());
        assert_eq!(failure.raw_data().unwrap()["path"], json!("query"));
    }
}
