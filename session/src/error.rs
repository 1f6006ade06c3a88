//! Error types for session state.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised while reading or writing session cookies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A value could not be encoded as JSON.
    #[error("Failed to encode cookie \"{name}\": {message}")]
    Encode {
        /// Cookie name
        name: String,
        /// Serializer message
        message: String,
    },

    /// A cookie held something other than the expected JSON.
    #[error("Failed to decode cookie \"{name}\": {message}")]
    Decode {
        /// Cookie name
        name: String,
        /// Parser message
        message: String,
    },
}
