//! # Pantry Testing
//!
//! Testing utilities for Pantry:
//!
//! - Mock implementations of the environment traits ([`mocks`])
//! - [`ReducerTest`], a Given-When-Then helper for reducers
//! - [`init_test_tracing`] to see logs in failing tests
//!
//! ## Example
//!
//! ```ignore
//! use pantry_testing::mocks::{MockTransport, RecordingNavigator};
//!
//! #[tokio::test]
//! async fn test_forbidden_goes_home() {
//!     let transport = MockTransport::new();
//!     transport.push_json(403, json!({}));
//!     let navigator = RecordingNavigator::at("/recipes");
//!
//!     // ... run a fetch against them ...
//!
//!     assert_eq!(navigator.current_path(), "/");
//! }
//! ```

pub mod mocks;
pub mod reducer_test;

pub use mocks::{
    MemoryHydrationStore, MockTransport, RecordingErrorHandler, RecordingMessageSink,
    RecordingNavigator, StaticCredential,
};
pub use reducer_test::ReducerTest;

/// Install a test-friendly subscriber (captured output, `RUST_LOG` or `debug`).
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .is_err()
    {
        tracing::trace!("Test subscriber already installed");
    }
}
