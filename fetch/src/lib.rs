//! # Pantry Fetch
//!
//! `useApi`: call a registered endpoint with typed, schema-validated inputs
//! and get a reactive `{ data, error, pending }` result back.
//!
//! ## Pipeline
//!
//! ```text
//! inputs ─▶ validate ─▶ compile URL ─▶ cache key ─▶ hydration? ─▶ transport
//!                                                                   │
//!            published result ◀─ classify + handle ◀─ validate ◀────┘
//! ```
//!
//! - Caller bugs (unknown endpoint, inputs failing their schema, unfillable
//!   URL templates) are returned synchronously as fatal [`FetchError`]s.
//! - Runtime failures (network, HTTP status, response failing its schema) are
//!   classified and published on the result. 403/404/405 navigate home,
//!   unless the caller handles errors itself or default handling is skipped.
//! - Only the latest request of a call site is ever published.
//!
//! ## Example
//!
//! ```ignore
//! use pantry_fetch::{use_api, ApiConfig, FetchEnvironment, FetchOptions};
//! use pantry_core::RequestInputs;
//!
//! let env = FetchEnvironment::new(transport, hydration, token, navigator, messages, config);
//! let inputs = RequestInputs::new().with_path_params(&IngredientId { id: 9266 })?;
//!
//! let info = use_api(registry, "getIngredientInfo", inputs, env, FetchOptions::new()).await?;
//! let result = info.wait().await;
//! ```

pub mod config;
pub mod environment;
pub mod fetch_once;
pub mod handling;
pub mod reducer;
pub mod use_api;

pub use config::{ApiConfig, ConfigError};
pub use environment::FetchEnvironment;
pub use fetch_once::{fetch_endpoint, fetch_once};
pub use handling::{ErrorHandler, FetchOptions};
pub use pantry_core::error::FetchError;
pub use reducer::{FetchAction, FetchPhase, FetchReducer, FetchResult, FetchState};
pub use use_api::{UseApi, endpoint_inputs, use_api, use_endpoint};
