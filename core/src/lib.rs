//! # Pantry Core
//!
//! Core traits and types for typed, schema-validated API fetching.
//!
//! This crate is the functional core of Pantry. Everything in here is pure
//! (no I/O); side effects are described as [`effect::Effect`] values and
//! executed by the `pantry-runtime` Store.
//!
//! ## Core Concepts
//!
//! - **Endpoint**: a named, statically registered HTTP operation
//!   ([`registry::EndpointDefinition`]) with a URL template and schemas
//! - **Schema**: structural validation of path params, query, payload and
//!   response bodies ([`schema::Schema`])
//! - **Request descriptor**: the per-call value produced by
//!   [`request::prepare`] (validated inputs, compiled URL, cache key)
//! - **Classified error**: a normalized failure with a user-facing message
//!   and an optional navigation target ([`classify`])
//! - **Reducer / Effect / Environment**: the same state-machine plumbing the
//!   fetch orchestrator is built on
//!
//! ## Example
//!
//! ```
//! use pantry_core::registry::{ApiRegistry, EndpointDefinition, HttpMethod};
//! use pantry_core::request::{prepare, RequestContext, RequestInputs};
//! use pantry_core::schema::Schema;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ApiRegistry::builder()
//!     .register(
//!         EndpointDefinition::new(
//!             "getProfile",
//!             HttpMethod::Get,
//!             "/users/:id/profile",
//!             Schema::object([("name", Schema::string())]),
//!         )
//!         .with_path_params(Schema::object([("id", Schema::integer())])),
//!     )?
//!     .build();
//!
//! let endpoint = registry.lookup("getProfile")?;
//! let inputs = RequestInputs::new().with_path_params(&json!({ "id": 7 }))?;
//! let descriptor = prepare(&endpoint, &inputs, &RequestContext::new("https://api.example.com"))?;
//!
//! assert_eq!(descriptor.url, "/users/7/profile");
//! # Ok(())
//! # }
//! ```

pub use smallvec::{SmallVec, smallvec};

pub mod cache_key;
pub mod classify;
pub mod environment;
pub mod error;
pub mod registry;
pub mod request;
pub mod schema;
pub mod url;
pub mod validation;

pub use cache_key::{CacheKey, KeyInputs, derive_key};
pub use classify::{Classification, ClassifierConfig, ErrorOutcome, classify, decide};
pub use error::{ClassifiedError, FetchError, Failure, Slot, TransportError, ValidationError};
pub use registry::{ApiRegistry, Endpoint, EndpointDefinition, HttpMethod, RegistryError};
pub use request::{RequestContext, RequestDescriptor, RequestInputs, prepare};
pub use schema::Schema;

/// State machines.
///
/// A reducer decides: given the current state and an action, it mutates the
/// state and describes the side effects to run. It performs no I/O itself,
/// which is what makes the fetch state machine testable without a network.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// A state machine over `State`, driven by `Action`s.
    ///
    /// ```ignore
    /// impl Reducer for FetchReducer<T, H, C, N, M> {
    ///     type State = FetchState;
    ///     type Action = FetchAction;
    ///     type Environment = FetchEnvironment<T, H, C, N, M>;
    ///
    ///     fn reduce(&self, state: &mut FetchState, action: FetchAction, env: &Self::Environment)
    ///         -> SmallVec<[Effect<FetchAction>; 4]>
    ///     {
    ///         match action {
    ///             FetchAction::Start { inputs, refresh } => { /* prepare, maybe request */ }
    ///             // ...
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// State owned by the store
        type State;

        /// Inputs of the machine, including effect results
        type Action;

        /// Injected collaborators
        type Environment;

        /// Apply `action` to `state` and return the effects to run.
        ///
        /// Most actions produce a single effect, hence the inline capacity.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Side effects as values.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Work for the store to run after a reduction.
    ///
    /// An effect may produce one follow-up action, which the store feeds back
    /// into the reducer (a transport effect yields `Responded`, for example).
    pub enum Effect<Action> {
        /// Nothing to do
        None,

        /// Children started together
        Parallel(Vec<Effect<Action>>),

        /// Children run one after another
        Sequential(Vec<Effect<Action>>),

        /// Async work, optionally yielding a follow-up action
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::None => f.write_str("None"),
                Self::Parallel(children) => f.debug_tuple("Parallel").field(children).finish(),
                Self::Sequential(children) => f.debug_tuple("Sequential").field(children).finish(),
                Self::Future(_) => f.write_str("Future(..)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Run `effects` together.
        #[must_use]
        pub const fn merge(effects: Vec<Self>) -> Self {
            Self::Parallel(effects)
        }

        /// Run `effects` in order.
        #[must_use]
        pub const fn chain(effects: Vec<Self>) -> Self {
            Self::Sequential(effects)
        }

        /// Returns `true` for [`Effect::None`].
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Self::None)
        }
    }
}
