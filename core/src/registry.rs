//! Endpoint definitions and the registry that holds them.
//!
//! A registry is assembled once at start-up with [`ApiRegistry::builder`] and
//! is immutable afterwards. Registration checks the invariants a definition
//! must satisfy so that misconfiguration fails at start-up rather than on the
//! first request:
//!
//! - names are unique,
//! - a dynamic URL template has a path-params schema,
//! - every placeholder is a declared field of that schema.

use crate::error::{FetchError, Slot};
use crate::schema::Schema;
use crate::url::placeholders;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// CONNECT
    Connect,
    /// OPTIONS
    Options,
    /// TRACE
    Trace,
    /// HEAD
    Head,
}

impl HttpMethod {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "CONNECT" => Ok(Self::Connect),
            "OPTIONS" => Ok(Self::Options),
            "TRACE" => Ok(Self::Trace),
            "HEAD" => Ok(Self::Head),
            _ => Err(RegistryError::UnknownMethod(s.to_string())),
        }
    }
}

/// Errors raised while assembling a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two definitions share a name.
    #[error("Endpoint \"{0}\" is already registered")]
    DuplicateEndpoint(String),

    /// The URL template is dynamic but no path-params schema was declared.
    #[error("Endpoint \"{name}\" has a dynamic URL \"{template}\" but no pathParams schema")]
    MissingPathParamsSchema {
        /// Endpoint name
        name: String,
        /// URL template
        template: String,
    },

    /// A placeholder is not a field of the path-params schema.
    #[error("Endpoint \"{name}\": placeholder \":{placeholder}\" is not declared in its pathParams schema")]
    UnboundPlaceholder {
        /// Endpoint name
        name: String,
        /// Placeholder name
        placeholder: String,
    },

    /// Method string is not a standard HTTP verb.
    #[error("Unknown HTTP method: {0}")]
    UnknownMethod(String),
}

/// Static description of one HTTP operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDefinition {
    name: String,
    method: HttpMethod,
    url_template: String,
    path_params: Option<Schema>,
    query: Option<Schema>,
    payload: Option<Schema>,
    response: Schema,
}

impl EndpointDefinition {
    /// Create a definition with a response schema and no request schemas.
    pub fn new(
        name: impl Into<String>,
        method: HttpMethod,
        url_template: impl Into<String>,
        response: Schema,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            url_template: url_template.into(),
            path_params: None,
            query: None,
            payload: None,
            response,
        }
    }

    /// Set the path-params schema.
    #[must_use]
    pub fn with_path_params(mut self, schema: Schema) -> Self {
        self.path_params = Some(schema);
        self
    }

    /// Set the query schema.
    #[must_use]
    pub fn with_query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    /// Set the payload schema.
    #[must_use]
    pub fn with_payload(mut self, schema: Schema) -> Self {
        self.payload = Some(schema);
        self
    }

    /// Unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// URL template with `:name` placeholders.
    #[must_use]
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Schema for a slot, if declared.
    #[must_use]
    pub const fn schema(&self, slot: Slot) -> Option<&Schema> {
        match slot {
            Slot::PathParams => self.path_params.as_ref(),
            Slot::Query => self.query.as_ref(),
            Slot::Payload => self.payload.as_ref(),
            Slot::Response => Some(&self.response),
        }
    }

    /// Response schema.
    #[must_use]
    pub const fn response_schema(&self) -> &Schema {
        &self.response
    }

    fn check(&self) -> Result<(), RegistryError> {
        let names = placeholders(&self.url_template);
        if names.is_empty() {
            return Ok(());
        }

        let Some(schema) = &self.path_params else {
            return Err(RegistryError::MissingPathParamsSchema {
                name: self.name.clone(),
                template: self.url_template.clone(),
            });
        };

        let declared = schema.field_names();
        match names.into_iter().find(|name| !declared.contains(name)) {
            Some(placeholder) => Err(RegistryError::UnboundPlaceholder {
                name: self.name.clone(),
                placeholder: placeholder.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Statically typed view of a registered endpoint.
///
/// Implementations tie an endpoint name to the Rust types of its inputs and
/// response, so calling an endpoint with the wrong shapes fails to compile.
/// Use `()` for slots the endpoint does not take.
pub trait Endpoint {
    /// Registered name
    const NAME: &'static str;

    /// Path parameters
    type PathParams: Serialize;

    /// Query string
    type Query: Serialize;

    /// Request body
    type Payload: Serialize;

    /// Response body
    type Response: DeserializeOwned;
}

/// Immutable map from endpoint name to definition.
#[derive(Debug, Clone, Default)]
pub struct ApiRegistry {
    endpoints: HashMap<String, Arc<EndpointDefinition>>,
}

impl ApiRegistry {
    /// Start assembling a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up an endpoint by name.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnknownEndpoint`] if no endpoint has that name.
    pub fn lookup(&self, name: &str) -> Result<Arc<EndpointDefinition>, FetchError> {
        self.endpoints
            .get(name)
            .cloned()
            .ok_or_else(|| FetchError::UnknownEndpoint {
                name: name.to_string(),
            })
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if no endpoints are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Builder for [`ApiRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    endpoints: HashMap<String, Arc<EndpointDefinition>>,
}

impl RegistryBuilder {
    /// Add a definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on a duplicate name or an inconsistent
    /// URL template / path-params schema pair.
    pub fn register(mut self, definition: EndpointDefinition) -> Result<Self, RegistryError> {
        if self.endpoints.contains_key(definition.name()) {
            return Err(RegistryError::DuplicateEndpoint(definition.name.clone()));
        }
        definition.check()?;

        self.endpoints
            .insert(definition.name.clone(), Arc::new(definition));
        Ok(self)
    }

    /// Add every definition from `definitions`.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] encountered.
    pub fn register_all<I>(self, definitions: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = EndpointDefinition>,
    {
        definitions
            .into_iter()
            .try_fold(self, RegistryBuilder::register)
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> ApiRegistry {
        ApiRegistry {
            endpoints: self.endpoints,
        }
    }
}
