//! The pure request pipeline: `validate → compile → derive key`.
//!
//! [`prepare`] turns raw [`RequestInputs`] into a [`RequestDescriptor`]. It is
//! synchronous and performs no I/O, so every caller bug (bad inputs, bad
//! template) surfaces before a request is issued.

use crate::cache_key::{CacheKey, KeyInputs, derive_key};
use crate::environment::HttpRequest;
use crate::error::{FetchError, Slot};
use crate::registry::{EndpointDefinition, HttpMethod};
use crate::url::compile;
use crate::validation::validate_slot;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Raw inputs of one call, as JSON.
///
/// `null` inputs are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInputs {
    /// Path parameters
    pub path_params: Option<Value>,
    /// Query
    pub query: Option<Value>,
    /// Payload
    pub payload: Option<Value>,
    /// Caller headers (part of the cache key)
    pub headers: BTreeMap<String, String>,
}

impl RequestInputs {
    /// Empty inputs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set path parameters from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] if `value` cannot be serialized.
    pub fn with_path_params<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, FetchError> {
        self.path_params = to_slot_value(Slot::PathParams, value)?;
        Ok(self)
    }

    /// Set the query from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] if `value` cannot be serialized.
    pub fn with_query<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, FetchError> {
        self.query = to_slot_value(Slot::Query, value)?;
        Ok(self)
    }

    /// Set the payload from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] if `value` cannot be serialized.
    pub fn with_payload<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, FetchError> {
        self.payload = to_slot_value(Slot::Payload, value)?;
        Ok(self)
    }

    /// Add a caller header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Serialize an input for `slot`; `null` becomes `None`.
///
/// # Errors
///
/// Returns [`FetchError::InvalidInput`] if serialization fails.
pub fn to_slot_value<T: Serialize + ?Sized>(slot: Slot, value: &T) -> Result<Option<Value>, FetchError> {
    match serde_json::to_value(value) {
        Ok(Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(FetchError::InvalidInput {
            slot,
            message: e.to_string(),
        }),
    }
}

/// Per-session values every request needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// API base URL
    pub base_url: String,
    /// Value of the `x-api-key` header, if any
    pub api_key: Option<String>,
    /// Bearer token, if signed in
    pub token: Option<String>,
}

impl RequestContext {
    /// Context with a base URL and no credentials.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            token: None,
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// Everything needed to issue (or deduplicate) one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Endpoint being called
    pub endpoint: Arc<EndpointDefinition>,
    /// Validated path parameters
    pub path_params: Option<Value>,
    /// Validated query
    pub query: Option<Value>,
    /// Validated payload
    pub payload: Option<Value>,
    /// API base URL
    pub base_url: String,
    /// Compiled path
    pub url: String,
    /// Cache key
    pub cache_key: CacheKey,
    /// Full request headers (defaults, credentials, caller headers)
    pub headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.endpoint.method()
    }

    /// The HTTP request this descriptor stands for.
    #[must_use]
    pub fn to_http_request(&self) -> HttpRequest {
        HttpRequest {
            method: self.method(),
            base_url: self.base_url.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            query: query_pairs(self.query.as_ref()),
            body: self.payload.clone(),
        }
    }
}

/// Run the request pipeline for one call.
///
/// Order: path params, query and payload are validated (first failure wins),
/// then the URL is compiled from the validated path params, then the cache key
/// is derived from the validated values.
///
/// # Errors
///
/// - [`FetchError::RequestValidation`] when an input fails its schema
/// - [`FetchError::UrlCompilation`] when the template cannot be filled
#[tracing::instrument(skip_all, fields(endpoint = endpoint.name()))]
pub fn prepare(
    endpoint: &Arc<EndpointDefinition>,
    inputs: &RequestInputs,
    context: &RequestContext,
) -> Result<RequestDescriptor, FetchError> {
    let validate = |slot, raw: &Option<Value>| {
        validate_slot(endpoint, slot, raw.clone()).map_err(FetchError::RequestValidation)
    };

    let path_params = validate(Slot::PathParams, &inputs.path_params)?;
    let query = validate(Slot::Query, &inputs.query)?;
    let payload = validate(Slot::Payload, &inputs.payload)?;

    let url = compile(endpoint.url_template(), path_params.as_ref()).inspect_err(|e| {
        tracing::error!(template = endpoint.url_template(), params = ?path_params, "{e}");
    })?;

    let cache_key = derive_key(&KeyInputs {
        base_url: &context.base_url,
        url: &url,
        query: query.as_ref(),
        payload: payload.as_ref(),
        method: endpoint.method(),
        headers: &inputs.headers,
    });

    let mut headers = BTreeMap::new();
    headers.insert("Accept".to_string(), "application/json".to_string());
    if let Some(api_key) = &context.api_key {
        headers.insert("x-api-key".to_string(), api_key.clone());
    }
    if let Some(token) = context.token.as_deref().filter(|t| !t.is_empty()) {
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
    }
    headers.extend(inputs.headers.clone());

    Ok(RequestDescriptor {
        endpoint: Arc::clone(endpoint),
        path_params,
        query,
        payload,
        base_url: context.base_url.clone(),
        url,
        cache_key,
        headers,
    })
}

/// Flatten a query object into ordered key/value pairs.
///
/// Scalars are rendered as text, arrays repeat the key, nested objects are
/// JSON-encoded and `null` entries are skipped.
#[must_use]
pub fn query_pairs(query: Option<&Value>) -> Vec<(String, String)> {
    let Some(Value::Object(map)) = query else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {},
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    pairs.push((key.clone(), scalar_text(item)));
                }
            },
            other => pairs.push((key.clone(), scalar_text(other))),
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
