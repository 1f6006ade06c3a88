//! Cache-key derivation.
//!
//! A request's cache key identifies its semantic shape: base URL, compiled
//! URL, validated query and payload, method and caller headers. The hosting
//! side uses it to deduplicate identical requests and to serve a hydrated
//! value instead of refetching.
//!
//! The key is a SHA-256 digest of a canonical JSON rendering, so it is stable
//! across processes and independent of object identity or map insertion
//! order.

use crate::registry::HttpMethod;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Token substituted for any input that cannot be serialized.
pub const UNSERIALIZABLE_SENTINEL: &str = "function";

/// Deterministic identifier of a request's semantic shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// The key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Everything that feeds a cache key.
#[derive(Debug, Clone, Copy)]
pub struct KeyInputs<'a> {
    /// API base URL
    pub base_url: &'a str,
    /// Compiled request path
    pub url: &'a str,
    /// Validated query
    pub query: Option<&'a Value>,
    /// Validated payload
    pub payload: Option<&'a Value>,
    /// HTTP method
    pub method: HttpMethod,
    /// Caller-supplied headers
    pub headers: &'a BTreeMap<String, String>,
}

/// Derive the cache key for `inputs`.
///
/// ```
/// use pantry_core::cache_key::{derive_key, KeyInputs};
/// use pantry_core::registry::HttpMethod;
/// use serde_json::json;
/// use std::collections::BTreeMap;
///
/// let headers = BTreeMap::new();
/// let a = json!({ "query": "apple", "number": 5 });
/// let b = json!({ "number": 5, "query": "apple" });
///
/// let key = |query| derive_key(&KeyInputs {
///     base_url: "https://api.example.com",
///     url: "/food/ingredients/search",
///     query: Some(query),
///     payload: None,
///     method: HttpMethod::Get,
///     headers: &headers,
/// });
///
/// assert_eq!(key(&a), key(&b));
/// ```
#[must_use]
pub fn derive_key(inputs: &KeyInputs<'_>) -> CacheKey {
    let shape = Value::Array(vec![
        Value::String(inputs.base_url.to_string()),
        Value::String(inputs.url.to_string()),
        inputs.query.cloned().unwrap_or(Value::Null),
        inputs.payload.cloned().unwrap_or(Value::Null),
        Value::String(inputs.method.as_str().to_string()),
        normalize(inputs.headers),
    ]);

    let canonical = canonicalize(shape).to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    CacheKey(URL_SAFE_NO_PAD.encode(digest))
}

/// Serialize `value` to JSON, replacing it with [`UNSERIALIZABLE_SENTINEL`]
/// when serialization fails.
#[must_use]
pub fn normalize<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|_| Value::String(UNSERIALIZABLE_SENTINEL.to_string()))
}

/// Rebuild every object with its keys in sorted order.
///
/// `serde_json::Map` is already sorted unless the `preserve_order` feature is
/// enabled somewhere in the build; this keeps keys stable either way.
#[must_use]
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        },
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
