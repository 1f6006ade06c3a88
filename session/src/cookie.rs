//! Cookie storage.
//!
//! Values are stored the way browser-side code expects them: JSON, then
//! percent-encoded. [`read_json`] and [`write_json`] apply that encoding on top
//! of any [`CookieStore`].

use crate::error::{Result, SessionError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Named cookie storage holding encoded values.
pub trait CookieStore: Send + Sync {
    /// Encoded value of `name`.
    fn get(&self, name: &str) -> Option<String>;

    /// Set the encoded value of `name`.
    fn set(&self, name: &str, value: String);

    /// Remove `name`.
    fn remove(&self, name: &str);
}

/// In-memory cookie jar.
///
/// Clones share the same cookies, so a jar can be handed to several session
/// objects of the same request.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieJar {
    cookies: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryCookieJar {
    /// Empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Jar filled from a `Cookie` request header (`a=1; b=2`).
    ///
    /// Pairs without `=` are ignored.
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .filter(|(name, _)| !name.is_empty())
            .collect();

        Self {
            cookies: Arc::new(RwLock::new(cookies)),
        }
    }

    /// Render the jar as a `Cookie` header, names in sorted order.
    #[must_use]
    pub fn to_header(&self) -> String {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if the jar holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CookieStore for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn set(&self, name: &str, value: String) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value);
    }

    fn remove(&self, name: &str) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}

impl<C: CookieStore> CookieStore for Arc<C> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: String) {
        (**self).set(name, value);
    }

    fn remove(&self, name: &str) {
        (**self).remove(name);
    }
}

/// Decode cookie `name` as JSON.
///
/// # Errors
///
/// Returns [`SessionError::Decode`] if the value is not valid percent-encoded
/// JSON of type `T`.
pub fn read_json<T: DeserializeOwned>(store: &impl CookieStore, name: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(name) else {
        return Ok(None);
    };

    let decode_error = |message: String| SessionError::Decode {
        name: name.to_string(),
        message,
    };
    let json = urlencoding::decode(&raw).map_err(|e| decode_error(e.to_string()))?;
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| decode_error(e.to_string()))
}

/// Encode `value` as JSON into cookie `name`.
///
/// # Errors
///
/// Returns [`SessionError::Encode`] if `value` cannot be serialized.
pub fn write_json<T: Serialize + ?Sized>(store: &impl CookieStore, name: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).map_err(|e| SessionError::Encode {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    store.set(name, urlencoding::encode(&json).into_owned());
    Ok(())
}
