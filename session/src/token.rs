//! Bearer token mirrored between a cookie and memory.
//!
//! A cookie written during a render is not readable again until the next
//! request, so the token is mirrored in memory: reads hit memory, writes go to
//! both.

use crate::cookie::{CookieStore, write_json};
use pantry_core::environment::CredentialSource;
use std::sync::{Arc, PoisonError, RwLock};

/// Cookie holding the token.
pub const TOKEN_COOKIE: &str = "token";

/// Session bearer token.
///
/// Single writer (sign-in / sign-out), many readers. Clones share the token.
#[derive(Debug, Clone)]
pub struct TokenState<C> {
    cookies: C,
    token: Arc<RwLock<Option<String>>>,
}

impl<C: CookieStore> TokenState<C> {
    /// Load the token from the `token` cookie.
    pub fn new(cookies: C) -> Self {
        let token = read_token(&cookies);
        Self {
            cookies,
            token: Arc::new(RwLock::new(token)),
        }
    }

    /// Current token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the token; `None` signs out and removes the cookie.
    pub fn set_token(&self, token: Option<String>) {
        match &token {
            Some(value) => {
                if let Err(e) = write_json(&self.cookies, TOKEN_COOKIE, value) {
                    tracing::warn!(error = %e, "Token cookie not written");
                }
            },
            None => self.cookies.remove(TOKEN_COOKIE),
        }
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Returns `true` when a non-empty token is present.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.token().is_some_and(|token| !token.is_empty())
    }
}

impl<C: CookieStore> CredentialSource for TokenState<C> {
    fn token(&self) -> Option<String> {
        Self::token(self)
    }
}

/// JSON string when possible, otherwise the decoded raw value.
fn read_token(cookies: &impl CookieStore) -> Option<String> {
    let raw = cookies.get(TOKEN_COOKIE)?;
    let text = urlencoding::decode(&raw).map_or_else(|_| raw.clone(), |text| text.into_owned());

    match serde_json::from_str::<Option<String>>(&text) {
        Ok(token) => token,
        Err(_) => Some(text),
    }
}
