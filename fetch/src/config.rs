//! API configuration.
//!
//! Values come from code, a TOML document or the process environment:
//!
//! ```no_run
//! use pantry_fetch::config::ApiConfig;
//!
//! # fn main() -> Result<(), pantry_fetch::config::ConfigError> {
//! // PANTRY_API_BASE_URL, PANTRY_API_KEY, PANTRY_HOME_PATH
//! let config = ApiConfig::from_env()?;
//!
//! let config = ApiConfig::from_toml_str(r#"
//!     api_base_url = "https://api.spoonacular.com"
//!     api_key = "secret"
//!     unauthorized_redirect = { name = "login" }
//! "#)?;
//! # Ok(())
//! # }
//! ```

use pantry_core::classify::ClassifierConfig;
use pantry_core::environment::NavigationTarget;
use pantry_core::request::RequestContext;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base URL used when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://api.spoonacular.com";

/// Environment variable holding the base URL.
pub const ENV_API_BASE_URL: &str = "PANTRY_API_BASE_URL";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "PANTRY_API_KEY";
/// Environment variable holding the home path.
pub const ENV_HOME_PATH: &str = "PANTRY_HOME_PATH";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable is set but empty
    #[error("Environment variable is empty: {0}")]
    EmptyEnvVar(String),

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Settings shared by every API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Scheme, host and optional prefix of the API
    pub api_base_url: String,
    /// Sent as `x-api-key` when set
    pub api_key: Option<String>,
    /// Where 403/404/405 failures navigate to
    pub home_path: String,
    /// Where 401 failures navigate to (stay put when unset)
    pub unauthorized_redirect: Option<NavigationTarget>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            home_path: "/".to_string(),
            unauthorized_redirect: None,
        }
    }
}

impl ApiConfig {
    /// Configuration for `api_base_url` with defaults elsewhere.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the home path.
    #[must_use]
    pub fn with_home_path(mut self, home_path: impl Into<String>) -> Self {
        self.home_path = home_path.into();
        self
    }

    /// Navigate to `target` on 401.
    #[must_use]
    pub fn with_unauthorized_redirect(mut self, target: NavigationTarget) -> Self {
        self.unauthorized_redirect = Some(target);
        self
    }

    /// Load from the process environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is empty or the result is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any variable lookup (the process environment in
    /// [`ApiConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is empty or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| match lookup(name) {
            Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyEnvVar(name.to_string())),
            other => Ok(other),
        };

        let mut config = Self::default();
        if let Some(url) = read(ENV_API_BASE_URL)? {
            config.api_base_url = url;
        }
        config.api_key = read(ENV_API_KEY)?;
        if let Some(home) = read(ENV_HOME_PATH)? {
            config.home_path = home;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] for malformed TOML and
    /// [`ConfigError::ValidationError`] for invalid values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not http(s) or the home path is not
    /// absolute.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_base_url.starts_with("https://") || self.api_base_url.starts_with("http://")) {
            return Err(ConfigError::ValidationError(format!(
                "api_base_url must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }
        if !self.home_path.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "home_path must start with '/', got {:?}",
                self.home_path
            )));
        }
        if self.api_key.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::ValidationError("api_key cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Navigation targets for the error classifier.
    #[must_use]
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            home: NavigationTarget::path(self.home_path.clone()),
            unauthorized_redirect: self.unauthorized_redirect.clone(),
        }
    }

    /// Request context for the current credential.
    #[must_use]
    pub fn request_context(&self, token: Option<String>) -> RequestContext {
        let context = RequestContext::new(self.api_base_url.clone()).with_token(token);
        match &self.api_key {
            Some(api_key) => context.with_api_key(api_key.clone()),
            None => context,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.classifier_config(), ClassifierConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[
            (ENV_API_BASE_URL, "http://localhost:8080"),
            (ENV_API_KEY, "k"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.home_path, "/");
    }

    #[test]
    fn test_from_lookup_rejects_empty_and_invalid() {
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[(ENV_API_KEY, " ")])),
            Err(ConfigError::EmptyEnvVar(ENV_API_KEY.to_string()))
        );
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[(ENV_HOME_PATH, "home")])),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_from_toml() {
        let config = ApiConfig::from_toml_str(
            r#"
            api_base_url = "https://api.test"
            home_path = "/recipes"
            unauthorized_redirect = { name = "login", query = { reason = "expired" } }
            "#,
        )
        .unwrap();

        assert_eq!(config.api_key, None);
        let classifier = config.classifier_config();
        assert_eq!(classifier.home, NavigationTarget::path("/recipes"));
        assert_eq!(
            classifier.unauthorized_redirect,
            Some(NavigationTarget::route("login").with_query("reason", "expired"))
        );
    }

    #[test]
    fn test_from_toml_errors() {
        assert!(matches!(
            ApiConfig::from_toml_str("api_base_url = "),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            ApiConfig::from_toml_str("api_base_url = \"ftp://x\""),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_request_context() {
        let context = ApiConfig::new("https://api.test")
            .with_api_key("k")
            .request_context(Some("t".to_string()));
        assert_eq!(context.base_url, "https://api.test");
        assert_eq!(context.api_key.as_deref(), Some("k"));
        assert_eq!(context.token.as_deref(), Some("t"));
    }
}
