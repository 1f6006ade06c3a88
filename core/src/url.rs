//! URL template compilation.
//!
//! Templates name their dynamic segments with a leading colon:
//! `/food/ingredients/:id/information`. A placeholder name is a run of ASCII
//! alphanumerics and underscores, so `/:id.json` has the placeholder `id`
//! followed by the literal `.json`. A colon not followed by a name character
//! is kept literally.

use serde_json::Value;
use thiserror::Error;

/// Failure to substitute path parameters into a template.
///
/// Always a caller bug: the error is fatal and never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UrlCompileError {
    /// Path params were given but are not an object.
    #[error("[useApi] Failed to compile dynamic URL \"{template}\": path params must be an object")]
    NotAnObject {
        /// Template being compiled
        template: String,
        /// Offending params
        params: Value,
    },

    /// A placeholder has no value.
    #[error("[useApi] Failed to compile dynamic URL \"{template}\": missing \"{name}\"")]
    MissingParam {
        /// Template being compiled
        template: String,
        /// Placeholder name
        name: String,
        /// Offending params
        params: Value,
    },

    /// A placeholder value is not a string or number.
    #[error("[useApi] Failed to compile dynamic URL \"{template}\": expected \"{name}\" to be a string or number")]
    InvalidParamType {
        /// Template being compiled
        template: String,
        /// Placeholder name
        name: String,
        /// Offending params
        params: Value,
    },

    /// A placeholder value is the empty string.
    #[error("[useApi] Failed to compile dynamic URL \"{template}\": \"{name}\" must not be empty")]
    EmptyParam {
        /// Template being compiled
        template: String,
        /// Placeholder name
        name: String,
        /// Offending params
        params: Value,
    },
}

impl UrlCompileError {
    /// Template that failed to compile.
    #[must_use]
    pub fn template(&self) -> &str {
        match self {
            Self::NotAnObject { template, .. }
            | Self::MissingParam { template, .. }
            | Self::InvalidParamType { template, .. }
            | Self::EmptyParam { template, .. } => template,
        }
    }

    /// Params that were supplied.
    #[must_use]
    pub const fn params(&self) -> &Value {
        match self {
            Self::NotAnObject { params, .. }
            | Self::MissingParam { params, .. }
            | Self::InvalidParamType { params, .. }
            | Self::EmptyParam { params, .. } => params,
        }
    }
}

enum Token<'a> {
    Literal(&'a str),
    Param(&'a str),
}

const fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn tokenize(template: &str) -> Vec<Token<'_>> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b':' && bytes.get(i + 1).copied().is_some_and(is_name_byte) {
            if literal_start < i {
                tokens.push(Token::Literal(&template[literal_start..i]));
            }
            let name_start = i + 1;
            let mut end = name_start;
            while end < bytes.len() && is_name_byte(bytes[end]) {
                end += 1;
            }
            tokens.push(Token::Param(&template[name_start..end]));
            i = end;
            literal_start = end;
        } else {
            i += 1;
        }
    }

    if literal_start < bytes.len() {
        tokens.push(Token::Literal(&template[literal_start..]));
    }
    tokens
}

/// Placeholder names in `template`, in order of appearance.
///
/// ```
/// use pantry_core::url::placeholders;
///
/// assert_eq!(placeholders("/recipes/:id/similar/:limit"), vec!["id", "limit"]);
/// assert!(placeholders("/food/ingredients/search").is_empty());
/// ```
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    tokenize(template)
        .into_iter()
        .filter_map(|token| match token {
            Token::Param(name) => Some(name),
            Token::Literal(_) => None,
        })
        .collect()
}

/// Substitute `params` into `template`.
///
/// Without params the template is returned unchanged (static URLs). Values
/// are percent-encoded as path segments.
///
/// ```
/// use pantry_core::url::compile;
/// use serde_json::json;
///
/// let url = compile("/food/ingredients/:id/information", Some(&json!({ "id": 42 }))).unwrap();
/// assert_eq!(url, "/food/ingredients/42/information");
///
/// let url = compile("/search/:term", Some(&json!({ "term": "a b/c" }))).unwrap();
/// assert_eq!(url, "/search/a%20b%2Fc");
/// ```
///
/// # Errors
///
/// Returns [`UrlCompileError`] when params are not an object, or a
/// placeholder is missing, empty, or not a string/number.
pub fn compile(template: &str, params: Option<&Value>) -> Result<String, UrlCompileError> {
    let Some(params) = params else {
        return Ok(template.to_string());
    };

    let Value::Object(map) = params else {
        return Err(UrlCompileError::NotAnObject {
            template: template.to_string(),
            params: params.clone(),
        });
    };

    let mut url = String::with_capacity(template.len());
    for token in tokenize(template) {
        match token {
            Token::Literal(text) => url.push_str(text),
            Token::Param(name) => {
                let segment = match map.get(name) {
                    None | Some(Value::Null) => {
                        return Err(UrlCompileError::MissingParam {
                            template: template.to_string(),
                            name: name.to_string(),
                            params: params.clone(),
                        });
                    },
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(_) => {
                        return Err(UrlCompileError::InvalidParamType {
                            template: template.to_string(),
                            name: name.to_string(),
                            params: params.clone(),
                        });
                    },
                };

                if segment.is_empty() {
                    return Err(UrlCompileError::EmptyParam {
                        template: template.to_string(),
                        name: name.to_string(),
                        params: params.clone(),
                    });
                }
                url.push_str(&urlencoding::encode(&segment));
            },
        }
    }

    Ok(url)
}
