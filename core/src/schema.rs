//! Structural schemas for request and response payloads.
//!
//! A [`Schema`] describes the JSON shape one slot of an endpoint accepts
//! (path params, query, payload or response). Validation returns the
//! *validated* value rather than a boolean: object schemas drop keys they do
//! not declare, so what gets sent over the wire (or handed to the caller) is
//! exactly what the schema allows.
//!
//! Optional slots and fields treat `null` and "absent" the same way, which
//! matches how `Option<T>` fields serialize with serde.

use serde_json::{Map, Value};
use std::fmt;

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

/// Location of a value inside a validated document.
///
/// Displays as `nutrition.nutrients[0].name`; the root displays as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty (root) path.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Path segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }

        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// The first mismatch found while validating a value.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaIssue {
    /// Where the mismatch is
    pub path: FieldPath,
    /// Kind the schema expected (`"string"`, `"object"`, ...)
    pub expected: &'static str,
    /// Kind that was found (`"undefined"` when missing)
    pub received: &'static str,
    /// The offending value, `None` when it was missing
    pub value: Option<Value>,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, received {}",
            self.path, self.expected, self.received
        )
    }
}

impl std::error::Error for SchemaIssue {}

/// Structural schema for a JSON value.
///
/// Build schemas with the constructor functions:
///
/// ```
/// use pantry_core::schema::Schema;
/// use serde_json::json;
///
/// let schema = Schema::object([
///     ("id", Schema::integer()),
///     ("name", Schema::string()),
///     ("tags", Schema::array(Schema::string()).optional()),
/// ]);
///
/// let validated = schema
///     .validate(Some(&json!({ "id": 1, "name": "flour", "extra": true })))
///     .unwrap();
///
/// // Undeclared keys are stripped
/// assert_eq!(validated, Some(json!({ "id": 1, "name": "flour" })));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// JSON string
    String,
    /// Any JSON number
    Number,
    /// JSON number without a fractional part
    Integer,
    /// JSON boolean
    Boolean,
    /// Any non-null value, passed through untouched
    Any,
    /// Homogeneous array
    Array(Box<Schema>),
    /// Object with declared fields (undeclared fields are dropped)
    Object(Vec<(String, Schema)>),
    /// Value may be absent or `null`
    Optional(Box<Schema>),
}

impl Schema {
    /// String schema
    #[must_use]
    pub const fn string() -> Self {
        Self::String
    }

    /// Number schema
    #[must_use]
    pub const fn number() -> Self {
        Self::Number
    }

    /// Integer schema
    #[must_use]
    pub const fn integer() -> Self {
        Self::Integer
    }

    /// Boolean schema
    #[must_use]
    pub const fn boolean() -> Self {
        Self::Boolean
    }

    /// Schema accepting any non-null value
    #[must_use]
    pub const fn any() -> Self {
        Self::Any
    }

    /// Array schema with the given item schema
    #[must_use]
    pub fn array(item: Self) -> Self {
        Self::Array(Box::new(item))
    }

    /// Object schema with the given fields, in declaration order
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Self)>,
        K: Into<String>,
    {
        Self::Object(
            fields
                .into_iter()
                .map(|(key, schema)| (key.into(), schema))
                .collect(),
        )
    }

    /// Wrap this schema so the value may be absent
    #[must_use]
    pub fn optional(self) -> Self {
        match self {
            Self::Optional(_) => self,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Returns `true` if an absent value passes this schema
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Declared field names of an object schema (looking through `optional`)
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            Self::Object(fields) => fields.iter().map(|(key, _)| key.as_str()).collect(),
            Self::Optional(inner) => inner.field_names(),
            _ => Vec::new(),
        }
    }

    /// Kind name used in issues
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Any => "any",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Optional(inner) => inner.kind(),
        }
    }

    /// Validate `value` (`None` meaning absent) against this schema.
    ///
    /// Returns the validated value, `None` when an optional value was absent.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaIssue`] found, depth first in field order.
    pub fn validate(&self, value: Option<&Value>) -> Result<Option<Value>, SchemaIssue> {
        self.validate_at(value, &FieldPath::root())
    }

    fn validate_at(
        &self,
        value: Option<&Value>,
        path: &FieldPath,
    ) -> Result<Option<Value>, SchemaIssue> {
        let value = match (self, value) {
            (Self::Optional(_), None | Some(Value::Null)) => return Ok(None),
            (Self::Optional(inner), Some(value)) => return inner.validate_at(Some(value), path),
            (_, None) => return Err(self.issue(path, None)),
            (_, Some(value)) => value,
        };

        let validated = match (self, value) {
            (Self::String, Value::String(_))
            | (Self::Number, Value::Number(_))
            | (Self::Boolean, Value::Bool(_)) => value.clone(),
            (Self::Integer, Value::Number(n)) if is_integral(n) => value.clone(),
            (Self::Any, v) if !v.is_null() => value.clone(),
            (Self::Array(item), Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, element) in items.iter().enumerate() {
                    let child = path.child(PathSegment::Index(index));
                    // Array elements are never "absent"; optional items keep their null
                    out.push(item.validate_at(Some(element), &child)?.unwrap_or(Value::Null));
                }
                Value::Array(out)
            },
            (Self::Object(fields), Value::Object(map)) => {
                let mut out = Map::new();
                for (key, schema) in fields {
                    let child = path.child(PathSegment::Key(key.clone()));
                    if let Some(validated) = schema.validate_at(map.get(key), &child)? {
                        out.insert(key.clone(), validated);
                    }
                }
                Value::Object(out)
            },
            _ => return Err(self.issue(path, Some(value))),
        };

        Ok(Some(validated))
    }

    fn issue(&self, path: &FieldPath, value: Option<&Value>) -> SchemaIssue {
        SchemaIssue {
            path: path.clone(),
            expected: self.kind(),
            received: value.map_or("undefined", kind_of),
            value: value.cloned(),
        }
    }
}

/// Kind name of a JSON value, as reported in issues.
#[must_use]
pub const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_integral(n: &serde_json::Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
}
