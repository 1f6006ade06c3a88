//! Slot validation against an endpoint's schemas.

use crate::error::{Slot, ValidationError};
use crate::registry::EndpointDefinition;
use serde_json::Value;

/// Validate the raw value of one slot.
///
/// A slot without a schema passes its raw value through untouched.
///
/// # Errors
///
/// Returns [`ValidationError`] naming the endpoint and slot when the schema
/// rejects the value.
pub fn validate_slot(
    endpoint: &EndpointDefinition,
    slot: Slot,
    raw: Option<Value>,
) -> Result<Option<Value>, ValidationError> {
    let Some(schema) = endpoint.schema(slot) else {
        return Ok(raw);
    };

    schema
        .validate(raw.as_ref())
        .map_err(|issue| ValidationError::new(endpoint.name(), slot, issue, raw.clone()))
}

/// Validate a response body.
///
/// # Errors
///
/// Returns [`ValidationError`] for the [`Slot::Response`] slot.
pub fn validate_response(
    endpoint: &EndpointDefinition,
    body: Value,
) -> Result<Value, ValidationError> {
    let validated = validate_slot(endpoint, Slot::Response, Some(body))?;
    Ok(validated.unwrap_or(Value::Null))
}
