//! Structural checks for write bodies. Nothing here coerces.

use serde_json::{Map, Value};

use crate::error::ValidationError;

pub const FIELD_TOGGLE: &str = "toggle";
pub const FIELD_EXPECTED_VERSION: &str = "expectedVersion";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_CLIENT_ID: &str = "clientId";

pub type Object = Map<String, Value>;

/// Parse a body that must be a JSON object.
pub fn parse_object(body: &[u8]) -> Result<Object, ValidationError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::NotAnObject),
    }
}

pub fn require_bool(obj: &Object, field: &'static str) -> Result<bool, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "a boolean",
        }),
    }
}

/// Integer field in i64 range. Floats, even integral ones, are rejected.
pub fn require_integer(obj: &Object, field: &'static str) -> Result<i64, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(Value::Number(n)) if n.is_i64() => n
            .as_i64()
            .ok_or(ValidationError::OutOfRange { field }),
        Some(Value::Number(n)) if n.is_u64() => Err(ValidationError::OutOfRange { field }),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "an integer",
        }),
    }
}

pub fn require_client_id(obj: &Object) -> Result<String, ValidationError> {
    let field = FIELD_CLIENT_ID;
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(Value::String(s)) if s.is_empty() => Err(ValidationError::Empty { field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "a string",
        }),
    }
}
