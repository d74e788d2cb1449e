//! Unconditional last-write-wins with lenient body coercion.
//!
//! Kept for clients that post a bare boolean (or anything else) and read the
//! historic `toggle` field. Never rejects a write; do not use for new
//! deployments.

use anyhow::Result;
use common::types::{PolicyKind, ToggleRecord, ToggleView};
use serde_json::Value;

use super::{next_version, ConcurrencyPolicy, Decision, Precondition, WriteIntent};
use crate::error::ValidationError;
use crate::validate::{FIELD_CLIENT_ID, FIELD_TOGGLE};

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyCoerce;

/// Coerce any JSON value to a toggle state.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Object(map) => map.get(FIELD_TOGGLE).is_some_and(coerce_bool),
        Value::Null | Value::Array(_) => false,
    }
}

impl ConcurrencyPolicy for LegacyCoerce {
    fn kind(&self) -> PolicyKind {
        PolicyKind::LegacyCoerce
    }

    fn parse(&self, body: &[u8], system_client_id: &str) -> Result<WriteIntent, ValidationError> {
        let value = serde_json::from_slice::<Value>(body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));

        let client_id = value
            .get(FIELD_CLIENT_ID)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(system_client_id)
            .to_string();

        Ok(WriteIntent {
            value: coerce_bool(&value),
            precondition: Precondition::Unconditional,
            client_id,
        })
    }

    fn decide(&self, current: &ToggleRecord, intent: &WriteIntent, now_ms: i64) -> Result<Decision> {
        Ok(Decision::Commit(ToggleRecord {
            value: intent.value,
            version: next_version(current)?,
            updated_at: now_ms,
            updated_by: intent.client_id.clone(),
        }))
    }

    fn view(&self, record: &ToggleRecord) -> ToggleView {
        ToggleView {
            value: record.value,
            version: None,
            updated_at: None,
            updated_by: record.updated_by.clone(),
            toggle: Some(record.value),
        }
    }
}
