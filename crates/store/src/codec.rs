//! Toggle record <-> string fields.
//!
//! The substrate only holds strings, so every typed field is rendered to text
//! on write and parsed back on read. Absent fields take their initial value;
//! present but unparseable fields are an error, never a silent default.

use anyhow::{Context, Result};
use common::types::ToggleRecord;

use crate::SharedStateStore;

pub const TOGGLE_PREFIX: &str = "toggle.";
pub const KEY_VALUE: &str = "toggle.value";
pub const KEY_VERSION: &str = "toggle.version";
pub const KEY_UPDATED_AT: &str = "toggle.updatedAt";
pub const KEY_UPDATED_BY: &str = "toggle.updatedBy";

/// Render a record as the four store entries, written together.
pub fn encode_record(record: &ToggleRecord) -> Vec<(&'static str, String)> {
    vec![
        (KEY_VALUE, encode_bool(record.value).to_string()),
        (KEY_VERSION, record.version.to_string()),
        (KEY_UPDATED_AT, record.updated_at.to_string()),
        (KEY_UPDATED_BY, record.updated_by.clone()),
    ]
}

/// Load the record, defaulting absent fields.
pub fn load_record(store: &dyn SharedStateStore, system_client_id: &str) -> Result<ToggleRecord> {
    let initial = ToggleRecord::initial(system_client_id);

    let value = match store.get(KEY_VALUE)? {
        Some(text) => decode_bool(&text).with_context(|| format!("corrupt {}", KEY_VALUE))?,
        None => initial.value,
    };
    let version = match store.get(KEY_VERSION)? {
        Some(text) => text
            .parse::<u64>()
            .with_context(|| format!("corrupt {}: {:?}", KEY_VERSION, text))?,
        None => initial.version,
    };
    let updated_at = match store.get(KEY_UPDATED_AT)? {
        Some(text) => text
            .parse::<i64>()
            .with_context(|| format!("corrupt {}: {:?}", KEY_UPDATED_AT, text))?,
        None => initial.updated_at,
    };
    let updated_by = match store.get(KEY_UPDATED_BY)? {
        Some(text) if !text.is_empty() => text,
        _ => initial.updated_by,
    };

    Ok(ToggleRecord {
        value,
        version,
        updated_at,
        updated_by,
    })
}

/// Whether a record has ever been persisted.
pub fn is_persisted(store: &dyn SharedStateStore) -> Result<bool> {
    Ok(store.get(KEY_VALUE)?.is_some())
}

pub fn encode_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

pub fn decode_bool(text: &str) -> Result<bool> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        other => anyhow::bail!("expected \"true\" or \"false\", got {:?}", other),
    }
}
