//! Version compare-and-swap. A write must name the version it read; any
//! other version is rejected, never merged.

use anyhow::Result;
use common::types::{Conflict, PolicyKind, ToggleRecord, ToggleView};

use super::{next_version, ConcurrencyPolicy, Decision, Precondition, WriteIntent};
use crate::error::ValidationError;
use crate::validate::{self, FIELD_EXPECTED_VERSION, FIELD_TOGGLE};

#[derive(Debug, Clone, Copy, Default)]
pub struct VersionCas;

impl ConcurrencyPolicy for VersionCas {
    fn kind(&self) -> PolicyKind {
        PolicyKind::VersionCas
    }

    fn parse(&self, body: &[u8], _system_client_id: &str) -> Result<WriteIntent, ValidationError> {
        let obj = validate::parse_object(body)?;
        let value = validate::require_bool(&obj, FIELD_TOGGLE)?;
        let expected = validate::require_integer(&obj, FIELD_EXPECTED_VERSION)?;
        let client_id = validate::require_client_id(&obj)?;
        Ok(WriteIntent {
            value,
            precondition: Precondition::ExpectedVersion(expected),
            client_id,
        })
    }

    fn decide(&self, current: &ToggleRecord, intent: &WriteIntent, now_ms: i64) -> Result<Decision> {
        let Precondition::ExpectedVersion(expected) = intent.precondition else {
            anyhow::bail!("version_cas cannot decide {:?}", intent.precondition);
        };

        // A negative expectation can never match an unsigned version.
        if u64::try_from(expected).ok() != Some(current.version) {
            return Ok(Decision::Reject(Conflict::VersionMismatch {
                expected,
                current: current.version,
            }));
        }

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
            version: Some(record.version),
            updated_at: Some(record.updated_at),
            updated_by: record.updated_by.clone(),
            toggle: None,
        }
    }
}
