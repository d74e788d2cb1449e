use serde::{Deserialize, Serialize};

// === Constants ===

/// Client id recorded when a writer did not supply one.
pub const SYSTEM_CLIENT_ID: &str = "system";

// === Toggle Record ===

/// The single shared toggle entity: value plus concurrency metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRecord {
    pub value: bool,
    /// Generation counter, +1 per accepted write.
    pub version: u64,
    /// Epoch milliseconds of the accepted write.
    pub updated_at: i64,
    pub updated_by: String,
}

impl ToggleRecord {
    /// State of a deployment that has never been written.
    pub fn initial(system_client_id: &str) -> Self {
        Self {
            value: false,
            version: 0,
            updated_at: 0,
            updated_by: system_client_id.to_string(),
        }
    }
}

impl Default for ToggleRecord {
    fn default() -> Self {
        Self::initial(SYSTEM_CLIENT_ID)
    }
}

// === Wire Types ===

/// Record as exposed to clients. Which metadata fields appear depends on the
/// active policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleView {
    pub value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    pub updated_by: String,
    /// Mirror of `value` for clients that read the historic `toggle` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle: Option<bool>,
}

/// Why a write lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Conflict {
    VersionMismatch { expected: i64, current: u64 },
    Stale { candidate: i64, current: i64 },
}

/// Body of a rejected write: the conflict plus the authoritative record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub conflict: bool,
    #[serde(flatten)]
    pub detail: Conflict,
    pub latest: ToggleView,
}

// === Policy Kind ===

/// Concurrency policy selected per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    VersionCas,
    TimestampLww,
    LegacyCoerce,
}

impl PolicyKind {
    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::VersionCas => "version_cas",
            PolicyKind::TimestampLww => "timestamp_lww",
            PolicyKind::LegacyCoerce => "legacy_coerce",
        }
    }

    /// Whether the policy rejects malformed bodies instead of coercing them.
    pub fn is_strict(self) -> bool {
        !matches!(self, PolicyKind::LegacyCoerce)
    }
}
