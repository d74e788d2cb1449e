//! Toggle controller — read path and write path over the shared store.
//!
//! The store has no compare-and-set, so every load-decide-persist sequence
//! runs under one mutex. Reads take the same mutex and never observe a record
//! whose fields come from two different writes.

use std::sync::Arc;

use common::types::{ConflictReport, PolicyKind, ToggleRecord, ToggleView};
use parking_lot::Mutex;
use store::{codec, SharedStateStore};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::policy::{self, ConcurrencyPolicy, Decision, WriteIntent};

/// Result of a write that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Accepted(ToggleView),
    Conflict(ConflictReport),
}

impl WriteOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

pub struct ToggleController {
    store: Arc<dyn SharedStateStore>,
    policy: Box<dyn ConcurrencyPolicy>,
    clock: Arc<dyn Clock>,
    system_client_id: String,
    critical: Mutex<()>,
}

impl ToggleController {
    pub fn new(store: Arc<dyn SharedStateStore>, kind: PolicyKind, system_client_id: &str) -> Self {
        Self {
            store,
            policy: policy::for_kind(kind),
            clock: Arc::new(SystemClock),
            system_client_id: system_client_id.to_string(),
            critical: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    /// Current record as shaped by the active policy.
    pub fn read(&self) -> Result<ToggleView> {
        let record = self.record()?;
        Ok(self.policy.view(&record))
    }

    /// Current record with every metadata field.
    pub fn record(&self) -> Result<ToggleRecord> {
        let _guard = self.critical.lock();
        self.load()
    }

    /// Validate a raw body and submit it.
    pub fn write(&self, body: &[u8]) -> Result<WriteOutcome> {
        let intent = self
            .policy
            .parse(body, &self.system_client_id)
            .inspect_err(|e| debug!("Rejected malformed toggle write: {}", e))?;
        self.submit(&intent)
    }

    /// Decide an already validated intent and commit it if it wins.
    pub fn submit(&self, intent: &WriteIntent) -> Result<WriteOutcome> {
        let _guard = self.critical.lock();

        let current = self.load()?;
        let decision = self.policy.decide(&current, intent, self.clock.now_ms())?;

        match decision {
            Decision::Commit(next) => {
                if current.version.checked_add(1) != Some(next.version) {
                    return Err(anyhow::anyhow!(
                        "inconsistent version step {} -> {}",
                        current.version,
                        next.version
                    )
                    .into());
                }
                self.store.set_many(&codec::encode_record(&next))?;
                info!(
                    "Toggle set to {} by {} (version {})",
                    next.value, next.updated_by, next.version
                );
                Ok(WriteOutcome::Accepted(self.policy.view(&next)))
            }
            Decision::Reject(detail) => {
                info!(
                    "Toggle write from {} rejected: {:?}",
                    intent.client_id, detail
                );
                Ok(WriteOutcome::Conflict(ConflictReport {
                    conflict: true,
                    detail,
                    latest: self.policy.view(&current),
                }))
            }
        }
    }

    /// Persist the initial record if nothing has been written yet.
    /// Returns whether a record was written.
    pub fn seed(&self) -> Result<bool> {
        let _guard = self.critical.lock();

        if codec::is_persisted(self.store.as_ref())? {
            return Ok(false);
        }
        let current = self.load()?;
        if current.version != 0 {
            warn!(
                "Toggle metadata present without a value (version {}), seeding value only",
                current.version
            );
        }
        let seeded = ToggleRecord {
            value: false,
            ..current
        };
        self.store.set_many(&codec::encode_record(&seeded))?;
        info!("Seeded toggle record with default value");
        Ok(true)
    }

    fn load(&self) -> Result<ToggleRecord> {
        Ok(codec::load_record(
            self.store.as_ref(),
            &self.system_client_id,
        )?)
    }
}
