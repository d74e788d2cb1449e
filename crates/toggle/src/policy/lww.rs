//! Timestamp last-write-wins with a client id tie-break.
//!
//! Writes are totally ordered by `(timestamp, client_id)`: timestamp first,
//! then byte-wise client id. No read is needed before writing, but a client
//! with a slow clock loses every race.

use anyhow::Result;
use common::types::{Conflict, PolicyKind, ToggleRecord, ToggleView};

use super::{next_version, ConcurrencyPolicy, Decision, Precondition, WriteIntent};
use crate::error::ValidationError;
use crate::validate::{self, FIELD_TIMESTAMP, FIELD_TOGGLE};

#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampLww;

/// Whether candidate `(ts, client)` orders strictly after current `(ts, client)`.
pub fn is_newer(candidate: (i64, &str), current: (i64, &str)) -> bool {
    candidate > current
}

impl ConcurrencyPolicy for TimestampLww {
    fn kind(&self) -> PolicyKind {
        PolicyKind::TimestampLww
    }

    fn parse(&self, body: &[u8], _system_client_id: &str) -> Result<WriteIntent, ValidationError> {
        let obj = validate::parse_object(body)?;
        let value = validate::require_bool(&obj, FIELD_TOGGLE)?;
        let timestamp = validate::require_integer(&obj, FIELD_TIMESTAMP)?;
        let client_id = validate::require_client_id(&obj)?;
        Ok(WriteIntent {
            value,
            precondition: Precondition::Timestamp(timestamp),
            client_id,
        })
    }

    fn decide(&self, current: &ToggleRecord, intent: &WriteIntent, _now_ms: i64) -> Result<Decision> {
        let Precondition::Timestamp(candidate) = intent.precondition else {
            anyhow::bail!("timestamp_lww cannot decide {:?}", intent.precondition);
        };

        if !is_newer(
            (candidate, &intent.client_id),
            (current.updated_at, &current.updated_by),
        ) {
            return Ok(Decision::Reject(Conflict::Stale {
                candidate,
                current: current.updated_at,
            }));
        }

        Ok(Decision::Commit(ToggleRecord {
            value: intent.value,
            version: next_version(current)?,
            updated_at: candidate,
            updated_by: intent.client_id.clone(),
        }))
    }

    fn view(&self, record: &ToggleRecord) -> ToggleView {
        ToggleView {
            value: record.value,
            version: None,
            updated_at: Some(record.updated_at),
            updated_by: record.updated_by.clone(),
            toggle: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(value: bool, ts: i64, by: &str) -> ToggleRecord {
        ToggleRecord {
            value,
            version: 3,
            updated_at: ts,
            updated_by: by.to_string(),
        }
    }

    fn intent(value: bool, ts: i64, client: &str) -> WriteIntent {
        WriteIntent {
            value,
            precondition: Precondition::Timestamp(ts),
            client_id: client.to_string(),
        }
    }

    #[test]
    fn test_tie_break_on_client_id() {
        let current = record(false, 100, "A");

        let decision = TimestampLww.decide(&current, &intent(true, 100, "B"), 0).unwrap();
        assert_eq!(
            decision,
            Decision::Commit(ToggleRecord {
                value: true,
                version: 4,
                updated_at: 100,
                updated_by: "B".to_string(),
            })
        );

        let decision = TimestampLww.decide(&current, &intent(true, 50, "Z"), 0).unwrap();
        assert_eq!(
            decision,
            Decision::Reject(Conflict::Stale {
                candidate: 50,
                current: 100
            })
        );
    }

    #[test]
    fn test_identical_write_is_stale() {
        let current = record(true, 100, "A");
        let decision = TimestampLww.decide(&current, &intent(true, 100, "A"), 0).unwrap();
        assert!(matches!(decision, Decision::Reject(Conflict::Stale { .. })));
    }

    #[test]
    fn test_server_clock_ignored() {
        let current = record(false, 100, "A");
        let decision = TimestampLww
            .decide(&current, &intent(true, 101, "A"), 9_999)
            .unwrap();
        let Decision::Commit(next) = decision else {
            panic!("expected commit");
        };
        assert_eq!(next.updated_at, 101);
    }

    #[test]
    fn test_lexicographic_not_numeric() {
        assert!(is_newer((5, "9"), (5, "10")));
        assert!(is_newer((5, "b"), (5, "B")));
        assert!(!is_newer((4, "zzz"), (5, "a")));
    }

    #[test]
    fn test_parse_requires_timestamp() {
        let err = TimestampLww
            .parse(br#"{"toggle":true,"expectedVersion":1,"clientId":"A"}"#, "system")
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField { field: "timestamp" });
    }

    #[test]
    fn test_view_has_no_version() {
        let view = TimestampLww.view(&record(true, 7, "A"));
        assert_eq!(view.version, None);
        assert_eq!(view.updated_at, Some(7));
    }

    proptest! {
        #[test]
        fn prop_exactly_one_newer(
            t1 in -5i64..5, c1 in "[a-c]{0,2}",
            t2 in -5i64..5, c2 in "[a-c]{0,2}",
        ) {
            prop_assume!(t1 != t2 || c1 != c2);
            let a = is_newer((t1, &c1), (t2, &c2));
            let b = is_newer((t2, &c2), (t1, &c1));
            prop_assert!(a ^ b);
        }

        #[test]
        fn prop_newer_wins_regardless_of_order(
            t1 in 0i64..10, c1 in "[A-D]{1,2}",
            t2 in 0i64..10, c2 in "[A-D]{1,2}",
        ) {
            prop_assume!(t1 != t2 || c1 != c2);
            let start = record(false, -1, "");
            let w1 = intent(true, t1, &c1);
            let w2 = intent(false, t2, &c2);

            let apply = |first: &WriteIntent, second: &WriteIntent| {
                let mut cur = start.clone();
                for w in [first, second] {
                    if let Decision::Commit(next) = TimestampLww.decide(&cur, w, 0).unwrap() {
                        cur = next;
                    }
                }
                cur
            };

            let ab = apply(&w1, &w2);
            let ba = apply(&w2, &w1);
            prop_assert_eq!(ab.value, ba.value);
            prop_assert_eq!(ab.updated_at, ba.updated_at);
            prop_assert_eq!(&ab.updated_by, &ba.updated_by);

            let winner = if is_newer((t1, &c1), (t2, &c2)) { &w1 } else { &w2 };
            prop_assert_eq!(ab.value, winner.value);
            prop_assert_eq!(&ab.updated_by, &winner.client_id);
        }
    }
}
