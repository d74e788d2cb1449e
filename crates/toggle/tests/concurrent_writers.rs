use std::sync::{Arc, Barrier};

use common::types::{Conflict, PolicyKind};
use store::{FileStore, MemoryStore, SharedStateStore};
use toggle::{Precondition, ToggleController, WriteIntent, WriteOutcome};

const WRITERS: usize = 16;

fn race_on_version(ctl: Arc<ToggleController>, expected: i64) -> Vec<WriteOutcome> {
    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let ctl = Arc::clone(&ctl);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let intent = WriteIntent {
                    value: i % 2 == 0,
                    precondition: Precondition::ExpectedVersion(expected),
                    client_id: format!("writer-{}", i),
                };
                barrier.wait();
                ctl.submit(&intent).unwrap()
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_same_version_exactly_one_winner() {
    let store: Arc<dyn SharedStateStore> = Arc::new(MemoryStore::new());
    let ctl = Arc::new(ToggleController::new(store, PolicyKind::VersionCas, "system"));

    for round in 0..5u64 {
        let outcomes = race_on_version(Arc::clone(&ctl), round as i64);
        let accepted: Vec<_> = outcomes.iter().filter(|o| o.is_accepted()).collect();
        assert_eq!(accepted.len(), 1, "round {}", round);

        for outcome in &outcomes {
            if let WriteOutcome::Conflict(report) = outcome {
                assert_eq!(
                    report.detail,
                    Conflict::VersionMismatch {
                        expected: round as i64,
                        current: round + 1
                    }
                );
            }
        }

        let WriteOutcome::Accepted(winner) = accepted[0] else {
            unreachable!();
        };
        assert_eq!(&ctl.read().unwrap(), winner);
        assert_eq!(ctl.record().unwrap().version, round + 1);
    }
}

#[test]
fn test_retry_after_conflict_converges() {
    let store: Arc<dyn SharedStateStore> = Arc::new(MemoryStore::new());
    let ctl = Arc::new(ToggleController::new(store, PolicyKind::VersionCas, "system"));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ctl = Arc::clone(&ctl);
            std::thread::spawn(move || {
                let mut attempts = 0;
                let mut expected = ctl.record().unwrap().version as i64;
                loop {
                    attempts += 1;
                    let intent = WriteIntent {
                        value: true,
                        precondition: Precondition::ExpectedVersion(expected),
                        client_id: format!("retry-{}", i),
                    };
                    match ctl.submit(&intent).unwrap() {
                        WriteOutcome::Accepted(_) => return attempts,
                        WriteOutcome::Conflict(report) => {
                            expected = report.latest.version.unwrap() as i64;
                        }
                    }
                }
            })
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap() >= 1);
    }
    assert_eq!(ctl.record().unwrap().version, 8);
}

#[test]
fn test_lww_concurrent_writers_keep_maximum() {
    let store: Arc<dyn SharedStateStore> = Arc::new(MemoryStore::new());
    let ctl = Arc::new(ToggleController::new(store, PolicyKind::TimestampLww, "system"));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let ctl = Arc::clone(&ctl);
            std::thread::spawn(move || {
                for ts in 1..=50i64 {
                    let intent = WriteIntent {
                        value: ts % 2 == 0,
                        precondition: Precondition::Timestamp(ts),
                        client_id: format!("c{:02}", i),
                    };
                    ctl.submit(&intent).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let rec = ctl.record().unwrap();
    assert_eq!(rec.updated_at, 50);
    assert_eq!(rec.updated_by, format!("c{:02}", WRITERS - 1));
    assert!(rec.value);
}

#[test]
fn test_file_store_survives_controller_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let store: Arc<dyn SharedStateStore> = Arc::new(FileStore::open(&path).unwrap());
        let ctl = ToggleController::new(store, PolicyKind::VersionCas, "system");
        assert!(ctl.seed().unwrap());
        assert!(ctl
            .write(br#"{"toggle":true,"expectedVersion":0,"clientId":"A"}"#)
            .unwrap()
            .is_accepted());
    }

    let store: Arc<dyn SharedStateStore> = Arc::new(FileStore::open(&path).unwrap());
    let ctl = ToggleController::new(store, PolicyKind::VersionCas, "system");
    assert!(!ctl.seed().unwrap());
    let view = ctl.read().unwrap();
    assert!(view.value);
    assert_eq!(view.version, Some(1));
    assert_eq!(view.updated_by, "A");
}
