//! Status ledger persistence tests

use crosspost::storage::{JsonFileStore, LedgerError, LedgerStore, StatusLedger};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn done(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(t, l)| (t.to_string(), l.to_string()))
        .collect()
}

#[test]
fn test_merge_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logs").join("publish_status.json");

    {
        let ledger = StatusLedger::open(&path).unwrap();
        ledger
            .merge(3, &done(&[("devto", "https://dev.to/me/three")]))
            .unwrap();
    }

    let reopened = StatusLedger::open(&path).unwrap();
    let record = reopened.get(3).unwrap();
    assert!(record.is_done("devto"));
    assert_eq!(record.locations["devto"], "https://dev.to/me/three");
    assert!(record.first_published_at.is_some());
}

#[test]
fn test_reads_see_external_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("status.json");

    let ledger = StatusLedger::open(&path).unwrap();
    let other_process = StatusLedger::open(&path).unwrap();

    other_process
        .merge(1, &done(&[("gitlab", "https://gitlab.com/-/snippets/1")]))
        .unwrap();

    assert!(ledger.get(1).unwrap().is_done("gitlab"));
}

#[test]
fn test_document_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("status.json");

    let ledger = StatusLedger::open(&path).unwrap();
    ledger.merge(12, &done(&[("hashnode", "https://h.dev/p")])).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["published"]["12"]["targets_done"][0], "hashnode");
    assert_eq!(raw["published"]["12"]["locations"]["hashnode"], "https://h.dev/p");
}

#[test]
fn test_no_temp_file_left_behind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("status.json");

    let ledger = StatusLedger::open(&path).unwrap();
    ledger.merge(1, &done(&[("devto", "u")])).unwrap();

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["status.json", "status.json.lock"]);
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("status.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = StatusLedger::open(&path).unwrap_err();
    assert!(matches!(err, LedgerError::Corrupt { .. }));

    // The file is left for the operator to inspect
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn test_empty_merge_does_not_create_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("status.json");

    let ledger = StatusLedger::open(&path).unwrap();
    ledger.merge(1, &BTreeMap::new()).unwrap();
    assert!(!path.exists());
}

#[test]
fn test_concurrent_disjoint_merges_all_land() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("status.json");
    let ledger = Arc::new(StatusLedger::open(&path).unwrap());

    let handles: Vec<_> = ["devto", "hashnode", "gitlab", "webhook"]
        .into_iter()
        .map(|target| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                ledger
                    .merge(7, &done(&[(target, format!("https://{target}.example").as_str())]))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let record = JsonFileStore::new(&path).unwrap().load().unwrap().record(7);
    assert_eq!(record.targets_done.len(), 4);
    assert_eq!(record.locations.len(), 4);
}

#[test]
fn test_separate_handles_on_one_file_do_not_lose_merges() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("status.json");

    // Two handles, as with the daemon and a manual `publish --day N`
    let daemon = StatusLedger::open(&path).unwrap();
    let manual = StatusLedger::open(&path).unwrap();

    thread::scope(|scope| {
        scope.spawn(|| {
            for day in 1..=50 {
                daemon.merge(day, &done(&[("devto", "https://dev.to/a")])).unwrap();
            }
        });
        scope.spawn(|| {
            for day in 51..=100 {
                manual.merge(day, &done(&[("gitlab", "https://gitlab.example/b")])).unwrap();
            }
        });
    });

    let document = StatusLedger::open(&path).unwrap().snapshot().unwrap();
    assert_eq!(document.published.len(), 100);
    assert!((1..=50).all(|day| document.record(day).is_done("devto")));
    assert!((51..=100).all(|day| document.record(day).is_done("gitlab")));
}

#[test]
fn test_separate_handles_merging_the_same_day() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("status.json");
    let first = StatusLedger::open(&path).unwrap();
    let second = StatusLedger::open(&path).unwrap();

    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..25 {
                first.merge(1, &done(&[(format!("a{i}").as_str(), "u")])).unwrap();
            }
        });
        scope.spawn(|| {
            for i in 0..25 {
                second.merge(1, &done(&[(format!("b{i}").as_str(), "u")])).unwrap();
            }
        });
    });

    assert_eq!(first.get(1).unwrap().targets_done.len(), 50);
}

#[test]
fn test_merge_order_does_not_matter_for_disjoint_targets() {
    let a = StatusLedger::in_memory();
    a.merge(1, &done(&[("devto", "u1")])).unwrap();
    a.merge(1, &done(&[("gitlab", "u2")])).unwrap();

    let b = StatusLedger::in_memory();
    b.merge(1, &done(&[("gitlab", "u2")])).unwrap();
    b.merge(1, &done(&[("devto", "u1")])).unwrap();

    let (ra, rb) = (a.get(1).unwrap(), b.get(1).unwrap());
    assert_eq!(ra.targets_done, rb.targets_done);
    assert_eq!(ra.locations, rb.locations);
}
