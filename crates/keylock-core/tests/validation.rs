// Validation and hwid binding behaviour against the in-memory store
//
// Covers the rule ordering, first-use binding, binding races and the
// separation between rejections and store failures.

mod common;

use std::collections::HashSet;

use chrono::{Duration, Utc};
use common::{seed, RacingStore, UnavailableStore};
use keylock_core::{
    LicenseStore, MemoryLicenseStore, Reason, Status, ValidationError, Validator, Verdict,
    MAX_BIND_ATTEMPTS,
};

#[tokio::test]
async fn test_first_use_binds_and_locks() {
    let store = MemoryLicenseStore::new();
    let record = seed(&store, "KEY-1", Utc::now(), 30).await;
    let validator = Validator::new(store.clone());

    // First validation binds the presented hwid
    let verdict = validator.validate("KEY-1", "X").await.unwrap();
    assert_eq!(verdict, Verdict::valid(record.valid_until, "X".to_string()));
    let stored = store.find_by_key("KEY-1").await.unwrap().unwrap();
    assert_eq!(stored.hwid.as_deref(), Some("X"));

    // A different machine is now refused
    let verdict = validator.validate("KEY-1", "Y").await.unwrap();
    assert_eq!(verdict.reason, Reason::HwidMismatch);
    assert_eq!(verdict.status, Status::Invalid);
    assert_eq!(verdict.hwid, None);

    // The bound machine keeps validating
    let verdict = validator.validate("KEY-1", "X").await.unwrap();
    assert!(verdict.is_valid());
    assert_eq!(verdict.hwid.as_deref(), Some("X"));

    let stored = store.find_by_key("KEY-1").await.unwrap().unwrap();
    assert_eq!(stored.hwid.as_deref(), Some("X"));
}

#[tokio::test]
async fn test_unknown_key_is_not_found() {
    let validator = Validator::new(MemoryLicenseStore::new());
    let verdict = validator.validate("missing", "X").await.unwrap();
    assert_eq!(verdict, Verdict::rejected(Reason::NotFound));
}

#[tokio::test]
async fn test_missing_inputs_are_malformed_not_not_found() {
    let store = MemoryLicenseStore::new();
    seed(&store, "K", Utc::now(), 30).await;
    let validator = Validator::new(store.clone());

    for (key, hwid) in [("", "X"), ("K", ""), ("", ""), (" ", "X")] {
        let verdict = validator.validate(key, hwid).await.unwrap();
        assert_eq!(verdict.reason, Reason::Malformed, "key={key:?} hwid={hwid:?}");
        assert_eq!(verdict.status, Status::Error);
    }

    // Nothing was bound by the malformed attempts
    let stored = store.find_by_key("K").await.unwrap().unwrap();
    assert_eq!(stored.hwid, None);
}

#[tokio::test]
async fn test_non_ascii_hwid_binds() {
    let store = MemoryLicenseStore::new();
    seed(&store, "K", Utc::now(), 30).await;
    let validator = Validator::new(store.clone());

    let hwid = "é".repeat(100);
    let verdict = validator.validate("K", &hwid).await.unwrap();
    assert!(verdict.is_valid());
    assert_eq!(verdict.hwid.as_deref(), Some(hwid.as_str()));

    let verdict = validator.validate("K", &"é".repeat(129)).await.unwrap();
    assert_eq!(verdict.reason, Reason::Malformed);
}

#[tokio::test]
async fn test_nul_in_input_is_malformed_before_the_store() {
    let validator = Validator::new(UnavailableStore);
    for (key, hwid) in [("K\0", "X"), ("K", "X\0")] {
        let verdict = validator.validate(key, hwid).await.unwrap();
        assert_eq!(verdict.reason, Reason::Malformed, "key={key:?} hwid={hwid:?}");
    }
}

#[tokio::test]
async fn test_malformed_is_decided_before_the_store() {
    let validator = Validator::new(UnavailableStore);
    let verdict = validator.validate("", "X").await.unwrap();
    assert_eq!(verdict.reason, Reason::Malformed);
}

#[tokio::test]
async fn test_deactivated_regardless_of_hwid_or_time() {
    let store = MemoryLicenseStore::new();
    let now = Utc::now();
    seed(&store, "fresh", now, 30).await;
    seed(&store, "bound", now, 30).await;
    seed(&store, "expired", now - Duration::days(60), 30).await;
    store.bind_hwid("bound", "X").await.unwrap();
    for key in ["fresh", "bound", "expired"] {
        store.set_active(key, false).await.unwrap();
    }

    let validator = Validator::new(store.clone());
    for key in ["fresh", "bound", "expired"] {
        for hwid in ["X", "Y"] {
            let verdict = validator.validate(key, hwid).await.unwrap();
            assert_eq!(verdict.reason, Reason::Deactivated, "{key}/{hwid}");
        }
    }

    // Deactivated licenses are never bound
    let fresh = store.find_by_key("fresh").await.unwrap().unwrap();
    assert_eq!(fresh.hwid, None);
}

#[tokio::test]
async fn test_expired_even_when_hwid_matches() {
    let store = MemoryLicenseStore::new();
    let issued = Utc::now() - Duration::days(31);
    seed(&store, "old", issued, 30).await;
    store.bind_hwid("old", "X").await.unwrap();

    let validator = Validator::new(store);
    let verdict = validator.validate("old", "X").await.unwrap();
    assert_eq!(verdict, Verdict::rejected(Reason::Expired));
}

#[tokio::test]
async fn test_expired_license_is_not_bound() {
    let store = MemoryLicenseStore::new();
    seed(&store, "old", Utc::now() - Duration::days(31), 30).await;

    let validator = Validator::new(store.clone());
    let verdict = validator.validate("old", "X").await.unwrap();
    assert_eq!(verdict.reason, Reason::Expired);
    assert_eq!(store.find_by_key("old").await.unwrap().unwrap().hwid, None);
}

#[tokio::test]
async fn test_expiry_uses_supplied_clock() {
    let store = MemoryLicenseStore::new();
    let record = seed(&store, "K", Utc::now(), 30).await;
    let validator = Validator::new(store);

    let before = record.valid_until - Duration::seconds(1);
    assert!(validator.validate_at("K", "X", before).await.unwrap().is_valid());

    let verdict = validator
        .validate_at("K", "X", record.valid_until)
        .await
        .unwrap();
    assert_eq!(verdict.reason, Reason::Expired);
}

#[tokio::test]
async fn test_admin_reset_allows_rebinding() {
    let store = MemoryLicenseStore::new();
    seed(&store, "K", Utc::now(), 30).await;
    let validator = Validator::new(store.clone());

    assert!(validator.validate("K", "old-machine").await.unwrap().is_valid());
    store.clear_hwid("K").await.unwrap();

    let verdict = validator.validate("K", "new-machine").await.unwrap();
    assert_eq!(verdict.hwid.as_deref(), Some("new-machine"));
    let verdict = validator.validate("K", "old-machine").await.unwrap();
    assert_eq!(verdict.reason, Reason::HwidMismatch);
}

#[tokio::test]
async fn test_lost_binding_race_reports_mismatch() {
    let memory = MemoryLicenseStore::new();
    seed(&memory, "K", Utc::now(), 30).await;
    let store = RacingStore::new(memory.clone(), "winner");
    let validator = Validator::new(store);

    let verdict = validator.validate("K", "loser").await.unwrap();
    assert_eq!(verdict.reason, Reason::HwidMismatch);

    let stored = memory.find_by_key("K").await.unwrap().unwrap();
    assert_eq!(stored.hwid.as_deref(), Some("winner"));
}

#[tokio::test]
async fn test_lost_binding_race_to_same_hwid_is_valid() {
    let memory = MemoryLicenseStore::new();
    seed(&memory, "K", Utc::now(), 30).await;
    let validator = Validator::new(RacingStore::new(memory.clone(), "X"));

    let verdict = validator.validate("K", "X").await.unwrap();
    assert!(verdict.is_valid());
    assert_eq!(verdict.hwid.as_deref(), Some("X"));
}

#[tokio::test]
async fn test_deactivation_during_binding_is_not_valid() {
    let memory = MemoryLicenseStore::new();
    seed(&memory, "K", Utc::now(), 30).await;
    let validator = Validator::new(RacingStore::deactivating(memory.clone()));

    let verdict = validator.validate("K", "X").await.unwrap();
    assert_eq!(verdict, Verdict::rejected(Reason::Deactivated));

    let stored = memory.find_by_key("K").await.unwrap().unwrap();
    assert!(!stored.active);
    assert_eq!(stored.hwid, None);
}

#[tokio::test]
async fn test_endless_contention_is_an_error() {
    let memory = MemoryLicenseStore::new();
    seed(&memory, "K", Utc::now(), 30).await;
    let validator = Validator::new(RacingStore::always_losing(memory));

    let err = validator.validate("K", "X").await.unwrap_err();
    assert!(matches!(
        err,
        ValidationError::Contention { attempts } if attempts == MAX_BIND_ATTEMPTS
    ));
}

#[tokio::test]
async fn test_store_outage_is_not_a_rejection() {
    let validator = Validator::new(UnavailableStore);
    let err = validator.validate("K", "X").await.unwrap_err();
    match err {
        ValidationError::Store(e) => assert!(e.is_transient()),
        other => panic!("expected store error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_first_use_binds_exactly_one_hwid() {
    for round in 0..20 {
        let store = MemoryLicenseStore::new();
        let key = format!("KEY-{round}");
        seed(&store, &key, Utc::now(), 30).await;
        let validator = Validator::new(store.clone());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let validator = validator.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    let hwid = format!("HW-{i}");
                    let verdict = validator.validate(&key, &hwid).await.unwrap();
                    (hwid, verdict)
                })
            })
            .collect();

        let mut winners = HashSet::new();
        let mut outcomes = Vec::new();
        for handle in handles {
            let (hwid, verdict) = handle.await.unwrap();
            if verdict.is_valid() {
                winners.insert(hwid.clone());
            }
            outcomes.push((hwid, verdict));
        }

        assert_eq!(winners.len(), 1, "exactly one hwid may win");
        let bound = store.find_by_key(&key).await.unwrap().unwrap().hwid.unwrap();
        assert!(winners.contains(&bound));

        for (hwid, verdict) in outcomes {
            if hwid == bound {
                assert_eq!(verdict.hwid.as_deref(), Some(bound.as_str()));
            } else {
                assert_eq!(verdict.reason, Reason::HwidMismatch);
            }
        }
    }
}
