//! Transaction Properties
//!
//! Durability after commit, isolation of staged writes, abort as a no-op,
//! the capacity bound, and inert handles after termination.

use crate::common::*;

// ============================================================================
// Durability
// ============================================================================

#[test]
fn committed_writes_visible_to_later_transactions() {
    let coordinator = cluster(2, 100);
    let txn = coordinator.begin();
    txn.write(0, "a", "1").unwrap();
    txn.write(1, "b", "2").unwrap();
    txn.commit().unwrap();

    for _ in 0..3 {
        assert_eq!(get(&coordinator, 0, "a").as_deref(), Some("1"));
        assert_eq!(get(&coordinator, 1, "b").as_deref(), Some("2"));
    }
}

#[test]
fn overwrite_replaces_committed_value_and_accounting() {
    let coordinator = cluster(1, 100);
    put(&coordinator, 0, "key", "short");
    put(&coordinator, 0, "key", "a-much-longer-value");

    assert_eq!(get(&coordinator, 0, "key").as_deref(), Some("a-much-longer-value"));
    assert_eq!(coordinator.node(0).unwrap().memory_used(), 3 + 19);
    assert_capacity_invariant(&coordinator);
}

// ============================================================================
// Isolation
// ============================================================================

#[test]
fn staged_writes_invisible_to_other_transactions() {
    let coordinator = cluster(1, 100);
    put(&coordinator, 0, "k", "committed");

    let writer = coordinator.begin();
    writer.write(0, "k", "staged").unwrap();
    writer.write(0, "fresh", "staged").unwrap();

    let reader = coordinator.begin();
    assert_eq!(reader.read(0, "k").unwrap().as_deref(), Some("committed"));
    assert_eq!(reader.read(0, "fresh").unwrap(), None);
    assert_eq!(writer.read(0, "k").unwrap().as_deref(), Some("staged"));
}

#[test]
fn reads_do_not_touch_nodes() {
    let coordinator = cluster(3, 100);
    let txn = coordinator.begin();
    txn.read(0, "x").unwrap();
    txn.read(2, "y").unwrap();
    txn.write(1, "z", "v").unwrap();
    assert_eq!(txn.touched_nodes(), vec![1]);
}

// ============================================================================
// Abort
// ============================================================================

#[test]
fn abort_leaves_committed_state_identical() {
    let coordinator = cluster(3, 100);
    put(&coordinator, 0, "a", "1");
    put(&coordinator, 2, "c", "3");
    let before = cluster_state(&coordinator);

    let txn = coordinator.begin();
    txn.write(0, "a", "changed").unwrap();
    txn.write(1, "b", "new").unwrap();
    txn.write(2, "c", "changed").unwrap();
    txn.abort().unwrap();

    assert_eq!(txn.status(), TransactionStatus::Aborted);
    assert_eq!(cluster_state(&coordinator), before);
    assert_no_pending(&coordinator);
}

#[test]
fn dropping_active_transaction_discards_writes() {
    let coordinator = cluster(1, 100);
    {
        let txn = coordinator.begin();
        txn.write(0, "k", "v").unwrap();
    }
    assert_no_pending(&coordinator);
    assert_eq!(get(&coordinator, 0, "k"), None);
    assert!(coordinator.active_transactions().is_empty());
}

// ============================================================================
// Capacity Bound
// ============================================================================

#[test]
fn rejected_write_changes_nothing() {
    let coordinator = cluster(1, 10);
    put(&coordinator, 0, "ab", "cdef");
    let before = cluster_state(&coordinator);

    let txn = coordinator.begin();
    txn.write(0, "x", "y").unwrap();
    let err = txn.write(0, "big", "0123456789").unwrap_err();
    assert_eq!(err.error_code(), "InsufficientMemory");

    assert_eq!(cluster_state(&coordinator), before);
    // earlier staged write survives the rejection
    assert_eq!(txn.read(0, "x").unwrap().as_deref(), Some("y"));
    txn.commit().unwrap();
    assert_capacity_invariant(&coordinator);
}

#[test]
fn shrinking_overwrite_frees_room() {
    let coordinator = cluster(1, 20);
    put(&coordinator, 0, "k", &"v".repeat(19));

    let txn = coordinator.begin();
    assert!(txn.write(0, "other", "x").is_err());
    txn.write(0, "k", "v").unwrap();
    txn.commit().unwrap();

    put(&coordinator, 0, "other", "x");
    assert_eq!(coordinator.node(0).unwrap().memory_used(), 2 + 6);
}

#[test]
fn aggregate_overflow_caught_at_prepare() {
    let coordinator = cluster(1, 20);
    let txn = coordinator.begin();
    // each write fits alone, together they do not
    txn.write(0, "a", &"x".repeat(9)).unwrap();
    txn.write(0, "b", &"x".repeat(9)).unwrap();
    txn.write(0, "c", &"x".repeat(9)).unwrap();

    let err = txn.commit().unwrap_err();
    assert!(matches!(err, KvError::PrepareFailed { node_id: 0, .. }));
    assert_eq!(txn.status(), TransactionStatus::Aborted);
    assert_eq!(coordinator.node(0).unwrap().memory_used(), 0);
    assert_no_pending(&coordinator);
}

// ============================================================================
// Terminal Idempotence
// ============================================================================

#[test]
fn second_commit_or_abort_is_rejected() {
    let coordinator = cluster(1, 100);
    let txn = coordinator.begin();
    txn.write(0, "k", "v").unwrap();
    txn.commit().unwrap();
    let after_commit = cluster_state(&coordinator);

    for _ in 0..2 {
        let err = txn.commit().unwrap_err();
        assert_eq!(
            err,
            KvError::TransactionCompleted {
                txn_id: txn.id(),
                status: "Committed"
            }
        );
        assert_eq!(txn.abort().unwrap_err().error_code(), "TransactionCompleted");
    }
    assert_eq!(cluster_state(&coordinator), after_commit);
    assert_eq!(coordinator.metrics().total_committed, 1);
}

#[test]
fn terminal_transaction_rejects_reads_and_writes() {
    let coordinator = cluster(2, 100);
    let txn = coordinator.begin();
    txn.abort().unwrap();

    assert_eq!(txn.read(0, "k").unwrap_err().error_code(), "TransactionCompleted");
    assert_eq!(txn.write(1, "k", "v").unwrap_err().error_code(), "TransactionCompleted");
    // status check wins over node and key validation
    assert_eq!(txn.write(9, "", "v").unwrap_err().error_code(), "TransactionCompleted");
    assert_no_pending(&coordinator);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn invalid_node_and_empty_key() {
    let coordinator = cluster(2, 100);
    let txn = coordinator.begin();

    assert_eq!(txn.read(2, "k").unwrap_err(), KvError::invalid_node(2, 2));
    assert_eq!(txn.write(5, "k", "v").unwrap_err(), KvError::invalid_node(5, 2));
    assert_eq!(txn.read(0, "").unwrap_err(), KvError::EmptyKey);
    assert_eq!(txn.write(0, "", "v").unwrap_err(), KvError::EmptyKey);
    // empty values are fine
    txn.write(0, "k", "").unwrap();
    assert_eq!(txn.read(0, "k").unwrap().as_deref(), Some(""));
    assert!(txn.is_active());
}
