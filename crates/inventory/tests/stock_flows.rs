//! Integration tests exercising full receive/deduct flows, including the
//! concurrent-deduction property: parallel deductions against one product
//! must never take the quantity below zero, no matter how they interleave.

use std::sync::Arc;

use inventory::{DeductStock, InventoryError, InventoryStore, ReceiveStock};
use ledger::{AuditQuery, InMemoryLedger, MutationKind, ProductId};

fn new_store() -> Arc<InventoryStore<InMemoryLedger>> {
    Arc::new(InventoryStore::new(InMemoryLedger::new()))
}

#[tokio::test]
async fn receive_and_deduct_round_trip() {
    let store = new_store();

    store
        .receive_stock(ReceiveStock::new("P1", "Widget", 10, "B1"))
        .await
        .unwrap();
    let record = store.deduct_stock(DeductStock::new("P1", 4)).await.unwrap();
    assert_eq!(record.quantity, 6);

    let entries = store
        .audit(AuditQuery::new().product_id("P1"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, MutationKind::Receipt);
    assert_eq!(entries[1].kind, MutationKind::Order);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deductions_never_overdraw() {
    let store = new_store();

    store
        .receive_stock(ReceiveStock::new("P1", "Widget", 10, "B1"))
        .await
        .unwrap();

    // 8 tasks each try to deduct 3; at most 3 can succeed (9 <= 10 < 12).
    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.deduct_stock(DeductStock::new("P1", 3)).await
        }));
    }

    let mut successes = 0u32;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(InventoryError::InsufficientQuantity { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let record = store.get_by_id(&ProductId::new("P1")).await.unwrap();
    assert!(successes * 3 <= 10);
    assert_eq!(record.quantity, 10 - successes * 3);

    // One Order entry per successful deduction, none for the failures.
    let orders = store
        .audit(AuditQuery::new().kind(MutationKind::Order))
        .await
        .unwrap();
    assert_eq!(orders.len(), successes as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deductions_exhaust_exactly_the_stock() {
    let store = new_store();

    store
        .receive_stock(ReceiveStock::new("P1", "Widget", 6, "B1"))
        .await
        .unwrap();

    // 12 tasks each deduct 1; exactly 6 succeed.
    let mut handles = Vec::new();
    for _ in 0..12 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.deduct_stock(DeductStock::new("P1", 1)).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 6);
    let record = store.get_by_id(&ProductId::new("P1")).await.unwrap();
    assert_eq!(record.quantity, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mixed_mutations_keep_the_ledger_consistent() {
    let store = new_store();

    store
        .receive_stock(ReceiveStock::new("P1", "Widget", 50, "B1"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                store
                    .receive_stock(ReceiveStock::new("P1", "Widget", 5, "B1"))
                    .await
                    .map(|_| 5i64)
            } else {
                store
                    .deduct_stock(DeductStock::new("P1", 4))
                    .await
                    .map(|_| -4i64)
            }
        }));
    }

    let mut expected: i64 = 50;
    for handle in handles {
        if let Ok(delta) = handle.await.unwrap() {
            expected += delta;
        }
    }

    let record = store.get_by_id(&ProductId::new("P1")).await.unwrap();
    assert_eq!(i64::from(record.quantity), expected);

    // The audit chain matches the final state: summed deltas equal the
    // quantity, and consecutive entries link old to new.
    let entries = store
        .audit(AuditQuery::new().product_id("P1"))
        .await
        .unwrap();
    let total: i64 = entries.iter().map(|e| e.delta()).sum();
    assert_eq!(total, i64::from(record.quantity));
    for pair in entries.windows(2) {
        assert_eq!(pair[0].new_quantity, pair[1].old_quantity);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_receipts_on_different_products_are_independent() {
    let store = new_store();

    let mut handles = Vec::new();
    for i in 0..10u32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let product = format!("P{i}");
            store
                .receive_stock(ReceiveStock::new(product.as_str(), "Widget", i + 1, "B1"))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 10);
    for record in records {
        let entries = store
            .audit(AuditQuery::new().product_id(record.product_id.clone()))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].new_quantity, record.quantity);
    }
}
