//! Batch processor tests: per-order isolation, reject reasons, and the
//! ledger-reconstructed usage summary.

use barista_engine::{BatchOutcome, OrderDraft, OrderEngine, OrderError, OrderItemDraft};
use barista_storage::{CafeStorage, MemoryStorage, Unit};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn item(menu_item_id: i64, quantity: i64) -> OrderItemDraft {
    OrderItemDraft {
        menu_item_id,
        quantity,
        customizations: None,
        price_at_order: None,
    }
}

fn draft(customer_id: i64, items: Vec<OrderItemDraft>) -> OrderDraft {
    OrderDraft {
        customer_id,
        payment_method: Some("cash".to_string()),
        special_instructions: None,
        items,
    }
}

struct Cafe {
    engine: OrderEngine<MemoryStorage>,
    milk: i64,
    latte: i64,
    alice: i64,
}

fn cafe() -> Cafe {
    let storage = MemoryStorage::new();
    let milk = storage.seed_ingredient("Milk", dec("1000"), Unit::Milliliters, dec("100"));
    let latte = storage.seed_menu_item("Latte", dec("4.50"), true, &[(milk, dec("200"))]);
    let alice = storage.seed_customer("Alice");
    Cafe {
        engine: OrderEngine::new(storage),
        milk,
        latte,
        alice,
    }
}

#[tokio::test]
async fn empty_batch_fails_upfront() {
    let cafe = cafe();
    let err = cafe.engine.process_batch(&[]).await.unwrap_err();
    assert!(matches!(err, OrderError::EmptyBatch));
}

/// Five candidates against 1000 ml of milk; the third wants more than
/// remains at its turn. Exactly four accepted, one rejected, and earlier
/// accepts survive.
#[tokio::test]
async fn oversized_middle_order_is_rejected_alone() {
    let cafe = cafe();
    let batch = vec![
        draft(cafe.alice, vec![item(cafe.latte, 1)]), // 200, remaining 800
        draft(cafe.alice, vec![item(cafe.latte, 1)]), // 200, remaining 600
        draft(cafe.alice, vec![item(cafe.latte, 4)]), // needs 800 > 600: rejected
        draft(cafe.alice, vec![item(cafe.latte, 1)]), // 200, remaining 400
        draft(cafe.alice, vec![item(cafe.latte, 1)]), // 200, remaining 200
    ];

    let result = cafe.engine.process_batch(&batch).await.unwrap();

    assert_eq!(result.summary.total_orders, 5);
    assert_eq!(result.summary.accepted, 4);
    assert_eq!(result.summary.rejected, 1);
    assert_eq!(result.summary.total_revenue, dec("18.00"));

    // Input order preserved; only index 2 rejected.
    let outcomes: Vec<BatchOutcome> = result.processed.iter().map(|p| p.status).collect();
    assert_eq!(
        outcomes,
        vec![
            BatchOutcome::Accepted,
            BatchOutcome::Accepted,
            BatchOutcome::Rejected,
            BatchOutcome::Accepted,
            BatchOutcome::Accepted,
        ]
    );
    assert_eq!(result.processed[2].input_index, 2);
    let reason = result.processed[2].reject_reason.as_deref().unwrap();
    assert!(reason.contains("insufficient stock"), "{reason}");
    assert!(reason.contains("Milk"), "{reason}");

    // Revenue matches the sum of accepted totals.
    let accepted_total: Decimal = result
        .processed
        .iter()
        .filter_map(|p| p.total)
        .sum();
    assert_eq!(accepted_total, result.summary.total_revenue);

    // Usage summary reconstructed from the ledger: 4 x 200 ml used, 200 left.
    assert_eq!(result.summary.inventory_used.len(), 1);
    let usage = &result.summary.inventory_used[0];
    assert_eq!(usage.ingredient_id, cafe.milk);
    assert_eq!(usage.name, "Milk");
    assert_eq!(usage.quantity_used, dec("800"));
    assert_eq!(usage.remaining_stock, dec("200"));

    // The rejected candidate left no residue.
    assert_eq!(
        cafe.engine.storage().get_ingredient(cafe.milk).await.unwrap().quantity,
        dec("200")
    );
}

#[tokio::test]
async fn zero_item_candidate_rejected_without_ledger_call() {
    let cafe = cafe();
    let batch = vec![
        draft(cafe.alice, vec![]),
        draft(cafe.alice, vec![item(cafe.latte, 1)]),
    ];

    let result = cafe.engine.process_batch(&batch).await.unwrap();

    assert_eq!(result.summary.accepted, 1);
    assert_eq!(result.summary.rejected, 1);
    assert_eq!(result.processed[0].status, BatchOutcome::Rejected);
    assert_eq!(
        result.processed[0].reject_reason.as_deref(),
        Some("empty order items")
    );
    assert_eq!(result.processed[1].status, BatchOutcome::Accepted);
}

#[tokio::test]
async fn customer_names_resolve_with_placeholder_fallback() {
    let cafe = cafe();
    let batch = vec![
        draft(cafe.alice, vec![item(cafe.latte, 1)]),
        draft(9876, vec![item(cafe.latte, 1)]),
    ];

    let result = cafe.engine.process_batch(&batch).await.unwrap();

    assert_eq!(result.processed[0].customer_name, "Alice");
    // Unknown customer is not a hard failure; the order still processes.
    assert_eq!(result.processed[1].customer_name, "Customer 9876");
    assert_eq!(result.summary.accepted, 2);
}

#[tokio::test]
async fn accepted_orders_persist_and_are_reconcilable() {
    let cafe = cafe();
    let batch = vec![
        draft(cafe.alice, vec![item(cafe.latte, 2)]),
        draft(cafe.alice, vec![item(cafe.latte, 1)]),
    ];

    let result = cafe.engine.process_batch(&batch).await.unwrap();
    assert_eq!(result.summary.accepted, 2);

    for processed in &result.processed {
        let id = processed.order_id.unwrap();
        let order = cafe.engine.storage().get_order(id).await.unwrap();
        assert_eq!(Some(order.total_price), processed.total);

        let used = cafe.engine.usage_for_order(id).await.unwrap();
        assert!(used[&cafe.milk] > Decimal::ZERO);
    }
}

#[tokio::test]
async fn batch_of_one_oversized_order_rejects_everything() {
    let cafe = cafe();
    let result = cafe
        .engine
        .process_batch(&[draft(cafe.alice, vec![item(cafe.latte, 6)])])
        .await
        .unwrap();

    assert_eq!(result.summary.accepted, 0);
    assert_eq!(result.summary.rejected, 1);
    assert_eq!(result.summary.total_revenue, Decimal::ZERO);
    assert!(result.summary.inventory_used.is_empty());
}
