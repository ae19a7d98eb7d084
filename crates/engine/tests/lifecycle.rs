//! End-to-end lifecycle tests: create, update, delete, close, and status
//! progression against the in-memory reference backend.

use std::collections::BTreeMap;

use barista_engine::{OrderDraft, OrderEngine, OrderError, OrderItemDraft};
use barista_storage::{CafeStorage, MemoryStorage, OrderStatus, TransactionKind, Unit};
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
        payment_method: Some("card".to_string()),
        special_instructions: None,
        items,
    }
}

struct Cafe {
    engine: OrderEngine<MemoryStorage>,
    milk: i64,
    beans: i64,
    latte: i64,
    espresso: i64,
    alice: i64,
}

/// Milk 1000 ml, beans 500 g; latte = 200 milk + 18 beans at 4.50;
/// espresso = 18 beans at 2.50.
fn cafe() -> Cafe {
    let storage = MemoryStorage::new();
    let milk = storage.seed_ingredient("Milk", dec("1000"), Unit::Milliliters, dec("100"));
    let beans = storage.seed_ingredient("Espresso Beans", dec("500"), Unit::Grams, dec("50"));
    let latte = storage.seed_menu_item(
        "Latte",
        dec("4.50"),
        true,
        &[(milk, dec("200")), (beans, dec("18"))],
    );
    let espresso = storage.seed_menu_item("Espresso", dec("2.50"), true, &[(beans, dec("18"))]);
    let alice = storage.seed_customer("Alice");
    Cafe {
        engine: OrderEngine::new(storage),
        milk,
        beans,
        latte,
        espresso,
        alice,
    }
}

// ── Create ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_deducts_stock_and_appends_ledger() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 2)]))
        .await
        .unwrap();

    let storage = cafe.engine.storage();
    let order = storage.get_order(id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price, dec("9.00"));

    assert_eq!(storage.get_ingredient(cafe.milk).await.unwrap().quantity, dec("600"));
    assert_eq!(storage.get_ingredient(cafe.beans).await.unwrap().quantity, dec("464"));

    let txs = storage.list_transactions_for_order(id).await.unwrap();
    assert_eq!(txs.len(), 2);
    assert!(txs.iter().all(|t| t.kind == TransactionKind::OrderUsage));
    let by_ingredient: BTreeMap<i64, Decimal> =
        txs.iter().map(|t| (t.ingredient_id, t.delta)).collect();
    assert_eq!(by_ingredient[&cafe.milk], dec("-400"));
    assert_eq!(by_ingredient[&cafe.beans], dec("-36"));

    let history = storage.get_status_history(id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OrderStatus::Pending);
}

#[tokio::test]
async fn create_recomputes_total_ignoring_client_price() {
    let cafe = cafe();
    let mut cheap = item(cafe.latte, 2);
    cheap.price_at_order = Some(dec("0.01"));

    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![cheap]))
        .await
        .unwrap();

    let storage = cafe.engine.storage();
    assert_eq!(storage.get_order(id).await.unwrap().total_price, dec("9.00"));
    let items = storage.get_order_items_committed(id).await.unwrap();
    assert_eq!(items[0].price_at_order, dec("4.50"));
}

#[tokio::test]
async fn create_empty_order_fails() {
    let cafe = cafe();
    let err = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::EmptyOrder));
}

#[tokio::test]
async fn create_zero_quantity_item_fails() {
    let cafe = cafe();
    let err = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 0)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidItemQuantity { .. }));
}

#[tokio::test]
async fn create_shortage_performs_no_writes() {
    let cafe = cafe();
    // 6 lattes need 1200 ml milk; only 1000 in stock.
    let err = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 6)]))
        .await
        .unwrap_err();

    match err {
        OrderError::InsufficientInventory {
            ingredient,
            needed,
            available,
            ..
        } => {
            assert_eq!(ingredient, "Milk");
            assert_eq!(needed, dec("1200"));
            assert_eq!(available, dec("1000"));
        }
        other => panic!("expected InsufficientInventory, got {other:?}"),
    }

    let storage = cafe.engine.storage();
    assert_eq!(storage.get_ingredient(cafe.milk).await.unwrap().quantity, dec("1000"));
    assert_eq!(storage.get_ingredient(cafe.beans).await.unwrap().quantity, dec("500"));
}

#[tokio::test]
async fn create_with_inactive_item_fails_not_found() {
    let cafe = cafe();
    let storage = cafe.engine.storage();
    let retired = storage.seed_menu_item("Flat White", dec("4.00"), false, &[]);

    let err = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(retired, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));
}

// ── Milk/Latte scenario ─────────────────────────────────────────────────────

#[tokio::test]
async fn scarce_milk_scenario() {
    let storage = MemoryStorage::new();
    let milk = storage.seed_ingredient("Milk", dec("200"), Unit::Milliliters, dec("50"));
    let latte = storage.seed_menu_item("Latte", dec("4.50"), true, &[(milk, dec("200"))]);
    let alice = storage.seed_customer("Alice");
    let engine = OrderEngine::new(storage);

    // First latte drains the milk to zero.
    let first = engine
        .create_order(&draft(alice, vec![item(latte, 1)]))
        .await
        .unwrap();
    assert_eq!(
        engine.storage().get_ingredient(milk).await.unwrap().quantity,
        dec("0")
    );

    // Second latte cannot be covered.
    let err = engine
        .create_order(&draft(alice, vec![item(latte, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientInventory { .. }));

    // Deleting the first restores the full 200 ml.
    engine.delete_order(first).await.unwrap();
    assert_eq!(
        engine.storage().get_ingredient(milk).await.unwrap().quantity,
        dec("200")
    );
}

// ── Update ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_applies_only_net_delta() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();
    assert_eq!(
        cafe.engine.storage().get_ingredient(cafe.milk).await.unwrap().quantity,
        dec("800")
    );

    // Grow to two lattes: only one more latte's worth is deducted.
    cafe.engine
        .update_order(id, &draft(cafe.alice, vec![item(cafe.latte, 2)]))
        .await
        .unwrap();

    let storage = cafe.engine.storage();
    assert_eq!(storage.get_ingredient(cafe.milk).await.unwrap().quantity, dec("600"));
    assert_eq!(storage.get_order(id).await.unwrap().total_price, dec("9.00"));

    // Ledger shows corrected consumption under the same reference.
    let used = cafe.engine.usage_for_order(id).await.unwrap();
    assert_eq!(used[&cafe.milk], dec("400"));
    assert_eq!(used[&cafe.beans], dec("36"));
}

#[tokio::test]
async fn update_shrinking_order_restocks() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 2)]))
        .await
        .unwrap();

    cafe.engine
        .update_order(id, &draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();

    let storage = cafe.engine.storage();
    assert_eq!(storage.get_ingredient(cafe.milk).await.unwrap().quantity, dec("800"));
    let used = cafe.engine.usage_for_order(id).await.unwrap();
    assert_eq!(used[&cafe.milk], dec("200"));
    assert_eq!(storage.get_order(id).await.unwrap().total_price, dec("4.50"));
}

#[tokio::test]
async fn update_switching_items_nets_per_ingredient() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();

    // Latte -> espresso: milk fully restocked, bean usage unchanged.
    cafe.engine
        .update_order(id, &draft(cafe.alice, vec![item(cafe.espresso, 1)]))
        .await
        .unwrap();

    let storage = cafe.engine.storage();
    assert_eq!(storage.get_ingredient(cafe.milk).await.unwrap().quantity, dec("1000"));
    assert_eq!(storage.get_ingredient(cafe.beans).await.unwrap().quantity, dec("482"));

    let used = cafe.engine.usage_for_order(id).await.unwrap();
    assert_eq!(used.get(&cafe.milk), None);
    assert_eq!(used[&cafe.beans], dec("18"));
}

#[tokio::test]
async fn update_shortage_rolls_back_everything() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();

    // 800 ml remain; growing to 6 lattes needs a net 1000 ml more.
    let err = cafe
        .engine
        .update_order(id, &draft(cafe.alice, vec![item(cafe.latte, 6)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientInventory { .. }));

    let storage = cafe.engine.storage();
    assert_eq!(storage.get_ingredient(cafe.milk).await.unwrap().quantity, dec("800"));
    let items = storage.get_order_items_committed(id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 1);
    assert_eq!(storage.get_order(id).await.unwrap().total_price, dec("4.50"));
}

#[tokio::test]
async fn update_unknown_order_fails_not_found() {
    let cafe = cafe();
    let err = cafe
        .engine
        .update_order(4242, &draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));
}

#[tokio::test]
async fn update_terminal_order_is_a_state_error() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();
    cafe.engine.close_order(id).await.unwrap();

    let err = cafe
        .engine
        .update_order(id, &draft(cafe.alice, vec![item(cafe.latte, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidStateTransition { to: None, .. }
    ));

    // Stock unchanged by the rejected update.
    assert_eq!(
        cafe.engine.storage().get_ingredient(cafe.milk).await.unwrap().quantity,
        dec("800")
    );
}

#[tokio::test]
async fn recomputed_total_is_stable_without_price_changes() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 2), item(cafe.espresso, 1)]))
        .await
        .unwrap();
    let first = cafe.engine.storage().get_order(id).await.unwrap().total_price;

    cafe.engine
        .update_order(
            id,
            &draft(cafe.alice, vec![item(cafe.latte, 2), item(cafe.espresso, 1)]),
        )
        .await
        .unwrap();
    let second = cafe.engine.storage().get_order(id).await.unwrap().total_price;

    assert_eq!(first, dec("11.50"));
    assert_eq!(first, second);
}

#[tokio::test]
async fn update_after_price_change_uses_current_price() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();

    cafe.engine.update_menu_price(cafe.latte, dec("5.00")).await.unwrap();
    cafe.engine
        .update_order(id, &draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();

    let storage = cafe.engine.storage();
    let order = storage.get_order(id).await.unwrap();
    assert_eq!(order.total_price, dec("5.00"));
    let items = storage.get_order_items_committed(id).await.unwrap();
    assert_eq!(items[0].price_at_order, dec("5.00"));

    let history = storage.get_price_history(cafe.latte).await.unwrap();
    assert_eq!(history.len(), 1);
}

// ── Delete ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_restock_exactly_cancels_usage() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 2), item(cafe.espresso, 1)]))
        .await
        .unwrap();

    cafe.engine.delete_order(id).await.unwrap();

    let storage = cafe.engine.storage();
    assert_eq!(storage.get_ingredient(cafe.milk).await.unwrap().quantity, dec("1000"));
    assert_eq!(storage.get_ingredient(cafe.beans).await.unwrap().quantity, dec("500"));
    assert!(matches!(
        storage.get_order(id).await,
        Err(barista_storage::StorageError::OrderNotFound { .. })
    ));
    assert!(storage.get_order_items_committed(id).await.unwrap().is_empty());

    // Usage rows and deletion rows for the order sum to net zero.
    let txs = storage.list_transactions_for_order(id).await.unwrap();
    let net: Decimal = txs.iter().map(|t| t.delta).sum();
    assert_eq!(net, Decimal::ZERO);
    assert!(txs.iter().any(|t| t.kind == TransactionKind::OrderDeletion));
    let deletion_note = txs
        .iter()
        .find(|t| t.kind == TransactionKind::OrderDeletion)
        .and_then(|t| t.note.as_deref())
        .unwrap();
    assert!(deletion_note.contains(&format!("#{id}")));
}

#[tokio::test]
async fn delete_unknown_order_fails_not_found() {
    let cafe = cafe();
    let err = cafe.engine.delete_order(999).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));
}

// ── Close and status machine ────────────────────────────────────────────────

#[tokio::test]
async fn close_on_preparing_delivers() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();
    cafe.engine.set_order_status(id, OrderStatus::Accepted).await.unwrap();
    cafe.engine.set_order_status(id, OrderStatus::Preparing).await.unwrap();

    cafe.engine.close_order(id).await.unwrap();

    let storage = cafe.engine.storage();
    let order = storage.get_order(id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);

    let history = storage.get_status_history(id).await.unwrap();
    let statuses: Vec<OrderStatus> = history.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Preparing,
            OrderStatus::Delivered
        ]
    );
}

#[tokio::test]
async fn close_on_delivered_fails() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();
    cafe.engine.close_order(id).await.unwrap();

    let err = cafe.engine.close_order(id).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidStateTransition {
            from: OrderStatus::Delivered,
            ..
        }
    ));
}

#[tokio::test]
async fn close_on_cancelled_fails() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();
    cafe.engine.set_order_status(id, OrderStatus::Cancelled).await.unwrap();

    let err = cafe.engine.close_order(id).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidStateTransition {
            from: OrderStatus::Cancelled,
            ..
        }
    ));
}

#[tokio::test]
async fn close_does_not_touch_inventory() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();
    let before = cafe.engine.storage().get_ingredient(cafe.milk).await.unwrap().quantity;

    cafe.engine.close_order(id).await.unwrap();

    let storage = cafe.engine.storage();
    assert_eq!(storage.get_ingredient(cafe.milk).await.unwrap().quantity, before);
    // No ledger rows beyond the original create.
    let txs = storage.list_transactions_for_order(id).await.unwrap();
    assert!(txs.iter().all(|t| t.kind == TransactionKind::OrderUsage));
}

#[tokio::test]
async fn status_machine_rejects_skips() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 1)]))
        .await
        .unwrap();

    let err = cafe
        .engine
        .set_order_status(id, OrderStatus::Ready)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidStateTransition {
            from: OrderStatus::Pending,
            to: Some(OrderStatus::Ready),
            ..
        }
    ));
}

// ── Ledger reconciliation ───────────────────────────────────────────────────

#[tokio::test]
async fn usage_rows_equal_negated_requirements() {
    let cafe = cafe();
    let id = cafe
        .engine
        .create_order(&draft(cafe.alice, vec![item(cafe.latte, 3)]))
        .await
        .unwrap();

    let txs = cafe
        .engine
        .storage()
        .list_transactions_for_order(id)
        .await
        .unwrap();
    let mut sums: BTreeMap<i64, Decimal> = BTreeMap::new();
    for tx in txs.iter().filter(|t| t.kind == TransactionKind::OrderUsage) {
        *sums.entry(tx.ingredient_id).or_insert(Decimal::ZERO) += tx.delta;
    }
    // 3 lattes: 600 milk, 54 beans.
    assert_eq!(sums[&cafe.milk], dec("-600"));
    assert_eq!(sums[&cafe.beans], dec("-54"));
}
