use std::future::Future;

use super::{dec, make_order, make_order_item, make_transaction, Fixture, TestResult, STAMP};
use crate::record::{OrderStatus, TransactionKind};
use crate::{CafeStorage, StorageError};

pub(super) async fn run_commit_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "commit",
        "full_order_pipeline_all_committed",
        full_order_pipeline_all_committed(factory).await,
    ));
    results.push(TestResult::from_result(
        "commit",
        "full_order_pipeline_all_aborted",
        full_order_pipeline_all_aborted(factory).await,
    ));
    results.push(TestResult::from_result(
        "commit",
        "delete_order_and_items_committed",
        delete_order_and_items_committed(factory).await,
    ));
    results.push(TestResult::from_result(
        "commit",
        "price_update_and_history_committed",
        price_update_and_history_committed(factory).await,
    ));
    results.push(TestResult::from_result(
        "commit",
        "commit_empty_snapshot",
        commit_empty_snapshot(factory).await,
    ));
    results.push(TestResult::from_result(
        "commit",
        "multiple_commits_accumulate",
        multiple_commits_accumulate(factory).await,
    ));

    results
}

/// One snapshot: order + item + stock deduction + ledger row + history row.
/// After commit, every table shows the write.
async fn full_order_pipeline_all_committed<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let order_id = s
        .insert_order(&mut snap, make_order(fx.customer, "4.50"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_order_item(&mut snap, make_order_item(order_id, fx.latte, 1, "4.50"))
        .await
        .map_err(|e| e.to_string())?;
    s.adjust_ingredient_quantity(&mut snap, fx.milk, dec("-200"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_inventory_transaction(
        &mut snap,
        make_transaction(fx.milk, "-200", TransactionKind::OrderUsage, Some(order_id)),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.insert_status_history(&mut snap, order_id, OrderStatus::Pending, STAMP)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let order = s.get_order(order_id).await.map_err(|e| e.to_string())?;
    if order.status != OrderStatus::Pending {
        return Err(format!("expected pending order, got {}", order.status));
    }
    let items = s
        .get_order_items_committed(order_id)
        .await
        .map_err(|e| e.to_string())?;
    if items.len() != 1 {
        return Err(format!("expected 1 item, got {}", items.len()));
    }
    let milk = s.get_ingredient(fx.milk).await.map_err(|e| e.to_string())?;
    if milk.quantity != dec("800") {
        return Err(format!("expected milk 800, got {}", milk.quantity));
    }
    let txs = s
        .list_transactions_for_order(order_id)
        .await
        .map_err(|e| e.to_string())?;
    if txs.len() != 1 || txs[0].delta != dec("-200") {
        return Err(format!("expected one -200 ledger row, got {txs:?}"));
    }
    let history = s
        .get_status_history(order_id)
        .await
        .map_err(|e| e.to_string())?;
    if history.len() != 1 || history[0].status != OrderStatus::Pending {
        return Err(format!("expected one pending history row, got {history:?}"));
    }
    Ok(())
}

/// Same pipeline, aborted: no table shows any write.
async fn full_order_pipeline_all_aborted<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let order_id = s
        .insert_order(&mut snap, make_order(fx.customer, "4.50"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_order_item(&mut snap, make_order_item(order_id, fx.latte, 1, "4.50"))
        .await
        .map_err(|e| e.to_string())?;
    s.adjust_ingredient_quantity(&mut snap, fx.milk, dec("-200"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_inventory_transaction(
        &mut snap,
        make_transaction(fx.milk, "-200", TransactionKind::OrderUsage, Some(order_id)),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    if !matches!(
        s.get_order(order_id).await,
        Err(StorageError::OrderNotFound { .. })
    ) {
        return Err("aborted order still present".to_string());
    }
    let milk = s.get_ingredient(fx.milk).await.map_err(|e| e.to_string())?;
    if milk.quantity != dec("1000") {
        return Err(format!("expected milk 1000 after abort, got {}", milk.quantity));
    }
    let txs = s
        .list_transactions_for_order(order_id)
        .await
        .map_err(|e| e.to_string())?;
    if !txs.is_empty() {
        return Err(format!("expected no ledger rows after abort, got {}", txs.len()));
    }
    Ok(())
}

/// Deleting an order and its items in one snapshot removes both.
async fn delete_order_and_items_committed<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let order_id = s
        .insert_order(&mut snap, make_order(fx.customer, "2.50"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_order_item(&mut snap, make_order_item(order_id, fx.espresso, 1, "2.50"))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let mut snap2 = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.delete_order_items(&mut snap2, order_id)
        .await
        .map_err(|e| e.to_string())?;
    s.delete_order(&mut snap2, order_id)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap2).await.map_err(|e| e.to_string())?;

    if !matches!(
        s.get_order(order_id).await,
        Err(StorageError::OrderNotFound { .. })
    ) {
        return Err("deleted order still present".to_string());
    }
    let items = s
        .get_order_items_committed(order_id)
        .await
        .map_err(|e| e.to_string())?;
    if !items.is_empty() {
        return Err(format!("expected no items, got {}", items.len()));
    }
    Ok(())
}

/// A price change and its history row commit together.
async fn price_update_and_history_committed<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.update_menu_item_price(&mut snap, fx.latte, dec("5.00"), STAMP)
        .await
        .map_err(|e| e.to_string())?;
    s.insert_price_history(&mut snap, fx.latte, dec("4.50"), dec("5.00"), STAMP)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let mut snap2 = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let item = s
        .get_menu_item(&mut snap2, fx.latte)
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap2).await.map_err(|e| e.to_string())?;
    if item.price != dec("5.00") {
        return Err(format!("expected price 5.00, got {}", item.price));
    }

    let history = s
        .get_price_history(fx.latte)
        .await
        .map_err(|e| e.to_string())?;
    if history.len() != 1 || history[0].old_price != dec("4.50") {
        return Err(format!("expected one 4.50->5.00 history row, got {history:?}"));
    }
    Ok(())
}

/// Begin + commit with no operations in between must not error.
async fn commit_empty_snapshot<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, _fx) = factory().await;
    let snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

/// Three separate snapshot+commits each add an order; all three visible.
async fn multiple_commits_accumulate<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut ids = Vec::new();
    for total in ["4.50", "2.50", "7.00"] {
        let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
        let id = s
            .insert_order(&mut snap, make_order(fx.customer, total))
            .await
            .map_err(|e| e.to_string())?;
        s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
        ids.push(id);
    }

    for id in ids {
        s.get_order(id).await.map_err(|e| e.to_string())?;
    }
    Ok(())
}
