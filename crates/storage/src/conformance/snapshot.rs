use std::future::Future;

use super::{dec, make_order, make_order_item, Fixture, TestResult, STAMP};
use crate::record::OrderStatus;
use crate::{CafeStorage, StorageError};

pub(super) async fn run_snapshot_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "snapshot",
        "uncommitted_order_invisible",
        uncommitted_order_invisible(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "uncommitted_adjustment_invisible",
        uncommitted_adjustment_invisible(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "snapshot_reads_own_order_writes",
        snapshot_reads_own_order_writes(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "abort_discards_order_and_items",
        abort_discards_order_and_items(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "abort_discards_status_update",
        abort_discards_status_update(factory).await,
    ));

    results
}

/// An order inserted in an open snapshot is invisible to committed reads.
async fn uncommitted_order_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
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

    match s.get_order(order_id).await {
        Err(StorageError::OrderNotFound { .. }) => {}
        Ok(_) => return Err("uncommitted order visible to committed read".to_string()),
        Err(e) => return Err(format!("unexpected error: {e}")),
    }

    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

/// A stock adjustment in an open snapshot is invisible to committed reads.
async fn uncommitted_adjustment_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.adjust_ingredient_quantity(&mut snap, fx.milk, dec("-250"))
        .await
        .map_err(|e| e.to_string())?;

    let committed = s.get_ingredient(fx.milk).await.map_err(|e| e.to_string())?;
    if committed.quantity != dec("1000") {
        return Err(format!(
            "expected committed milk 1000, got {}",
            committed.quantity
        ));
    }

    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

/// Order items inserted in a snapshot are visible to that snapshot's reads.
async fn snapshot_reads_own_order_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let order_id = s
        .insert_order(&mut snap, make_order(fx.customer, "9.00"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_order_item(&mut snap, make_order_item(order_id, fx.latte, 2, "4.50"))
        .await
        .map_err(|e| e.to_string())?;

    let order = s
        .get_order_for_update(&mut snap, order_id)
        .await
        .map_err(|e| e.to_string())?;
    if order.total_price != dec("9.00") {
        return Err(format!("expected total 9.00, got {}", order.total_price));
    }

    let items = s
        .get_order_items(&mut snap, order_id)
        .await
        .map_err(|e| e.to_string())?;
    if items.len() != 1 || items[0].quantity != 2 {
        return Err(format!("expected 1 item with quantity 2, got {items:?}"));
    }

    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

/// After abort, neither the order nor its items exist.
async fn abort_discards_order_and_items<S, F, Fut>(factory: &F) -> Result<(), String>
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
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    if !matches!(
        s.get_order(order_id).await,
        Err(StorageError::OrderNotFound { .. })
    ) {
        return Err("aborted order still present".to_string());
    }
    let items = s
        .get_order_items_committed(order_id)
        .await
        .map_err(|e| e.to_string())?;
    if !items.is_empty() {
        return Err(format!("expected no items after abort, got {}", items.len()));
    }
    Ok(())
}

/// A status update rolled back by abort leaves the committed row unchanged.
async fn abort_discards_status_update<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    // Commit an order first.
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let order_id = s
        .insert_order(&mut snap, make_order(fx.customer, "4.50"))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    // Flip the status in a second snapshot, then abort.
    let mut snap2 = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let mut order = s
        .get_order_for_update(&mut snap2, order_id)
        .await
        .map_err(|e| e.to_string())?;
    order.status = OrderStatus::Delivered;
    order.updated_at = STAMP.to_string();
    s.update_order(&mut snap2, order)
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap2).await.map_err(|e| e.to_string())?;

    let committed = s.get_order(order_id).await.map_err(|e| e.to_string())?;
    if committed.status != OrderStatus::Pending {
        return Err(format!(
            "expected pending after abort, got {}",
            committed.status
        ));
    }
    Ok(())
}
