use std::future::Future;

use super::{make_order, Fixture, TestResult, STAMP};
use crate::record::OrderRecord;
use crate::{CafeStorage, StorageError};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "error",
        "get_order_nonexistent",
        get_order_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "get_order_for_update_nonexistent",
        get_order_for_update_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "get_ingredient_nonexistent",
        get_ingredient_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "get_menu_item_nonexistent",
        get_menu_item_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "get_customer_nonexistent",
        get_customer_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "update_order_zero_rows_is_not_found",
        update_order_zero_rows_is_not_found(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "list_transactions_empty_for_unknown_order",
        list_transactions_empty_for_unknown_order(factory).await,
    ));

    results
}

async fn get_order_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, _fx) = factory().await;
    match s.get_order(424_242).await {
        Err(StorageError::OrderNotFound { order_id: 424_242 }) => Ok(()),
        other => Err(format!("expected OrderNotFound, got {other:?}")),
    }
}

async fn get_order_for_update_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, _fx) = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.get_order_for_update(&mut snap, 424_242).await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::OrderNotFound { order_id: 424_242 }) => Ok(()),
        other => Err(format!("expected OrderNotFound, got {other:?}")),
    }
}

async fn get_ingredient_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, _fx) = factory().await;
    match s.get_ingredient(424_242).await {
        Err(StorageError::IngredientNotFound {
            ingredient_id: 424_242,
        }) => Ok(()),
        other => Err(format!("expected IngredientNotFound, got {other:?}")),
    }
}

async fn get_menu_item_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, _fx) = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.get_menu_item(&mut snap, 424_242).await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::MenuItemNotFound {
            menu_item_id: 424_242,
        }) => Ok(()),
        other => Err(format!("expected MenuItemNotFound, got {other:?}")),
    }
}

async fn get_customer_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, _fx) = factory().await;
    match s.get_customer(424_242).await {
        Err(StorageError::CustomerNotFound {
            customer_id: 424_242,
        }) => Ok(()),
        other => Err(format!("expected CustomerNotFound, got {other:?}")),
    }
}

/// Updating a row that vanished is reported as not-found, never silently
/// succeeding with zero affected rows.
async fn update_order_zero_rows_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
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
    let order = s
        .get_order_for_update(&mut snap, order_id)
        .await
        .map_err(|e| e.to_string())?;
    s.delete_order(&mut snap, order_id)
        .await
        .map_err(|e| e.to_string())?;
    let result = s
        .update_order(
            &mut snap,
            OrderRecord {
                updated_at: STAMP.to_string(),
                ..order
            },
        )
        .await;
    let _ = s.abort_snapshot(snap).await;

    match result {
        Err(StorageError::OrderNotFound { .. }) => Ok(()),
        other => Err(format!("expected OrderNotFound, got {other:?}")),
    }
}

async fn list_transactions_empty_for_unknown_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, _fx) = factory().await;
    let txs = s
        .list_transactions_for_order(424_242)
        .await
        .map_err(|e| e.to_string())?;
    if !txs.is_empty() {
        return Err(format!("expected empty vec, got {} rows", txs.len()));
    }
    Ok(())
}
