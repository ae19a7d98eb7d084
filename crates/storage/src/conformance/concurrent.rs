use std::future::Future;
use std::sync::Arc;

use super::{dec, make_order, Fixture, TestResult};
use crate::{CafeStorage, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 8;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "concurrent",
        "racing_deductions_serialize_without_lost_updates",
        racing_deductions_serialize_without_lost_updates(factory).await,
    ));
    results.push(TestResult::from_result(
        "concurrent",
        "concurrent_order_inserts_get_distinct_ids",
        concurrent_order_inserts_get_distinct_ids(factory).await,
    ));

    results
}

/// N tasks each open a snapshot, read milk for update, deduct 100, commit.
/// With `FOR UPDATE` semantics the check-and-apply sequences serialize, so
/// the final quantity is exactly 1000 - N*100 — no lost update.
async fn racing_deductions_serialize_without_lost_updates<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (storage, fx) = factory().await;
    let storage = Arc::new(storage);

    let mut handles = Vec::new();
    for _ in 0..N {
        let s = Arc::clone(&storage);
        let milk = fx.milk;
        handles.push(tokio::spawn(async move {
            let mut snap = s.begin_snapshot().await?;
            // Read-for-update then deduct: the classic check-and-apply race.
            let row = s.get_ingredient_for_update(&mut snap, milk).await?;
            let _ = row.quantity;
            s.adjust_ingredient_quantity(&mut snap, milk, dec("-100"))
                .await?;
            s.commit_snapshot(snap).await?;
            Ok::<(), StorageError>(())
        }));
    }

    for handle in handles {
        handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("storage error: {e}"))?;
    }

    let milk = storage
        .get_ingredient(fx.milk)
        .await
        .map_err(|e| e.to_string())?;
    let expected = dec("1000") - dec("100") * rust_decimal::Decimal::from(N as i64);
    if milk.quantity != expected {
        return Err(format!(
            "lost update: expected {expected}, got {}",
            milk.quantity
        ));
    }
    Ok(())
}

/// N tasks each insert and commit one order; all ids are distinct.
async fn concurrent_order_inserts_get_distinct_ids<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (storage, fx) = factory().await;
    let storage = Arc::new(storage);

    let mut handles = Vec::new();
    for _ in 0..N {
        let s = Arc::clone(&storage);
        let customer = fx.customer;
        handles.push(tokio::spawn(async move {
            let mut snap = s.begin_snapshot().await?;
            let id = s.insert_order(&mut snap, make_order(customer, "4.50")).await?;
            s.commit_snapshot(snap).await?;
            Ok::<i64, StorageError>(id)
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let id = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("storage error: {e}"))?;
        ids.push(id);
    }
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != N {
        return Err(format!("expected {N} distinct ids, got {}", ids.len()));
    }
    Ok(())
}
