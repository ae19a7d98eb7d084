use std::future::Future;

use super::{dec, Fixture, TestResult};
use crate::{CafeStorage, StorageError};

pub(super) async fn run_stock_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "stock",
        "adjustments_accumulate_exactly",
        adjustments_accumulate_exactly(factory).await,
    ));
    results.push(TestResult::from_result(
        "stock",
        "fractional_deltas_are_exact",
        fractional_deltas_are_exact(factory).await,
    ));
    results.push(TestResult::from_result(
        "stock",
        "adjust_returns_new_quantity",
        adjust_returns_new_quantity(factory).await,
    ));
    results.push(TestResult::from_result(
        "stock",
        "adjust_missing_ingredient_fails",
        adjust_missing_ingredient_fails(factory).await,
    ));

    results
}

/// Several adjustments in one snapshot sum exactly.
async fn adjustments_accumulate_exactly<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    for delta in ["-200", "-200", "150"] {
        s.adjust_ingredient_quantity(&mut snap, fx.milk, dec(delta))
            .await
            .map_err(|e| e.to_string())?;
    }
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let milk = s.get_ingredient(fx.milk).await.map_err(|e| e.to_string())?;
    if milk.quantity != dec("750") {
        return Err(format!("expected milk 750, got {}", milk.quantity));
    }
    Ok(())
}

/// Gram/ml-level fractions survive round trips without drift.
async fn fractional_deltas_are_exact<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.adjust_ingredient_quantity(&mut snap, fx.beans, dec("-18.125"))
        .await
        .map_err(|e| e.to_string())?;
    s.adjust_ingredient_quantity(&mut snap, fx.beans, dec("-18.125"))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let beans = s.get_ingredient(fx.beans).await.map_err(|e| e.to_string())?;
    if beans.quantity != dec("463.750") {
        return Err(format!("expected beans 463.750, got {}", beans.quantity));
    }
    Ok(())
}

/// The return value of an adjustment is the post-adjustment quantity.
async fn adjust_returns_new_quantity<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let after = s
        .adjust_ingredient_quantity(&mut snap, fx.milk, dec("-600"))
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    if after != dec("400") {
        return Err(format!("expected returned quantity 400, got {after}"));
    }
    Ok(())
}

/// Adjusting a nonexistent ingredient reports IngredientNotFound.
async fn adjust_missing_ingredient_fails<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, _fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .adjust_ingredient_quantity(&mut snap, 999_999, dec("1"))
        .await;
    let _ = s.abort_snapshot(snap).await;

    match result {
        Err(StorageError::IngredientNotFound {
            ingredient_id: 999_999,
        }) => Ok(()),
        other => Err(format!("expected IngredientNotFound, got {other:?}")),
    }
}
