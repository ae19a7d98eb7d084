use std::future::Future;

use rust_decimal::Decimal;

use super::{dec, make_order, make_transaction, Fixture, TestResult};
use crate::record::TransactionKind;
use crate::CafeStorage;

pub(super) async fn run_ledger_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "ledger",
        "rows_queryable_by_reference_order",
        rows_queryable_by_reference_order(factory).await,
    ));
    results.push(TestResult::from_result(
        "ledger",
        "rows_for_other_orders_not_returned",
        rows_for_other_orders_not_returned(factory).await,
    ));
    results.push(TestResult::from_result(
        "ledger",
        "fields_preserved",
        fields_preserved(factory).await,
    ));
    results.push(TestResult::from_result(
        "ledger",
        "usage_and_deletion_rows_cancel",
        usage_and_deletion_rows_cancel(factory).await,
    ));

    results
}

/// All rows referencing one order come back, in append order.
async fn rows_queryable_by_reference_order<S, F, Fut>(factory: &F) -> Result<(), String>
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
    s.insert_inventory_transaction(
        &mut snap,
        make_transaction(fx.milk, "-200", TransactionKind::OrderUsage, Some(order_id)),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.insert_inventory_transaction(
        &mut snap,
        make_transaction(fx.beans, "-18", TransactionKind::OrderUsage, Some(order_id)),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let txs = s
        .list_transactions_for_order(order_id)
        .await
        .map_err(|e| e.to_string())?;
    if txs.len() != 2 {
        return Err(format!("expected 2 ledger rows, got {}", txs.len()));
    }
    if txs[0].ingredient_id != fx.milk || txs[1].ingredient_id != fx.beans {
        return Err("ledger rows not in append order".to_string());
    }
    Ok(())
}

/// The reconciliation query is scoped: other orders' rows are excluded.
async fn rows_for_other_orders_not_returned<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let (s, fx) = factory().await;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let first = s
        .insert_order(&mut snap, make_order(fx.customer, "4.50"))
        .await
        .map_err(|e| e.to_string())?;
    let second = s
        .insert_order(&mut snap, make_order(fx.customer, "2.50"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_inventory_transaction(
        &mut snap,
        make_transaction(fx.milk, "-200", TransactionKind::OrderUsage, Some(first)),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.insert_inventory_transaction(
        &mut snap,
        make_transaction(fx.beans, "-18", TransactionKind::OrderUsage, Some(second)),
    )
    .await
    .map_err(|e| e.to_string())?;
    // An adjustment with no order reference must never show up either.
    s.insert_inventory_transaction(
        &mut snap,
        make_transaction(fx.milk, "500", TransactionKind::Adjustment, None),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let txs = s
        .list_transactions_for_order(first)
        .await
        .map_err(|e| e.to_string())?;
    if txs.len() != 1 || txs[0].ingredient_id != fx.milk {
        return Err(format!("expected only the first order's row, got {txs:?}"));
    }
    Ok(())
}

/// Delta, kind, reference, and note survive the round trip unchanged.
async fn fields_preserved<S, F, Fut>(factory: &F) -> Result<(), String>
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
    let mut row = make_transaction(
        fx.milk,
        "200.250",
        TransactionKind::OrderDeletion,
        Some(order_id),
    );
    row.note = Some("restocked from deleted order".to_string());
    s.insert_inventory_transaction(&mut snap, row)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let txs = s
        .list_transactions_for_order(order_id)
        .await
        .map_err(|e| e.to_string())?;
    if txs.len() != 1 {
        return Err(format!("expected 1 row, got {}", txs.len()));
    }
    let tx = &txs[0];
    if tx.delta != dec("200.250") {
        return Err(format!("delta mismatch: got {}", tx.delta));
    }
    if tx.kind != TransactionKind::OrderDeletion {
        return Err(format!("kind mismatch: got {}", tx.kind));
    }
    if tx.note.as_deref() != Some("restocked from deleted order") {
        return Err(format!("note mismatch: got {:?}", tx.note));
    }
    Ok(())
}

/// Usage rows and their deletion mirrors sum to zero for the order.
async fn usage_and_deletion_rows_cancel<S, F, Fut>(factory: &F) -> Result<(), String>
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
    for (delta, kind) in [
        ("-200", TransactionKind::OrderUsage),
        ("-18", TransactionKind::OrderUsage),
        ("200", TransactionKind::OrderDeletion),
        ("18", TransactionKind::OrderDeletion),
    ] {
        s.insert_inventory_transaction(
            &mut snap,
            make_transaction(fx.milk, delta, kind, Some(order_id)),
        )
        .await
        .map_err(|e| e.to_string())?;
    }
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let txs = s
        .list_transactions_for_order(order_id)
        .await
        .map_err(|e| e.to_string())?;
    let sum: Decimal = txs.iter().map(|t| t.delta).sum();
    if sum != Decimal::ZERO {
        return Err(format!("expected net zero, got {sum}"));
    }
    Ok(())
}
