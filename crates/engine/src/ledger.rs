//! Inventory ledger operations.
//!
//! Three operations, all running inside the caller's snapshot so they share
//! its atomicity: `check_availability` (read-for-update comparison of
//! requirements against stock), `apply` (stock mutation plus one append-only
//! ledger row per non-zero delta), and `usage_since` (consumption
//! reconstruction from committed `order_usage` rows, independent of the live
//! stock figure).

use std::collections::BTreeMap;

use barista_storage::{CafeStorage, NewInventoryTransaction, TransactionKind};
use rust_decimal::Decimal;

use crate::error::OrderError;

/// One ingredient that cannot cover a requested amount.
#[derive(Debug, Clone)]
pub(crate) struct Shortage {
    pub ingredient_id: i64,
    pub ingredient: String,
    pub needed: Decimal,
    pub available: Decimal,
}

impl Shortage {
    pub(crate) fn into_error(self) -> OrderError {
        OrderError::InsufficientInventory {
            ingredient_id: self.ingredient_id,
            ingredient: self.ingredient,
            needed: self.needed,
            available: self.available,
        }
    }
}

/// Compare requirements against current stock, row-locking each ingredient
/// so the subsequent `apply` sees the same quantities.
///
/// `reserved` is a caller-supplied offset of stock already claimed but not
/// yet persisted; it is subtracted from availability before comparing.
/// Returns every short ingredient, in ingredient-id order. Read-only.
pub(crate) async fn check_availability<S: CafeStorage>(
    storage: &S,
    snapshot: &mut S::Snapshot,
    requirements: &BTreeMap<i64, Decimal>,
    reserved: &BTreeMap<i64, Decimal>,
) -> Result<Vec<Shortage>, OrderError> {
    let mut shortages = Vec::new();
    for (&ingredient_id, &needed) in requirements {
        if needed <= Decimal::ZERO {
            continue;
        }
        let row = storage
            .get_ingredient_for_update(snapshot, ingredient_id)
            .await?;
        let claimed = reserved
            .get(&ingredient_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let available = row.quantity - claimed;
        if needed > available {
            shortages.push(Shortage {
                ingredient_id,
                ingredient: row.name,
                needed,
                available,
            });
        }
    }
    Ok(shortages)
}

/// Apply signed stock deltas and append one ledger row per non-zero delta.
///
/// An `order_usage` deduction that would commit a quantity below zero fails
/// with `InsufficientInventory` — restocks (`order_deletion`, `adjustment`)
/// are never floor-checked. The caller aborts the snapshot on error, so
/// there is no partial application.
pub(crate) async fn apply<S: CafeStorage>(
    storage: &S,
    snapshot: &mut S::Snapshot,
    deltas: &BTreeMap<i64, Decimal>,
    kind: TransactionKind,
    reference_order_id: Option<i64>,
    note: Option<&str>,
    stamp: &str,
) -> Result<(), OrderError> {
    for (&ingredient_id, &delta) in deltas {
        if delta.is_zero() {
            continue;
        }
        if kind == TransactionKind::OrderUsage && delta < Decimal::ZERO {
            let row = storage
                .get_ingredient_for_update(snapshot, ingredient_id)
                .await?;
            if row.quantity + delta < Decimal::ZERO {
                return Err(OrderError::InsufficientInventory {
                    ingredient_id,
                    ingredient: row.name,
                    needed: -delta,
                    available: row.quantity,
                });
            }
        }
        storage
            .adjust_ingredient_quantity(snapshot, ingredient_id, delta)
            .await?;
        storage
            .insert_inventory_transaction(
                snapshot,
                NewInventoryTransaction {
                    ingredient_id,
                    delta,
                    kind,
                    reference_order_id,
                    note: note.map(str::to_string),
                    created_at: stamp.to_string(),
                },
            )
            .await?;
    }
    Ok(())
}

/// Reconstruct one order's actual consumption by summing its committed
/// `order_usage` ledger rows. Positive amounts mean consumed; corrective
/// rows from updates net out. Zero-net ingredients are dropped.
pub(crate) async fn usage_since<S: CafeStorage>(
    storage: &S,
    reference_order_id: i64,
) -> Result<BTreeMap<i64, Decimal>, OrderError> {
    let rows = storage
        .list_transactions_for_order(reference_order_id)
        .await?;
    let mut used: BTreeMap<i64, Decimal> = BTreeMap::new();
    for row in rows {
        if row.kind == TransactionKind::OrderUsage {
            *used.entry(row.ingredient_id).or_insert(Decimal::ZERO) -= row.delta;
        }
    }
    used.retain(|_, amount| !amount.is_zero());
    Ok(used)
}
