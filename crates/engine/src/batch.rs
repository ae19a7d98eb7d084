//! Batch order processor.
//!
//! Candidates are processed sequentially, in input order, each through its
//! own create transaction. That sequencing is the serialization strategy
//! for intra-batch contention: an earlier accepted order's deduction is
//! committed before the next candidate's availability check runs, so stock
//! is never granted twice within a batch. A failing candidate becomes a
//! per-order `rejected` outcome; it never rolls back earlier accepts.

use std::collections::BTreeMap;

use barista_storage::CafeStorage;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::OrderError;
use crate::types::OrderDraft;
use crate::{ledger, lifecycle};

/// Outcome of one candidate order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOutcome {
    Accepted,
    Rejected,
}

/// Per-candidate result, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedOrder {
    pub input_index: usize,
    pub order_id: Option<i64>,
    pub customer_name: String,
    pub status: BatchOutcome,
    pub total: Option<Decimal>,
    pub reject_reason: Option<String>,
}

/// Usage of one ingredient across all accepted orders of a batch,
/// reconstructed from the ledger rather than estimated.
#[derive(Debug, Clone, Serialize)]
pub struct IngredientUsage {
    pub ingredient_id: i64,
    pub name: String,
    pub quantity_used: Decimal,
    pub remaining_stock: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total_orders: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub total_revenue: Decimal,
    pub inventory_used: Vec<IngredientUsage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub processed: Vec<ProcessedOrder>,
    pub summary: BatchSummary,
}

pub(crate) async fn process_batch<S: CafeStorage>(
    storage: &S,
    orders: &[OrderDraft],
) -> Result<BatchResult, OrderError> {
    if orders.is_empty() {
        return Err(OrderError::EmptyBatch);
    }

    let mut processed = Vec::with_capacity(orders.len());
    let mut accepted = 0usize;
    let mut rejected = 0usize;
    let mut total_revenue = Decimal::ZERO;
    let mut used: BTreeMap<i64, Decimal> = BTreeMap::new();

    for (input_index, draft) in orders.iter().enumerate() {
        // Best-effort display name; a failed lookup is not a hard failure.
        let customer_name = match storage.get_customer(draft.customer_id).await {
            Ok(customer) => customer.name,
            Err(_) => format!("Customer {}", draft.customer_id),
        };

        if draft.items.is_empty() {
            rejected += 1;
            processed.push(ProcessedOrder {
                input_index,
                order_id: None,
                customer_name,
                status: BatchOutcome::Rejected,
                total: None,
                reject_reason: Some("empty order items".to_string()),
            });
            continue;
        }

        match lifecycle::create(storage, draft).await {
            Ok(order_id) => {
                let order = storage.get_order(order_id).await?;
                for (ingredient_id, quantity) in ledger::usage_since(storage, order_id).await? {
                    *used.entry(ingredient_id).or_insert(Decimal::ZERO) += quantity;
                }
                accepted += 1;
                total_revenue = total_revenue
                    .checked_add(order.total_price)
                    .ok_or_else(|| OrderError::Overflow {
                        message: "batch revenue".to_string(),
                    })?;
                processed.push(ProcessedOrder {
                    input_index,
                    order_id: Some(order_id),
                    customer_name,
                    status: BatchOutcome::Accepted,
                    total: Some(order.total_price),
                    reject_reason: None,
                });
            }
            Err(e) => {
                rejected += 1;
                processed.push(ProcessedOrder {
                    input_index,
                    order_id: None,
                    customer_name,
                    status: BatchOutcome::Rejected,
                    total: None,
                    reject_reason: Some(e.to_string()),
                });
            }
        }
    }

    // Remaining stock as of batch completion.
    let mut inventory_used = Vec::with_capacity(used.len());
    for (ingredient_id, quantity_used) in used {
        let row = storage.get_ingredient(ingredient_id).await?;
        inventory_used.push(IngredientUsage {
            ingredient_id,
            name: row.name,
            quantity_used,
            remaining_stock: row.quantity,
        });
    }

    Ok(BatchResult {
        processed,
        summary: BatchSummary {
            total_orders: orders.len(),
            accepted,
            rejected,
            total_revenue,
            inventory_used,
        },
    })
}
