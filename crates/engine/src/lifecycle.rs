//! Order lifecycle controller.
//!
//! Each operation opens one storage snapshot, performs every read and write
//! inside it, and commits only after the last write succeeded. Any failure
//! aborts the snapshot, leaving inventory and order state exactly as before
//! the call — stock deducted without an order persisted (or vice versa) is
//! a correctness bug, not a degraded state.

use std::collections::BTreeMap;

use barista_storage::{
    CafeStorage, NewOrder, NewOrderItem, OrderRecord, OrderStatus, TransactionKind,
};
use rust_decimal::Decimal;

use crate::error::OrderError;
use crate::types::OrderDraft;
use crate::{ledger, now_rfc3339, pricing, recipe};

fn validate_items(draft: &OrderDraft) -> Result<(), OrderError> {
    if draft.items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }
    for item in &draft.items {
        if item.quantity < 1 {
            return Err(OrderError::InvalidItemQuantity {
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
            });
        }
    }
    Ok(())
}

/// Create an order in `pending` status, deducting its full ingredient
/// requirement from stock. Returns the new order id.
pub(crate) async fn create<S: CafeStorage>(
    storage: &S,
    draft: &OrderDraft,
) -> Result<i64, OrderError> {
    validate_items(draft)?;
    let mut snap = storage.begin_snapshot().await.map_err(OrderError::from)?;
    match create_in(storage, &mut snap, draft).await {
        Ok(order_id) => {
            storage.commit_snapshot(snap).await?;
            Ok(order_id)
        }
        Err(e) => {
            let _ = storage.abort_snapshot(snap).await;
            Err(e)
        }
    }
}

async fn create_in<S: CafeStorage>(
    storage: &S,
    snap: &mut S::Snapshot,
    draft: &OrderDraft,
) -> Result<i64, OrderError> {
    let needed = recipe::requirements_for(storage, snap, &draft.item_pairs()).await?;

    let no_reserve = BTreeMap::new();
    let shortages = ledger::check_availability(storage, snap, &needed, &no_reserve).await?;
    if let Some(short) = shortages.into_iter().next() {
        return Err(short.into_error());
    }

    let (priced, total) = pricing::price_items(storage, snap, &draft.items).await?;
    if total <= Decimal::ZERO {
        return Err(OrderError::InvalidTotalPrice { total });
    }

    let stamp = now_rfc3339();
    let order_id = storage
        .insert_order(
            snap,
            NewOrder {
                customer_id: draft.customer_id,
                status: OrderStatus::Pending,
                payment_method: draft.payment_method.clone(),
                total_price: total,
                special_instructions: draft.special_instructions.clone(),
                created_at: stamp.clone(),
                updated_at: stamp.clone(),
            },
        )
        .await?;

    for item in &priced {
        storage
            .insert_order_item(
                snap,
                NewOrderItem {
                    order_id,
                    menu_item_id: item.menu_item_id,
                    quantity: item.quantity,
                    price_at_order: item.unit_price,
                    customizations: item.customizations.clone(),
                },
            )
            .await?;
    }

    let deltas: BTreeMap<i64, Decimal> = needed.iter().map(|(&id, &q)| (id, -q)).collect();
    ledger::apply(
        storage,
        snap,
        &deltas,
        TransactionKind::OrderUsage,
        Some(order_id),
        None,
        &stamp,
    )
    .await?;

    storage
        .insert_status_history(snap, order_id, OrderStatus::Pending, &stamp)
        .await?;

    Ok(order_id)
}

/// Replace an order's items wholesale, applying only the net per-ingredient
/// delta to stock and recomputing the total from current menu pricing.
pub(crate) async fn update<S: CafeStorage>(
    storage: &S,
    order_id: i64,
    draft: &OrderDraft,
) -> Result<(), OrderError> {
    let mut snap = storage.begin_snapshot().await.map_err(OrderError::from)?;
    match update_in(storage, &mut snap, order_id, draft).await {
        Ok(()) => {
            storage.commit_snapshot(snap).await?;
            Ok(())
        }
        Err(e) => {
            let _ = storage.abort_snapshot(snap).await;
            Err(e)
        }
    }
}

async fn update_in<S: CafeStorage>(
    storage: &S,
    snap: &mut S::Snapshot,
    order_id: i64,
    draft: &OrderDraft,
) -> Result<(), OrderError> {
    let current = storage.get_order_for_update(snap, order_id).await?;
    if current.status.is_terminal() {
        return Err(OrderError::InvalidStateTransition {
            order_id,
            from: current.status,
            to: None,
        });
    }
    validate_items(draft)?;

    // Net delta is computed from the persisted prior items, never from any
    // client-supplied previous state.
    let old_items = storage.get_order_items(snap, order_id).await?;
    let old_pairs: Vec<(i64, i64)> = old_items
        .iter()
        .map(|i| (i.menu_item_id, i.quantity))
        .collect();
    let old_needed = recipe::requirements_for(storage, snap, &old_pairs).await?;
    let new_needed = recipe::requirements_for(storage, snap, &draft.item_pairs()).await?;

    let mut net: BTreeMap<i64, Decimal> = BTreeMap::new();
    for (&id, &q) in &new_needed {
        *net.entry(id).or_insert(Decimal::ZERO) += q;
    }
    for (&id, &q) in &old_needed {
        *net.entry(id).or_insert(Decimal::ZERO) -= q;
    }
    net.retain(|_, q| !q.is_zero());

    // Only additional usage is checked; net restocks always succeed.
    let additional: BTreeMap<i64, Decimal> = net
        .iter()
        .filter(|&(_, &q)| q > Decimal::ZERO)
        .map(|(&id, &q)| (id, q))
        .collect();
    let no_reserve = BTreeMap::new();
    let shortages = ledger::check_availability(storage, snap, &additional, &no_reserve).await?;
    if let Some(short) = shortages.into_iter().next() {
        return Err(short.into_error());
    }

    let (priced, total) = pricing::price_items(storage, snap, &draft.items).await?;
    if total <= Decimal::ZERO {
        return Err(OrderError::InvalidTotalPrice { total });
    }

    let stamp = now_rfc3339();
    // Same reference id as the original usage rows: the ledger reflects the
    // corrected consumption, not a doubled one.
    let deltas: BTreeMap<i64, Decimal> = net.iter().map(|(&id, &q)| (id, -q)).collect();
    ledger::apply(
        storage,
        snap,
        &deltas,
        TransactionKind::OrderUsage,
        Some(order_id),
        None,
        &stamp,
    )
    .await?;

    storage.delete_order_items(snap, order_id).await?;
    for item in &priced {
        storage
            .insert_order_item(
                snap,
                NewOrderItem {
                    order_id,
                    menu_item_id: item.menu_item_id,
                    quantity: item.quantity,
                    price_at_order: item.unit_price,
                    customizations: item.customizations.clone(),
                },
            )
            .await?;
    }

    storage
        .update_order(
            snap,
            OrderRecord {
                id: order_id,
                customer_id: draft.customer_id,
                status: current.status,
                payment_method: draft.payment_method.clone(),
                total_price: total,
                special_instructions: draft.special_instructions.clone(),
                created_at: current.created_at,
                updated_at: stamp,
            },
        )
        .await?;

    Ok(())
}

/// Delete an order, restocking its full ingredient requirement.
pub(crate) async fn delete<S: CafeStorage>(storage: &S, order_id: i64) -> Result<(), OrderError> {
    let mut snap = storage.begin_snapshot().await.map_err(OrderError::from)?;
    match delete_in(storage, &mut snap, order_id).await {
        Ok(()) => {
            storage.commit_snapshot(snap).await?;
            Ok(())
        }
        Err(e) => {
            let _ = storage.abort_snapshot(snap).await;
            Err(e)
        }
    }
}

async fn delete_in<S: CafeStorage>(
    storage: &S,
    snap: &mut S::Snapshot,
    order_id: i64,
) -> Result<(), OrderError> {
    storage.get_order_for_update(snap, order_id).await?;

    let items = storage.get_order_items(snap, order_id).await?;
    let pairs: Vec<(i64, i64)> = items.iter().map(|i| (i.menu_item_id, i.quantity)).collect();
    let restock = recipe::requirements_for(storage, snap, &pairs).await?;

    let stamp = now_rfc3339();
    let note = format!("restocked from deleted order #{}", order_id);
    ledger::apply(
        storage,
        snap,
        &restock,
        TransactionKind::OrderDeletion,
        Some(order_id),
        Some(note.as_str()),
        &stamp,
    )
    .await?;

    storage.delete_order_items(snap, order_id).await?;
    storage.delete_order(snap, order_id).await?;
    Ok(())
}

/// Close an order: transition to `delivered` and record the transition.
/// Inventory is untouched — it was committed at create/update time.
pub(crate) async fn close<S: CafeStorage>(storage: &S, order_id: i64) -> Result<(), OrderError> {
    let mut snap = storage.begin_snapshot().await.map_err(OrderError::from)?;
    match close_in(storage, &mut snap, order_id).await {
        Ok(()) => {
            storage.commit_snapshot(snap).await?;
            Ok(())
        }
        Err(e) => {
            let _ = storage.abort_snapshot(snap).await;
            Err(e)
        }
    }
}

async fn close_in<S: CafeStorage>(
    storage: &S,
    snap: &mut S::Snapshot,
    order_id: i64,
) -> Result<(), OrderError> {
    let mut order = storage.get_order_for_update(snap, order_id).await?;
    if order.status.is_terminal() {
        // Covers both "cannot close a cancelled order" and "already closed".
        return Err(OrderError::InvalidStateTransition {
            order_id,
            from: order.status,
            to: Some(OrderStatus::Delivered),
        });
    }

    let stamp = now_rfc3339();
    order.status = OrderStatus::Delivered;
    order.updated_at = stamp.clone();
    storage.update_order(snap, order).await?;
    storage
        .insert_status_history(snap, order_id, OrderStatus::Delivered, &stamp)
        .await?;
    Ok(())
}

/// Drive the order state machine one step (accepted, preparing, ready, ...).
/// Cancellation via this path only flips status; restocking is the delete
/// path's job.
pub(crate) async fn set_status<S: CafeStorage>(
    storage: &S,
    order_id: i64,
    next: OrderStatus,
) -> Result<(), OrderError> {
    let mut snap = storage.begin_snapshot().await.map_err(OrderError::from)?;
    match set_status_in(storage, &mut snap, order_id, next).await {
        Ok(()) => {
            storage.commit_snapshot(snap).await?;
            Ok(())
        }
        Err(e) => {
            let _ = storage.abort_snapshot(snap).await;
            Err(e)
        }
    }
}

async fn set_status_in<S: CafeStorage>(
    storage: &S,
    snap: &mut S::Snapshot,
    order_id: i64,
    next: OrderStatus,
) -> Result<(), OrderError> {
    let mut order = storage.get_order_for_update(snap, order_id).await?;
    if !order.status.can_transition_to(next) {
        return Err(OrderError::InvalidStateTransition {
            order_id,
            from: order.status,
            to: Some(next),
        });
    }

    let stamp = now_rfc3339();
    order.status = next;
    order.updated_at = stamp.clone();
    storage.update_order(snap, order).await?;
    storage
        .insert_status_history(snap, order_id, next, &stamp)
        .await?;
    Ok(())
}
