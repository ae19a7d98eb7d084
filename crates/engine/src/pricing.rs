//! Pricing resolver.
//!
//! The authoritative total is always recomputed server-side as
//! `sum(current_price * quantity)`; client-supplied prices never reach the
//! committed order.

use barista_storage::{CafeStorage, StorageError};
use rust_decimal::Decimal;

use crate::error::OrderError;
use crate::types::OrderItemDraft;

/// A line item with its resolved unit price.
#[derive(Debug, Clone)]
pub(crate) struct PricedItem {
    pub menu_item_id: i64,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub customizations: Option<serde_json::Value>,
}

/// Current price of a menu item. Inactive items are not purchasable and are
/// indistinguishable from missing ones.
pub(crate) async fn resolve_price<S: CafeStorage>(
    storage: &S,
    snapshot: &mut S::Snapshot,
    menu_item_id: i64,
) -> Result<Decimal, OrderError> {
    let item = storage.get_menu_item(snapshot, menu_item_id).await?;
    if !item.is_active {
        return Err(OrderError::NotFound(StorageError::MenuItemNotFound {
            menu_item_id,
        }));
    }
    Ok(item.price)
}

/// Resolve every line's current price and the order total.
pub(crate) async fn price_items<S: CafeStorage>(
    storage: &S,
    snapshot: &mut S::Snapshot,
    items: &[OrderItemDraft],
) -> Result<(Vec<PricedItem>, Decimal), OrderError> {
    let mut priced = Vec::with_capacity(items.len());
    let mut total = Decimal::ZERO;
    for item in items {
        let unit_price = resolve_price(storage, snapshot, item.menu_item_id).await?;
        let line = unit_price
            .checked_mul(Decimal::from(item.quantity))
            .ok_or_else(|| OrderError::Overflow {
                message: format!("line total for menu item {}", item.menu_item_id),
            })?;
        total = total.checked_add(line).ok_or_else(|| OrderError::Overflow {
            message: "order total".to_string(),
        })?;
        priced.push(PricedItem {
            menu_item_id: item.menu_item_id,
            quantity: item.quantity,
            unit_price,
            customizations: item.customizations.clone(),
        });
    }
    Ok((priced, total))
}
