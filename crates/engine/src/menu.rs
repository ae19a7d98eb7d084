//! Menu price update path.
//!
//! The original system logged price changes with a database trigger; here
//! the history row is written by the engine in the same snapshot as the
//! price change, so the old-to-new audit trail holds on any backend.

use barista_storage::CafeStorage;
use rust_decimal::Decimal;

use crate::error::OrderError;
use crate::now_rfc3339;

pub(crate) async fn update_menu_price<S: CafeStorage>(
    storage: &S,
    menu_item_id: i64,
    new_price: Decimal,
) -> Result<(), OrderError> {
    if new_price <= Decimal::ZERO {
        return Err(OrderError::InvalidPrice { price: new_price });
    }
    let mut snap = storage.begin_snapshot().await.map_err(OrderError::from)?;
    match update_in(storage, &mut snap, menu_item_id, new_price).await {
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
    menu_item_id: i64,
    new_price: Decimal,
) -> Result<(), OrderError> {
    let item = storage.get_menu_item(snap, menu_item_id).await?;
    if item.price == new_price {
        return Ok(());
    }
    let stamp = now_rfc3339();
    storage
        .update_menu_item_price(snap, menu_item_id, new_price, &stamp)
        .await?;
    storage
        .insert_price_history(snap, menu_item_id, item.price, new_price, &stamp)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use barista_storage::MemoryStorage;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn price_change_writes_history() {
        let s = MemoryStorage::new();
        let latte = s.seed_menu_item("Latte", dec("4.50"), true, &[]);

        update_menu_price(&s, latte, dec("5.25")).await.unwrap();

        let history = s.get_price_history(latte).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_price, dec("4.50"));
        assert_eq!(history[0].new_price, dec("5.25"));
    }

    #[tokio::test]
    async fn unchanged_price_writes_no_history() {
        let s = MemoryStorage::new();
        let latte = s.seed_menu_item("Latte", dec("4.50"), true, &[]);

        update_menu_price(&s, latte, dec("4.50")).await.unwrap();

        assert!(s.get_price_history(latte).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected() {
        let s = MemoryStorage::new();
        let latte = s.seed_menu_item("Latte", dec("4.50"), true, &[]);

        let err = update_menu_price(&s, latte, dec("0")).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidPrice { .. }));
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let s = MemoryStorage::new();
        let err = update_menu_price(&s, 77, dec("3.00")).await.unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));
    }

    #[tokio::test]
    async fn successive_changes_chain_old_to_new() {
        let s = MemoryStorage::new();
        let latte = s.seed_menu_item("Latte", dec("4.50"), true, &[]);

        update_menu_price(&s, latte, dec("5.00")).await.unwrap();
        update_menu_price(&s, latte, dec("5.50")).await.unwrap();

        let history = s.get_price_history(latte).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].old_price, dec("5.00"));
        assert_eq!(history[1].new_price, dec("5.50"));
    }
}
