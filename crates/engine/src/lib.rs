//! Order-inventory consistency engine.
//!
//! For every order creation, modification, deletion, and batch submission
//! the engine atomically verifies ingredient availability, deducts or
//! restores stock, appends an auditable inventory transaction ledger, and
//! recomputes order totals from current menu pricing. Storage is an
//! injected [`CafeStorage`] handle; every operation runs inside one storage
//! snapshot with rollback on any failure.

pub mod batch;
pub mod error;
mod ledger;
mod lifecycle;
mod menu;
mod pricing;
mod recipe;
pub mod types;

use std::collections::BTreeMap;

use barista_storage::{CafeStorage, OrderStatus};
use rust_decimal::Decimal;

pub use batch::{BatchOutcome, BatchResult, BatchSummary, IngredientUsage, ProcessedOrder};
pub use error::OrderError;
pub use types::{OrderDraft, OrderItemDraft};

/// The engine façade. Holds the storage handle it was constructed with;
/// no ambient or global connection state.
pub struct OrderEngine<S: CafeStorage> {
    storage: S,
}

impl<S: CafeStorage> OrderEngine<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Create an order in `pending` status. Fails without writes on empty
    /// input, shortage, or a non-positive recomputed total.
    pub async fn create_order(&self, draft: &OrderDraft) -> Result<i64, OrderError> {
        lifecycle::create(&self.storage, draft).await
    }

    /// Replace an order's items, applying the net ingredient delta against
    /// stock. Rejected on terminal orders.
    pub async fn update_order(&self, order_id: i64, draft: &OrderDraft) -> Result<(), OrderError> {
        lifecycle::update(&self.storage, order_id, draft).await
    }

    /// Delete an order, restoring its full ingredient requirement to stock.
    pub async fn delete_order(&self, order_id: i64) -> Result<(), OrderError> {
        lifecycle::delete(&self.storage, order_id).await
    }

    /// Transition an order to `delivered`. Fails on already-delivered or
    /// cancelled orders; never touches inventory.
    pub async fn close_order(&self, order_id: i64) -> Result<(), OrderError> {
        lifecycle::close(&self.storage, order_id).await
    }

    /// Drive the status state machine one legal step, recording history.
    pub async fn set_order_status(
        &self,
        order_id: i64,
        next: OrderStatus,
    ) -> Result<(), OrderError> {
        lifecycle::set_status(&self.storage, order_id, next).await
    }

    /// Process candidate orders sequentially with per-order accept/reject
    /// isolation. Fails upfront on an empty batch.
    pub async fn process_batch(&self, orders: &[OrderDraft]) -> Result<BatchResult, OrderError> {
        batch::process_batch(&self.storage, orders).await
    }

    /// Change a menu item's price, appending the old-to-new history row in
    /// the same transaction.
    pub async fn update_menu_price(
        &self,
        menu_item_id: i64,
        new_price: Decimal,
    ) -> Result<(), OrderError> {
        menu::update_menu_price(&self.storage, menu_item_id, new_price).await
    }

    /// Reconstruct an order's actual per-ingredient consumption from its
    /// committed `order_usage` ledger rows.
    pub async fn usage_for_order(
        &self,
        order_id: i64,
    ) -> Result<BTreeMap<i64, Decimal>, OrderError> {
        ledger::usage_since(&self.storage, order_id).await
    }
}

/// Generate an RFC 3339 timestamp for the current instant.
pub(crate) fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
