use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::StorageError;
use crate::record::{
    CustomerRecord, IngredientRecord, InventoryTransactionRecord, MenuItemRecord,
    NewInventoryTransaction, NewOrder, NewOrderItem, OrderItemRecord, OrderRecord, OrderStatus,
    PriceHistoryRecord, RecipeLineRecord, StatusHistoryRecord,
};

/// The storage trait for barista execution backends.
///
/// A `CafeStorage` implementation provides durable, transactional storage
/// for menu items, recipes, inventory rows, orders, order items, and the
/// append-only inventory transaction and history logs.
///
/// ## Snapshot Semantics
///
/// All mutating operations take `&mut Self::Snapshot`, a type representing an
/// in-progress transaction. The lifecycle is:
///
/// 1. `begin_snapshot()` — start a transaction, returns a `Snapshot`
/// 2. Call reading/mutating methods with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)` — commit and consume the transaction
///    OR `abort_snapshot(snapshot)` — roll back and consume the transaction
///
/// If a `Snapshot` is dropped without committing, the underlying transaction
/// MUST be rolled back (drop semantics on the underlying DB transaction).
///
/// ## Row Locking
///
/// The `*_for_update` reads use `SELECT ... FOR UPDATE` semantics: the row
/// stays locked until the snapshot commits or aborts, so a check-then-apply
/// sequence on an ingredient's quantity serializes against concurrent
/// writers instead of both observing stale stock.
///
/// ## Exactly-One-Row Writes
///
/// `update_order`, `delete_order`, and `update_menu_item_price` must affect
/// exactly one row. Zero affected rows means the target vanished
/// mid-transaction and is reported as the corresponding not-found error;
/// callers abort the snapshot on it.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to be shared across
/// async task boundaries.
#[async_trait]
pub trait CafeStorage: Send + Sync + 'static {
    /// The snapshot (transaction) type used by this storage backend.
    ///
    /// Must be `Send` to allow passing across async task boundaries.
    type Snapshot: Send;

    // ── Snapshot lifecycle ────────────────────────────────────────────────────

    /// Begin a new snapshot (transaction).
    async fn begin_snapshot(&self) -> Result<Self::Snapshot, StorageError>;

    /// Commit a snapshot, making all mutations durable.
    async fn commit_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    /// Abort (roll back) a snapshot, discarding all mutations.
    async fn abort_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    // ── Menu and recipe reads (within snapshot) ──────────────────────────────

    /// Read a menu item row.
    async fn get_menu_item(
        &self,
        snapshot: &mut Self::Snapshot,
        menu_item_id: i64,
    ) -> Result<MenuItemRecord, StorageError>;

    /// Read a menu item's recipe lines. An item without a recipe yields an
    /// empty vec, not an error.
    async fn get_recipe(
        &self,
        snapshot: &mut Self::Snapshot,
        menu_item_id: i64,
    ) -> Result<Vec<RecipeLineRecord>, StorageError>;

    // ── Inventory (within snapshot) ──────────────────────────────────────────

    /// Read an ingredient row, locking it for update until commit/abort.
    async fn get_ingredient_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        ingredient_id: i64,
    ) -> Result<IngredientRecord, StorageError>;

    /// Add `delta` (signed) to the ingredient's quantity. Returns the new
    /// quantity. The floor check against negative stock is the caller's
    /// responsibility; it holds the row lock from `get_ingredient_for_update`.
    async fn adjust_ingredient_quantity(
        &self,
        snapshot: &mut Self::Snapshot,
        ingredient_id: i64,
        delta: Decimal,
    ) -> Result<Decimal, StorageError>;

    /// Append one ledger row. Returns the assigned id.
    async fn insert_inventory_transaction(
        &self,
        snapshot: &mut Self::Snapshot,
        row: NewInventoryTransaction,
    ) -> Result<i64, StorageError>;

    // ── Orders (within snapshot) ─────────────────────────────────────────────

    /// Insert an order row. Returns the assigned id.
    async fn insert_order(
        &self,
        snapshot: &mut Self::Snapshot,
        row: NewOrder,
    ) -> Result<i64, StorageError>;

    /// Read an order row, locking it for update until commit/abort.
    async fn get_order_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        order_id: i64,
    ) -> Result<OrderRecord, StorageError>;

    /// Replace an order row wholesale (matched by `row.id`).
    async fn update_order(
        &self,
        snapshot: &mut Self::Snapshot,
        row: OrderRecord,
    ) -> Result<(), StorageError>;

    /// Delete an order row.
    async fn delete_order(
        &self,
        snapshot: &mut Self::Snapshot,
        order_id: i64,
    ) -> Result<(), StorageError>;

    /// Insert a line item row. Returns the assigned id.
    async fn insert_order_item(
        &self,
        snapshot: &mut Self::Snapshot,
        row: NewOrderItem,
    ) -> Result<i64, StorageError>;

    /// Read an order's line items in insertion order.
    async fn get_order_items(
        &self,
        snapshot: &mut Self::Snapshot,
        order_id: i64,
    ) -> Result<Vec<OrderItemRecord>, StorageError>;

    /// Delete all line items of an order. Deleting zero rows is not an
    /// error (the order may legitimately be mid-replacement).
    async fn delete_order_items(
        &self,
        snapshot: &mut Self::Snapshot,
        order_id: i64,
    ) -> Result<(), StorageError>;

    /// Append one status-history row.
    async fn insert_status_history(
        &self,
        snapshot: &mut Self::Snapshot,
        order_id: i64,
        status: OrderStatus,
        changed_at: &str,
    ) -> Result<(), StorageError>;

    // ── Menu price update path (within snapshot) ─────────────────────────────

    /// Set a menu item's current price.
    async fn update_menu_item_price(
        &self,
        snapshot: &mut Self::Snapshot,
        menu_item_id: i64,
        new_price: Decimal,
        updated_at: &str,
    ) -> Result<(), StorageError>;

    /// Append one price-history row.
    async fn insert_price_history(
        &self,
        snapshot: &mut Self::Snapshot,
        menu_item_id: i64,
        old_price: Decimal,
        new_price: Decimal,
        changed_at: &str,
    ) -> Result<(), StorageError>;

    // ── Query operations (outside snapshot, against committed state) ─────────

    /// Read an order row without locking.
    async fn get_order(&self, order_id: i64) -> Result<OrderRecord, StorageError>;

    /// Read an order's committed line items without locking.
    async fn get_order_items_committed(
        &self,
        order_id: i64,
    ) -> Result<Vec<OrderItemRecord>, StorageError>;

    /// Read an ingredient row without locking.
    async fn get_ingredient(&self, ingredient_id: i64) -> Result<IngredientRecord, StorageError>;

    /// All ledger rows referencing one order, in append order. This is the
    /// reconciliation query: consumption can always be reconstructed from it
    /// independent of the live stock figure.
    async fn list_transactions_for_order(
        &self,
        order_id: i64,
    ) -> Result<Vec<InventoryTransactionRecord>, StorageError>;

    /// An order's status transitions, in append order.
    async fn get_status_history(
        &self,
        order_id: i64,
    ) -> Result<Vec<StatusHistoryRecord>, StorageError>;

    /// A menu item's price changes, in append order.
    async fn get_price_history(
        &self,
        menu_item_id: i64,
    ) -> Result<Vec<PriceHistoryRecord>, StorageError>;

    /// Read a customer row.
    async fn get_customer(&self, customer_id: i64) -> Result<CustomerRecord, StorageError>;
}
