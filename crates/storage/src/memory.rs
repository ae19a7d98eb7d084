//! Reference in-memory backend.
//!
//! `MemoryStorage` keeps committed tables behind a `std::sync::Mutex` and
//! serializes snapshots through a `tokio::sync::Mutex` whose owned guard
//! lives inside the snapshot value. A snapshot operates on a working clone
//! of the tables; commit swaps the clone in, abort (or drop) discards it.
//!
//! This yields snapshot isolation, atomic all-or-nothing commit, and
//! read-your-own-writes within a snapshot. The writer lock is a whole-store
//! exclusive lock — a coarse superset of the per-row `FOR UPDATE` locking a
//! relational backend would use, so every locking contract of `CafeStorage`
//! holds, at the cost of write concurrency.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::StorageError;
use crate::record::{
    CustomerRecord, IngredientRecord, InventoryTransactionRecord, MenuItemRecord,
    NewInventoryTransaction, NewOrder, NewOrderItem, OrderItemRecord, OrderRecord, OrderStatus,
    PriceHistoryRecord, RecipeLineRecord, StatusHistoryRecord, Unit,
};
use crate::traits::CafeStorage;

#[derive(Debug, Default, Clone)]
struct Tables {
    next_id: i64,
    menu_items: BTreeMap<i64, MenuItemRecord>,
    recipes: Vec<RecipeLineRecord>,
    ingredients: BTreeMap<i64, IngredientRecord>,
    orders: BTreeMap<i64, OrderRecord>,
    order_items: Vec<OrderItemRecord>,
    transactions: Vec<InventoryTransactionRecord>,
    status_history: Vec<StatusHistoryRecord>,
    price_history: Vec<PriceHistoryRecord>,
    customers: BTreeMap<i64, CustomerRecord>,
}

impl Tables {
    /// Ids are assigned from one shared sequence across all tables.
    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory `CafeStorage` backend for tests and embedding.
#[derive(Clone)]
pub struct MemoryStorage {
    committed: Arc<Mutex<Tables>>,
    writer: Arc<AsyncMutex<()>>,
}

/// An in-progress transaction over `MemoryStorage`.
///
/// Holds the store-wide writer lock for its whole lifetime and a working
/// clone of the committed tables. Dropping it without commit discards the
/// clone, which is exactly rollback.
pub struct MemorySnapshot {
    work: Tables,
    _guard: OwnedMutexGuard<()>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            committed: Arc::new(Mutex::new(Tables::default())),
            writer: Arc::new(AsyncMutex::new(())),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.committed.lock().expect("memory storage mutex poisoned")
    }

    // ── Seed helpers (test setup; bypass snapshot machinery) ─────────────────

    pub fn seed_customer(&self, name: &str) -> i64 {
        let mut t = self.tables();
        let id = t.assign_id();
        t.customers.insert(
            id,
            CustomerRecord {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    pub fn seed_ingredient(
        &self,
        name: &str,
        quantity: Decimal,
        unit: Unit,
        reorder_threshold: Decimal,
    ) -> i64 {
        let mut t = self.tables();
        let id = t.assign_id();
        t.ingredients.insert(
            id,
            IngredientRecord {
                id,
                name: name.to_string(),
                quantity,
                unit,
                reorder_threshold,
            },
        );
        id
    }

    /// Seed a menu item together with its recipe lines
    /// (`(ingredient_id, quantity_per_unit)` pairs).
    pub fn seed_menu_item(
        &self,
        name: &str,
        price: Decimal,
        is_active: bool,
        recipe: &[(i64, Decimal)],
    ) -> i64 {
        let mut t = self.tables();
        let id = t.assign_id();
        t.menu_items.insert(
            id,
            MenuItemRecord {
                id,
                name: name.to_string(),
                description: None,
                price,
                is_active,
                created_at: "1970-01-01T00:00:00Z".to_string(),
                updated_at: "1970-01-01T00:00:00Z".to_string(),
            },
        );
        for (ingredient_id, quantity_per_unit) in recipe {
            t.recipes.push(RecipeLineRecord {
                menu_item_id: id,
                ingredient_id: *ingredient_id,
                quantity_per_unit: *quantity_per_unit,
            });
        }
        id
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CafeStorage for MemoryStorage {
    type Snapshot = MemorySnapshot;

    async fn begin_snapshot(&self) -> Result<MemorySnapshot, StorageError> {
        let guard = Arc::clone(&self.writer).lock_owned().await;
        let work = self.tables().clone();
        Ok(MemorySnapshot {
            work,
            _guard: guard,
        })
    }

    async fn commit_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        *self.tables() = snapshot.work;
        Ok(())
    }

    async fn abort_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        drop(snapshot);
        Ok(())
    }

    async fn get_menu_item(
        &self,
        snapshot: &mut MemorySnapshot,
        menu_item_id: i64,
    ) -> Result<MenuItemRecord, StorageError> {
        snapshot
            .work
            .menu_items
            .get(&menu_item_id)
            .cloned()
            .ok_or(StorageError::MenuItemNotFound { menu_item_id })
    }

    async fn get_recipe(
        &self,
        snapshot: &mut MemorySnapshot,
        menu_item_id: i64,
    ) -> Result<Vec<RecipeLineRecord>, StorageError> {
        Ok(snapshot
            .work
            .recipes
            .iter()
            .filter(|r| r.menu_item_id == menu_item_id)
            .cloned()
            .collect())
    }

    async fn get_ingredient_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        ingredient_id: i64,
    ) -> Result<IngredientRecord, StorageError> {
        // The snapshot already holds the store-wide writer lock, which
        // subsumes the per-row lock a relational backend takes here.
        snapshot
            .work
            .ingredients
            .get(&ingredient_id)
            .cloned()
            .ok_or(StorageError::IngredientNotFound { ingredient_id })
    }

    async fn adjust_ingredient_quantity(
        &self,
        snapshot: &mut MemorySnapshot,
        ingredient_id: i64,
        delta: Decimal,
    ) -> Result<Decimal, StorageError> {
        let row = snapshot
            .work
            .ingredients
            .get_mut(&ingredient_id)
            .ok_or(StorageError::IngredientNotFound { ingredient_id })?;
        row.quantity += delta;
        Ok(row.quantity)
    }

    async fn insert_inventory_transaction(
        &self,
        snapshot: &mut MemorySnapshot,
        row: NewInventoryTransaction,
    ) -> Result<i64, StorageError> {
        let id = snapshot.work.assign_id();
        snapshot.work.transactions.push(InventoryTransactionRecord {
            id,
            ingredient_id: row.ingredient_id,
            delta: row.delta,
            kind: row.kind,
            reference_order_id: row.reference_order_id,
            note: row.note,
            created_at: row.created_at,
        });
        Ok(id)
    }

    async fn insert_order(
        &self,
        snapshot: &mut MemorySnapshot,
        row: NewOrder,
    ) -> Result<i64, StorageError> {
        let id = snapshot.work.assign_id();
        snapshot.work.orders.insert(
            id,
            OrderRecord {
                id,
                customer_id: row.customer_id,
                status: row.status,
                payment_method: row.payment_method,
                total_price: row.total_price,
                special_instructions: row.special_instructions,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        );
        Ok(id)
    }

    async fn get_order_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        order_id: i64,
    ) -> Result<OrderRecord, StorageError> {
        snapshot
            .work
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StorageError::OrderNotFound { order_id })
    }

    async fn update_order(
        &self,
        snapshot: &mut MemorySnapshot,
        row: OrderRecord,
    ) -> Result<(), StorageError> {
        let order_id = row.id;
        match snapshot.work.orders.get_mut(&order_id) {
            Some(existing) => {
                *existing = row;
                Ok(())
            }
            None => Err(StorageError::OrderNotFound { order_id }),
        }
    }

    async fn delete_order(
        &self,
        snapshot: &mut MemorySnapshot,
        order_id: i64,
    ) -> Result<(), StorageError> {
        snapshot
            .work
            .orders
            .remove(&order_id)
            .map(|_| ())
            .ok_or(StorageError::OrderNotFound { order_id })
    }

    async fn insert_order_item(
        &self,
        snapshot: &mut MemorySnapshot,
        row: NewOrderItem,
    ) -> Result<i64, StorageError> {
        let id = snapshot.work.assign_id();
        snapshot.work.order_items.push(OrderItemRecord {
            id,
            order_id: row.order_id,
            menu_item_id: row.menu_item_id,
            quantity: row.quantity,
            price_at_order: row.price_at_order,
            customizations: row.customizations,
        });
        Ok(id)
    }

    async fn get_order_items(
        &self,
        snapshot: &mut MemorySnapshot,
        order_id: i64,
    ) -> Result<Vec<OrderItemRecord>, StorageError> {
        Ok(snapshot
            .work
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn delete_order_items(
        &self,
        snapshot: &mut MemorySnapshot,
        order_id: i64,
    ) -> Result<(), StorageError> {
        snapshot.work.order_items.retain(|i| i.order_id != order_id);
        Ok(())
    }

    async fn insert_status_history(
        &self,
        snapshot: &mut MemorySnapshot,
        order_id: i64,
        status: OrderStatus,
        changed_at: &str,
    ) -> Result<(), StorageError> {
        let id = snapshot.work.assign_id();
        snapshot.work.status_history.push(StatusHistoryRecord {
            id,
            order_id,
            status,
            changed_at: changed_at.to_string(),
        });
        Ok(())
    }

    async fn update_menu_item_price(
        &self,
        snapshot: &mut MemorySnapshot,
        menu_item_id: i64,
        new_price: Decimal,
        updated_at: &str,
    ) -> Result<(), StorageError> {
        let item = snapshot
            .work
            .menu_items
            .get_mut(&menu_item_id)
            .ok_or(StorageError::MenuItemNotFound { menu_item_id })?;
        item.price = new_price;
        item.updated_at = updated_at.to_string();
        Ok(())
    }

    async fn insert_price_history(
        &self,
        snapshot: &mut MemorySnapshot,
        menu_item_id: i64,
        old_price: Decimal,
        new_price: Decimal,
        changed_at: &str,
    ) -> Result<(), StorageError> {
        let id = snapshot.work.assign_id();
        snapshot.work.price_history.push(PriceHistoryRecord {
            id,
            menu_item_id,
            old_price,
            new_price,
            changed_at: changed_at.to_string(),
        });
        Ok(())
    }

    async fn get_order(&self, order_id: i64) -> Result<OrderRecord, StorageError> {
        self.tables()
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StorageError::OrderNotFound { order_id })
    }

    async fn get_order_items_committed(
        &self,
        order_id: i64,
    ) -> Result<Vec<OrderItemRecord>, StorageError> {
        Ok(self
            .tables()
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn get_ingredient(&self, ingredient_id: i64) -> Result<IngredientRecord, StorageError> {
        self.tables()
            .ingredients
            .get(&ingredient_id)
            .cloned()
            .ok_or(StorageError::IngredientNotFound { ingredient_id })
    }

    async fn list_transactions_for_order(
        &self,
        order_id: i64,
    ) -> Result<Vec<InventoryTransactionRecord>, StorageError> {
        Ok(self
            .tables()
            .transactions
            .iter()
            .filter(|t| t.reference_order_id == Some(order_id))
            .cloned()
            .collect())
    }

    async fn get_status_history(
        &self,
        order_id: i64,
    ) -> Result<Vec<StatusHistoryRecord>, StorageError> {
        Ok(self
            .tables()
            .status_history
            .iter()
            .filter(|h| h.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn get_price_history(
        &self,
        menu_item_id: i64,
    ) -> Result<Vec<PriceHistoryRecord>, StorageError> {
        Ok(self
            .tables()
            .price_history
            .iter()
            .filter(|h| h.menu_item_id == menu_item_id)
            .cloned()
            .collect())
    }

    async fn get_customer(&self, customer_id: i64) -> Result<CustomerRecord, StorageError> {
        self.tables()
            .customers
            .get(&customer_id)
            .cloned()
            .ok_or(StorageError::CustomerNotFound { customer_id })
    }
}
