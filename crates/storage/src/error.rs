/// All errors that can be returned by a CafeStorage implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No order row with the given id. Also returned when a write that
    /// should affect exactly one order row affects zero (the row vanished
    /// mid-transaction).
    #[error("order not found: {order_id}")]
    OrderNotFound { order_id: i64 },

    /// No menu item row with the given id.
    #[error("menu item not found: {menu_item_id}")]
    MenuItemNotFound { menu_item_id: i64 },

    /// No inventory row with the given ingredient id.
    #[error("ingredient not found: {ingredient_id}")]
    IngredientNotFound { ingredient_id: i64 },

    /// No customer row with the given id.
    #[error("customer not found: {customer_id}")]
    CustomerNotFound { customer_id: i64 },

    /// A backend-specific storage error (DB connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
