use std::fmt;

use barista_storage::{OrderStatus, StorageError};
use rust_decimal::Decimal;

/// Errors surfaced by the order-inventory engine.
///
/// Validation errors (`EmptyOrder`, `EmptyBatch`, `InvalidItemQuantity`,
/// `InvalidTotalPrice`, `InvalidPrice`) and availability errors
/// (`InsufficientInventory`) are rejected before any state mutation. State
/// errors (`InvalidStateTransition`) likewise mutate nothing. Anything that
/// fails later in an operation rolls back every write of that operation.
#[derive(Debug)]
pub enum OrderError {
    /// An order must contain at least one line item.
    EmptyOrder,
    /// A batch must contain at least one candidate order.
    EmptyBatch,
    /// A line item quantity below one.
    InvalidItemQuantity { menu_item_id: i64, quantity: i64 },
    /// The recomputed total came out non-positive. A data problem (bad menu
    /// pricing), surfaced as a client error.
    InvalidTotalPrice { total: Decimal },
    /// A menu price update with a non-positive price.
    InvalidPrice { price: Decimal },
    /// Not enough stock of one ingredient to cover the requested usage.
    InsufficientInventory {
        ingredient_id: i64,
        ingredient: String,
        needed: Decimal,
        available: Decimal,
    },
    /// The requested status change is not legal from the order's current
    /// status. `to: None` means the order is terminal and no longer mutable.
    InvalidStateTransition {
        order_id: i64,
        from: OrderStatus,
        to: Option<OrderStatus>,
    },
    /// Arithmetic overflow while computing totals or requirements.
    Overflow { message: String },
    /// A referenced row (order, menu item, ingredient, customer) does not
    /// exist. Also covers writes that found zero rows mid-transaction.
    NotFound(StorageError),
    /// A backend fault unrelated to the request.
    Storage(StorageError),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::EmptyOrder => {
                write!(f, "order must contain at least one item")
            }
            OrderError::EmptyBatch => {
                write!(f, "batch must contain at least one order")
            }
            OrderError::InvalidItemQuantity {
                menu_item_id,
                quantity,
            } => {
                write!(
                    f,
                    "invalid quantity {} for menu item {}: must be at least 1",
                    quantity, menu_item_id
                )
            }
            OrderError::InvalidTotalPrice { total } => {
                write!(f, "total price must be positive, recomputed {}", total)
            }
            OrderError::InvalidPrice { price } => {
                write!(f, "menu price must be positive, got {}", price)
            }
            OrderError::InsufficientInventory {
                ingredient_id,
                ingredient,
                needed,
                available,
            } => {
                write!(
                    f,
                    "insufficient stock for ingredient '{}' (id {}): need {}, have {}",
                    ingredient, ingredient_id, needed, available
                )
            }
            OrderError::InvalidStateTransition {
                order_id,
                from,
                to: Some(to),
            } => {
                write!(
                    f,
                    "illegal status transition for order {}: {} -> {}",
                    order_id, from, to
                )
            }
            OrderError::InvalidStateTransition {
                order_id,
                from,
                to: None,
            } => {
                write!(
                    f,
                    "order {} is {} and can no longer be modified",
                    order_id, from
                )
            }
            OrderError::Overflow { message } => {
                write!(f, "numeric overflow: {}", message)
            }
            OrderError::NotFound(e) => write!(f, "{}", e),
            OrderError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for OrderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrderError::NotFound(e) | OrderError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for OrderError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::OrderNotFound { .. }
            | StorageError::MenuItemNotFound { .. }
            | StorageError::IngredientNotFound { .. }
            | StorageError::CustomerNotFound { .. } => OrderError::NotFound(e),
            StorageError::Backend(_) => OrderError::Storage(e),
        }
    }
}
