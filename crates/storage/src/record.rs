use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit of measure for an ingredient's stock quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Grams,
    Milliliters,
    Pieces,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Grams => write!(f, "g"),
            Unit::Milliliters => write!(f, "ml"),
            Unit::Pieces => write!(f, "pcs"),
        }
    }
}

/// Order lifecycle status.
///
/// The legal progression is
/// `pending -> accepted -> preparing -> ready -> delivered`, and any
/// non-terminal status may transition to `cancelled`. `delivered` and
/// `cancelled` are terminal: no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether a single step from `self` to `next` is legal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (_, Cancelled)
                | (Pending, Accepted)
                | (Accepted, Preparing)
                | (Preparing, Ready)
                | (Ready, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Kind of a stock-affecting ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    OrderUsage,
    OrderDeletion,
    Adjustment,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionKind::OrderUsage => "order_usage",
            TransactionKind::OrderDeletion => "order_deletion",
            TransactionKind::Adjustment => "adjustment",
        };
        write!(f, "{}", s)
    }
}

/// A menu item row. Read-only to the engine except for the price-update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub created_at: String,
    pub updated_at: String,
}

/// One edge of a menu item's recipe: the amount of one ingredient consumed
/// per unit of the menu item sold. Immutable while an order is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeLineRecord {
    pub menu_item_id: i64,
    pub ingredient_id: i64,
    pub quantity_per_unit: Decimal,
}

/// An inventory row: current stock for one ingredient.
///
/// `quantity` is a signed decimal (partial units are meaningful) but must
/// never be committed below zero as the result of an order deduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientRecord {
    pub id: i64,
    pub name: String,
    pub quantity: Decimal,
    pub unit: Unit,
    pub reorder_threshold: Decimal,
}

/// An order row. The engine is the only writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub total_price: Decimal,
    pub special_instructions: Option<serde_json::Value>,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub created_at: String,
    pub updated_at: String,
}

/// An order row about to be inserted; the backend assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: i64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub total_price: Decimal,
    pub special_instructions: Option<serde_json::Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// A line item row belonging to exactly one order. `price_at_order` is the
/// price snapshot stamped at creation and is immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i64,
    pub price_at_order: Decimal,
    /// Opaque customization payload; never interpreted by the engine.
    pub customizations: Option<serde_json::Value>,
}

/// A line item about to be inserted; the backend assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i64,
    pub price_at_order: Decimal,
    pub customizations: Option<serde_json::Value>,
}

/// One ledger entry: a signed stock delta for one ingredient.
///
/// Negative deltas are consumption, positive deltas are restocks or manual
/// adjustments. Rows are append-only: never updated or deleted. The ledger
/// is the source of truth for "what happened", independent of the mutable
/// `IngredientRecord.quantity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransactionRecord {
    pub id: i64,
    pub ingredient_id: i64,
    pub delta: Decimal,
    pub kind: TransactionKind,
    pub reference_order_id: Option<i64>,
    pub note: Option<String>,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub created_at: String,
}

/// A ledger entry about to be appended; the backend assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryTransaction {
    pub ingredient_id: i64,
    pub delta: Decimal,
    pub kind: TransactionKind,
    pub reference_order_id: Option<i64>,
    pub note: Option<String>,
    pub created_at: String,
}

/// Append-only record of one order status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryRecord {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatus,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub changed_at: String,
}

/// Append-only record of one menu price change (old -> new).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryRecord {
    pub id: i64,
    pub menu_item_id: i64,
    pub old_price: Decimal,
    pub new_price: Decimal,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub changed_at: String,
}

/// A customer row. Only the display name is of interest to this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: i64,
    pub name: String,
}
