//! Inbound order payloads.
//!
//! Drafts are what callers submit; they are distinct from the stored
//! records. A draft's client-supplied `price_at_order` is accepted for
//! display but the committed total is always recomputed from current menu
//! pricing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A candidate order as submitted by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_id: i64,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<serde_json::Value>,
    pub items: Vec<OrderItemDraft>,
}

/// One requested line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemDraft {
    pub menu_item_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub customizations: Option<serde_json::Value>,
    /// Client-supplied display price. Never trusted for the committed total.
    #[serde(default)]
    pub price_at_order: Option<Decimal>,
}

impl OrderDraft {
    /// `(menu_item_id, quantity)` pairs for requirement accumulation.
    pub(crate) fn item_pairs(&self) -> Vec<(i64, i64)> {
        self.items.iter().map(|i| (i.menu_item_id, i.quantity)).collect()
    }
}
