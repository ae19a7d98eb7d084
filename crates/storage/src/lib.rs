pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::{MemorySnapshot, MemoryStorage};
pub use record::{
    CustomerRecord, IngredientRecord, InventoryTransactionRecord, MenuItemRecord,
    NewInventoryTransaction, NewOrder, NewOrderItem, OrderItemRecord, OrderRecord, OrderStatus,
    PriceHistoryRecord, RecipeLineRecord, StatusHistoryRecord, TransactionKind, Unit,
};
pub use traits::CafeStorage;
