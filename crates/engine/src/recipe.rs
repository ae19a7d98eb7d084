//! Recipe catalog access.
//!
//! Recipes map a menu item to the ingredient amounts consumed per unit
//! sold. They are read at order time and never mutated by the engine. All
//! arithmetic is exact decimal; requirements for the same ingredient across
//! lines accumulate.

use std::collections::BTreeMap;

use barista_storage::CafeStorage;
use rust_decimal::Decimal;

use crate::error::OrderError;

/// Total required amount per ingredient for the given
/// `(menu_item_id, quantity)` pairs.
pub(crate) async fn requirements_for<S: CafeStorage>(
    storage: &S,
    snapshot: &mut S::Snapshot,
    items: &[(i64, i64)],
) -> Result<BTreeMap<i64, Decimal>, OrderError> {
    let mut needed: BTreeMap<i64, Decimal> = BTreeMap::new();
    for (menu_item_id, quantity) in items {
        let lines = storage.get_recipe(snapshot, *menu_item_id).await?;
        let multiplier = Decimal::from(*quantity);
        for line in lines {
            let amount = line
                .quantity_per_unit
                .checked_mul(multiplier)
                .ok_or_else(|| OrderError::Overflow {
                    message: format!("requirement for ingredient {}", line.ingredient_id),
                })?;
            let entry = needed.entry(line.ingredient_id).or_insert(Decimal::ZERO);
            *entry = entry
                .checked_add(amount)
                .ok_or_else(|| OrderError::Overflow {
                    message: format!("requirement for ingredient {}", line.ingredient_id),
                })?;
        }
    }
    Ok(needed)
}
