//! Mapping between the domain types and the values persisted by the stores.
//!
//! Existing ledgers already contain these codes, so they must never be
//! renumbered.

use crate::movement::{Category, MovementKind};

/// The `tipo_movimiento` value for an income.
pub const INCOME_TAG: &str = "I";
/// The `tipo_movimiento` value for an expense.
pub const EXPENSE_TAG: &str = "G";

/// The persisted code for `category`.
pub fn category_code(category: Category) -> i64 {
    match category {
        Category::Need => 1,
        Category::Culture => 2,
        Category::LeisureVice => 3,
        Category::Extras => 4,
    }
}

/// The category persisted as `code`, if any.
pub fn category_from_code(code: i64) -> Option<Category> {
    match code {
        1 => Some(Category::Need),
        2 => Some(Category::Culture),
        3 => Some(Category::LeisureVice),
        4 => Some(Category::Extras),
        _ => None,
    }
}

/// The single character discriminator and nullable category code for `kind`.
pub fn encode_kind(kind: MovementKind) -> (&'static str, Option<i64>) {
    match kind {
        MovementKind::Income => (INCOME_TAG, None),
        MovementKind::Expense(category) => (EXPENSE_TAG, Some(category_code(category))),
    }
}

/// Rebuild a movement kind from its persisted discriminator and category code.
///
/// Returns a description of the problem if the pair does not describe a
/// valid movement.
pub fn decode_kind(tag: &str, category: Option<i64>) -> Result<MovementKind, String> {
    match (tag, category) {
        (INCOME_TAG, None) => Ok(MovementKind::Income),
        (INCOME_TAG, Some(code)) => Err(format!("income has category code {code}")),
        (EXPENSE_TAG, Some(code)) => category_from_code(code)
            .map(MovementKind::Expense)
            .ok_or_else(|| format!("unknown category code {code}")),
        (EXPENSE_TAG, None) => Err("expense has no category".to_owned()),
        (tag, _) => Err(format!("unknown movement type \"{tag}\"")),
    }
}
