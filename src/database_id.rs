//! Database ID type definition.

/// Alias for the integer type used for mapping to the `movimientos.id` column.
pub type MovementId = i64;
