//! Movements: the incomes and expenses recorded in the ledger, and the rules
//! deciding which user input can become one.

mod domain;
mod form;

pub use domain::{Category, Movement, MovementKind, MovementRecord};
pub use form::{MIN_CONCEPT_LENGTH, MovementForm, ValidationError, build_movement, validate};
