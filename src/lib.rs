//! Kakebo is a personal finance ledger for recording incomes and expenses.
//!
//! This library provides the movement model, the rules deciding which user
//! input is an acceptable movement, and two interchangeable stores: a CSV
//! file ([CsvStore]) and a SQLite database ([SqliteStore]).

#![warn(missing_docs)]

mod database_id;
mod error;
mod movement;
mod stores;
pub mod timezone;

pub use database_id::MovementId;
pub use error::Error;
pub use movement::{
    Category, MIN_CONCEPT_LENGTH, Movement, MovementForm, MovementKind, MovementRecord,
    ValidationError, build_movement, validate,
};
pub use stores::{
    CsvStore, HEADER, MovementReader, MovementStore, SqliteStore, create_movement_table,
};
