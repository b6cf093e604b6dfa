//! Contains the movement store trait and its flat file and SQLite implementations.

mod codes;
mod csv;
mod sqlite;

pub use self::csv::{CsvStore, HEADER, MovementReader};
pub use self::sqlite::{SqliteStore, create_movement_table};

use crate::{
    Error,
    database_id::MovementId,
    movement::{Movement, MovementRecord},
};

/// Handles the creation and retrieval of movements.
///
/// Both the flat file and the SQLite store implement this trait so a caller
/// can record and list movements without knowing which backend is
/// configured.
pub trait MovementStore {
    /// Persist a new movement.
    ///
    /// Returns the identity assigned to the movement, or `None` for stores
    /// that do not assign identities.
    fn create(&self, movement: &Movement) -> Result<Option<MovementId>, Error>;

    /// Retrieve every movement in the store's natural order.
    fn get_all(&self) -> Result<Vec<MovementRecord>, Error>;
}
