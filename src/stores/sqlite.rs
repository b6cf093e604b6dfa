//! Implements a SQLite backed movement store.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use time::Date;

use crate::{
    Error,
    database_id::MovementId,
    movement::{Movement, MovementRecord},
    stores::{
        MovementStore,
        codes::{decode_kind, encode_kind},
    },
};

/// Stores movements in the `movimientos` table of a SQLite database.
///
/// The store only remembers where the database is. Every operation opens its
/// own connection and closes it before returning, and runs as a single
/// statement, so each call is atomic on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Use the database at `path`, which must already contain the
    /// `movimientos` table (see [SqliteStore::initialize]).
    ///
    /// Nothing is opened until the first operation, so a missing database is
    /// reported by that operation.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create the database at `path` if needed, make sure it has the
    /// `movimientos` table and use it.
    ///
    /// Existing rows are kept.
    ///
    /// # Errors
    /// Returns an [Error::Io] if the database cannot be created or an
    /// [Error::SqlError] if the table cannot be created.
    pub fn initialize(path: impl AsRef<Path>) -> Result<Self, Error> {
        let connection = Connection::open(path.as_ref())?;
        create_movement_table(&connection)?;

        tracing::debug!("Initialised movement database {:?}", path.as_ref());

        Ok(Self::open(path))
    }

    /// The location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Retrieve the movement with the given `id`.
    ///
    /// Returns `Ok(None)` if there is no such movement.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Io] if the database cannot be opened,
    /// - [Error::InvalidRow] if the row does not describe a valid movement,
    /// - or [Error::SqlError] if there is some other SQL error.
    pub fn read_by_id(&self, id: MovementId) -> Result<Option<MovementRecord>, Error> {
        let connection = self.connect()?;

        let row = connection
            .prepare(
                "SELECT id, tipo_movimiento, concepto, fecha, cantidad, categoria
                 FROM movimientos WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], map_row)
            .optional()?;

        row.map(|row| row.and_then(MovementRow::into_record))
            .transpose()
    }

    /// Retrieve every movement, ordered by ID.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Io] if the database cannot be opened,
    /// - [Error::InvalidRow] if any row does not describe a valid movement,
    /// - or [Error::SqlError] if there is some other SQL error.
    pub fn read_all(&self) -> Result<Vec<MovementRecord>, Error> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT id, tipo_movimiento, concepto, fecha, cantidad, categoria
             FROM movimientos ORDER BY id ASC",
        )?;

        statement
            .query_map([], map_row)?
            .map(|maybe_row| {
                maybe_row
                    .map_err(Error::from)
                    .and_then(|row| row)
                    .and_then(MovementRow::into_record)
            })
            .collect()
    }

    /// Save `record` and return its ID.
    ///
    /// A record without an ID is inserted as a new row with a freshly
    /// assigned ID. A record with an ID replaces every column of that row
    /// with the record's current values.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Io] if the database cannot be opened,
    /// - or [Error::SqlError] if there is some other SQL error.
    pub fn write(&self, record: &MovementRecord) -> Result<MovementId, Error> {
        self.upsert(record.id, &record.movement)
    }

    /// Delete the movement with the given `id`.
    ///
    /// Deleting a movement that does not exist does nothing.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Io] if the database cannot be opened,
    /// - or [Error::SqlError] if there is some other SQL error.
    pub fn delete(&self, id: MovementId) -> Result<(), Error> {
        let connection = self.connect()?;
        let rows_affected = connection.execute("DELETE FROM movimientos WHERE id = ?1", [id])?;

        if rows_affected == 0 {
            tracing::debug!("No movement with id {id} to delete");
        }

        Ok(())
    }

    fn upsert(&self, id: Option<MovementId>, movement: &Movement) -> Result<MovementId, Error> {
        let (tag, category) = encode_kind(movement.kind);
        let connection = self.connect()?;

        let id = connection
            .prepare(
                "INSERT INTO movimientos (id, tipo_movimiento, concepto, fecha, cantidad, categoria)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    tipo_movimiento = excluded.tipo_movimiento,
                    concepto = excluded.concepto,
                    fecha = excluded.fecha,
                    cantidad = excluded.cantidad,
                    categoria = excluded.categoria
                 RETURNING id",
            )?
            .query_row(
                (
                    id,
                    tag,
                    &movement.concept,
                    movement.date,
                    movement.amount,
                    category,
                ),
                |row| row.get(0),
            )?;

        tracing::debug!("Saved movement {id} to {:?}", self.path);

        Ok(id)
    }

    fn connect(&self) -> Result<Connection, Error> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(Error::from)
    }
}

impl MovementStore for SqliteStore {
    fn create(&self, movement: &Movement) -> Result<Option<MovementId>, Error> {
        self.upsert(None, movement).map(Some)
    }

    fn get_all(&self) -> Result<Vec<MovementRecord>, Error> {
        self.read_all()
    }
}

/// Create the movement table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_movement_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS movimientos (
                id INTEGER PRIMARY KEY,
                tipo_movimiento TEXT,
                concepto TEXT,
                fecha TEXT,
                cantidad REAL,
                categoria INTEGER NULL
                )",
        (),
    )?;

    Ok(())
}

/// The columns of a `movimientos` row before the kind is decoded.
struct MovementRow {
    id: MovementId,
    tag: String,
    concept: String,
    date: Date,
    amount: f64,
    category: Option<i64>,
}

/// Read the columns of a row.
///
/// The outer error is a failure of the query itself. The inner error is an
/// [Error::InvalidRow] for a row whose columns hold the wrong type of value,
/// e.g. a NULL amount or a date that is not YYYY-MM-DD.
fn map_row(row: &Row) -> Result<Result<MovementRow, Error>, rusqlite::Error> {
    let id = row.get(0)?;

    match read_columns(id, row) {
        Ok(columns) => Ok(Ok(columns)),
        Err(
            error @ (rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::FromSqlConversionFailure(..)),
        ) => Ok(Err(Error::InvalidRow {
            id,
            reason: error.to_string(),
        })),
        Err(error) => Err(error),
    }
}

fn read_columns(id: MovementId, row: &Row) -> Result<MovementRow, rusqlite::Error> {
    Ok(MovementRow {
        id,
        tag: row.get(1)?,
        concept: row.get(2)?,
        date: row.get(3)?,
        amount: row.get(4)?,
        category: row.get(5)?,
    })
}

impl MovementRow {
    fn into_record(self) -> Result<MovementRecord, Error> {
        let kind = decode_kind(&self.tag, self.category)
            .map_err(|reason| Error::InvalidRow { id: self.id, reason })?;

        Ok(MovementRecord {
            id: Some(self.id),
            movement: Movement {
                concept: self.concept,
                date: self.date,
                amount: self.amount,
                kind,
            },
        })
    }
}
