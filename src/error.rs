//! Defines the crate level error type and conversions from the storage libraries.

use crate::database_id::MovementId;

/// The errors that may occur while storing or loading movements.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The backing file or database could not be opened, created, read or
    /// written.
    ///
    /// Callers should pass in the original error as a string.
    #[error("could not access the movement store: {0}")]
    Io(String),

    /// A record in the flat file could not be decoded into a movement.
    ///
    /// The file is considered corrupt; the record is never skipped.
    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord {
        /// The 1-based line number of the record in the file.
        line: u64,
        /// What was wrong with the record.
        reason: String,
    },

    /// A row in the `movimientos` table could not be decoded into a movement.
    #[error("invalid movement row with id {id}: {reason}")]
    InvalidRow {
        /// The ID of the offending row.
        id: MovementId,
        /// What was wrong with the row.
        reason: String,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// The text does not name any expense category.
    #[error("unknown category \"{0}\"")]
    UnknownCategory(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, description)
                if sql_error.code == rusqlite::ErrorCode::CannotOpen =>
            {
                Error::Io(description.unwrap_or_else(|| sql_error.to_string()))
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        let line = value.position().map_or(0, |position| position.line());

        match value.into_kind() {
            csv::ErrorKind::Io(error) => error.into(),
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => Error::InvalidRecord {
                line,
                reason: format!("expected {expected_len} fields but found {len}"),
            },
            csv::ErrorKind::Utf8 { err, .. } => Error::InvalidRecord {
                line,
                reason: err.to_string(),
            },
            kind => Error::InvalidRecord {
                line,
                reason: format!("{kind:?}"),
            },
        }
    }
}
