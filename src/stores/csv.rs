//! Implements a store that appends movements to a comma separated file.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, WriterBuilder};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    database_id::MovementId,
    movement::{Movement, MovementRecord},
    stores::{
        MovementStore,
        codes::{category_code, category_from_code},
    },
};

/// The first line of every movement file.
pub const HEADER: [&str; 4] = ["concepto", "fecha", "cantidad", "categoria"];

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Stores movements in a CSV file, one movement per line after the header.
///
/// Movements can only be appended and read back in the order they were
/// written; the file has no identities, so there is no update or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Open the movement file at `path`, creating it with just the header if
    /// it does not exist yet.
    ///
    /// An existing file is left untouched.
    ///
    /// # Errors
    /// Returns an [Error::Io] if the file needs to be created but cannot be.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            let file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)?;
            let mut writer = WriterBuilder::new().from_writer(file);
            writer.write_record(HEADER)?;
            writer.flush()?;

            tracing::debug!("Created movement file {path:?}");
        }

        Ok(Self { path })
    }

    /// The location of the movement file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `movement` to the end of the file.
    ///
    /// # Errors
    /// Returns an [Error::Io] if the file cannot be opened or written to.
    pub fn write(&self, movement: &Movement) -> Result<(), Error> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        writer.write_record(encode_record(movement))?;
        writer.flush()?;

        tracing::debug!("Appended movement \"{}\" to {:?}", movement.concept, self.path);

        Ok(())
    }

    /// Start reading the movements in the file from the first one.
    ///
    /// Every call returns a new reader positioned just after the header.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Io] if the file cannot be opened,
    /// - or [Error::InvalidRecord] if the file does not start with [HEADER].
    pub fn reader(&self) -> Result<MovementReader, Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;

        let headers = reader.headers()?;
        if headers.iter().ne(HEADER) {
            return Err(Error::InvalidRecord {
                line: 1,
                reason: format!(
                    "expected header \"{}\" but found \"{}\"",
                    HEADER.join(","),
                    headers.iter().collect::<Vec<_>>().join(",")
                ),
            });
        }

        Ok(MovementReader {
            records: reader.into_records(),
        })
    }

    /// Read every movement in the file, in the order they were written.
    ///
    /// # Errors
    /// Fails on the first record that cannot be read, see [CsvStore::reader]
    /// and [MovementReader].
    pub fn read_all(&self) -> Result<Vec<Movement>, Error> {
        self.reader()?.collect()
    }
}

impl MovementStore for CsvStore {
    fn create(&self, movement: &Movement) -> Result<Option<MovementId>, Error> {
        self.write(movement)?;

        Ok(None)
    }

    fn get_all(&self) -> Result<Vec<MovementRecord>, Error> {
        self.reader()?
            .map(|maybe_movement| maybe_movement.map(MovementRecord::new))
            .collect()
    }
}

/// Reads movements from a movement file one at a time.
///
/// Yields an [Error::InvalidRecord] for a record that cannot be decoded into
/// a movement. Such records are reported, never skipped.
pub struct MovementReader {
    records: StringRecordsIntoIter<File>,
}

impl Iterator for MovementReader {
    type Item = Result<Movement, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let maybe_record = self.records.next()?;

        Some(
            maybe_record
                .map_err(Error::from)
                .and_then(|record| decode_record(&record)),
        )
    }
}

fn encode_record(movement: &Movement) -> [String; 4] {
    let category = movement
        .category()
        .map(|category| category_code(category).to_string())
        .unwrap_or_default();

    [
        movement.concept.clone(),
        movement.date.to_string(),
        movement.amount.to_string(),
        category,
    ]
}

fn decode_record(record: &StringRecord) -> Result<Movement, Error> {
    let line = record.position().map_or(0, |position| position.line());
    let invalid = |reason: String| Error::InvalidRecord { line, reason };

    let [concept, date, amount, category] = [0, 1, 2, 3].map(|i| record.get(i));
    let (Some(concept), Some(date), Some(amount), Some(category)) =
        (concept, date, amount, category)
    else {
        return Err(invalid(format!(
            "expected {} fields but found {}",
            HEADER.len(),
            record.len()
        )));
    };

    let date = Date::parse(date, DATE_FORMAT)
        .map_err(|error| invalid(format!("invalid date \"{date}\": {error}")))?;

    let amount = match amount.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() => amount,
        _ => return Err(invalid(format!("invalid amount \"{amount}\""))),
    };

    if category.is_empty() {
        return Ok(Movement::income(concept, date, amount));
    }

    let category = category
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(category_from_code)
        .ok_or_else(|| invalid(format!("unknown category code \"{category}\"")))?;

    Ok(Movement::expense(concept, date, amount, category))
}

#[cfg(test)]
mod csv_store_tests {
    use std::{fs, path::PathBuf};

    use tempfile::TempDir;
    use time::macros::date;

    use crate::{Category, CsvStore, Error, Movement, MovementStore};

    fn get_test_path() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = dir.path().join("test_movimiento.csv");
        (dir, path)
    }

    #[test]
    fn open_creates_file_with_just_the_header() {
        let (_dir, path) = get_test_path();

        let store = CsvStore::open(&path).expect("Could not open store");

        assert_eq!(store.path(), path);
        let contents = fs::read_to_string(&path).expect("Could not read file");
        assert_eq!(contents, "concepto,fecha,cantidad,categoria\n");
    }

    #[test]
    fn reading_an_empty_store_ends_immediately() {
        let (_dir, path) = get_test_path();
        let store = CsvStore::open(&path).expect("Could not open store");

        let mut reader = store.reader().expect("Could not start reading");

        assert_eq!(reader.next(), None);
    }

    #[test]
    fn open_does_not_rewrite_existing_file() {
        let (_dir, path) = get_test_path();
        let contents = "concepto,fecha,cantidad,categoria\nIngreso,1999-12-31,12.34,\n";
        fs::write(&path, contents).expect("Could not write test file");

        CsvStore::open(&path).expect("Could not open store");

        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn open_fails_when_file_cannot_be_created() {
        let (_dir, path) = get_test_path();
        let path = path.join("missing_directory").join("movimientos.csv");

        let result = CsvStore::open(&path);

        assert!(matches!(result, Err(Error::Io(_))), "got {result:?}");
    }

    #[test]
    fn write_appends_income_and_expense_lines() {
        let (_dir, path) = get_test_path();
        let store = CsvStore::open(&path).expect("Could not open store");

        store
            .write(&Movement::income("Ingreso", date!(1999 - 12 - 31), 12.34))
            .expect("Could not write income");
        store
            .write(&Movement::expense(
                "Gasto",
                date!(2000 - 01 - 01),
                23.45,
                Category::Extras,
            ))
            .expect("Could not write expense");

        let contents = fs::read_to_string(&path).expect("Could not read file");
        assert_eq!(
            contents,
            "concepto,fecha,cantidad,categoria\n\
             Ingreso,1999-12-31,12.34,\n\
             Gasto,2000-01-01,23.45,4\n"
        );
    }

    #[test]
    fn reads_records_in_file_order() {
        let (_dir, path) = get_test_path();
        fs::write(
            &path,
            "concepto,fecha,cantidad,categoria\n\
             Ingreso,1999-12-31,12.34,\n\
             Gasto,2000-01-01,23.45,4\n",
        )
        .expect("Could not write test file");
        let store = CsvStore::open(&path).expect("Could not open store");

        let mut reader = store.reader().expect("Could not start reading");

        assert_eq!(
            reader.next(),
            Some(Ok(Movement::income("Ingreso", date!(1999 - 12 - 31), 12.34)))
        );
        assert_eq!(
            reader.next(),
            Some(Ok(Movement::expense(
                "Gasto",
                date!(2000 - 01 - 01),
                23.45,
                Category::Extras
            )))
        );
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn new_reader_starts_from_the_first_record() {
        let (_dir, path) = get_test_path();
        let store = CsvStore::open(&path).expect("Could not open store");
        let income = Movement::income("Ingreso", date!(1999 - 12 - 31), 12.34);
        store.write(&income).expect("Could not write income");

        let mut first_reader = store.reader().expect("Could not start reading");
        assert_eq!(first_reader.next(), Some(Ok(income.clone())));
        assert_eq!(first_reader.next(), None);

        let mut second_reader = CsvStore::open(&path)
            .and_then(|store| store.reader())
            .expect("Could not start reading again");
        assert_eq!(second_reader.next(), Some(Ok(income)));
    }

    #[test]
    fn round_trips_every_category_and_awkward_concepts() {
        let (_dir, path) = get_test_path();
        let store = CsvStore::open(&path).expect("Could not open store");
        let mut want = vec![
            Movement::income("nomina, mayo", date!(2024 - 05 - 01), 1500.0),
            Movement::income("devolución \"hacienda\"", date!(2024 - 06 - 30), 0.1),
        ];
        for (i, category) in Category::ALL.into_iter().enumerate() {
            want.push(Movement::expense(
                "comida familiar",
                date!(2024 - 04 - 06),
                35.5 + i as f64,
                category,
            ));
        }

        for movement in &want {
            store.write(movement).expect("Could not write movement");
        }

        let got = store.read_all().expect("Could not read movements");
        assert_eq!(got, want);
    }

    #[test]
    fn get_all_returns_records_without_ids() {
        let (_dir, path) = get_test_path();
        let store = CsvStore::open(&path).expect("Could not open store");
        let movement = Movement::income("Ingreso", date!(1999 - 12 - 31), 12.34);

        let id = store.create(&movement).expect("Could not create movement");
        let records = store.get_all().expect("Could not get movements");

        assert_eq!(id, None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, None);
        assert_eq!(records[0].movement, movement);
    }

    fn read_single_record(line: &str) -> Option<Result<Movement, Error>> {
        let (_dir, path) = get_test_path();
        fs::write(&path, format!("concepto,fecha,cantidad,categoria\n{line}\n"))
            .expect("Could not write test file");

        CsvStore::open(&path)
            .and_then(|store| store.reader())
            .expect("Could not start reading")
            .next()
    }

    #[test]
    fn invalid_date_is_an_error() {
        let result = read_single_record("Ingreso,31/12/1999,12.34,");

        assert!(
            matches!(result, Some(Err(Error::InvalidRecord { line: 2, .. }))),
            "got {result:?}"
        );
    }

    #[test]
    fn invalid_amount_is_an_error() {
        let result = read_single_record("Ingreso,1999-12-31,doce,");

        assert!(
            matches!(result, Some(Err(Error::InvalidRecord { line: 2, .. }))),
            "got {result:?}"
        );
    }

    #[test]
    fn unknown_category_code_is_an_error() {
        let result = read_single_record("Gasto,2000-01-01,23.45,9");

        assert!(
            matches!(result, Some(Err(Error::InvalidRecord { line: 2, .. }))),
            "got {result:?}"
        );
    }

    #[test]
    fn missing_field_is_an_error() {
        let result = read_single_record("Gasto,2000-01-01,23.45");

        assert!(
            matches!(result, Some(Err(Error::InvalidRecord { .. }))),
            "got {result:?}"
        );
    }

    #[test]
    fn malformed_records_are_not_skipped() {
        let (_dir, path) = get_test_path();
        fs::write(
            &path,
            "concepto,fecha,cantidad,categoria\n\
             Ingreso,1999-12-31,12.34,\n\
             Roto,no es una fecha,1,\n\
             Gasto,2000-01-01,23.45,4\n",
        )
        .expect("Could not write test file");
        let store = CsvStore::open(&path).expect("Could not open store");

        let results = store.reader().expect("Could not start reading").collect::<Vec<_>>();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::InvalidRecord { line: 3, .. })));
        assert!(results[2].is_ok());
        assert!(store.read_all().is_err());
    }

    #[test]
    fn wrong_header_is_an_error() {
        let (_dir, path) = get_test_path();
        fs::write(&path, "date,description,amount\n").expect("Could not write test file");
        let store = CsvStore::open(&path).expect("Could not open store");

        let result = store.reader();

        assert!(
            matches!(result, Err(Error::InvalidRecord { line: 1, .. })),
            "wrong header was accepted"
        );
    }
}
