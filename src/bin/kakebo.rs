use std::{
    error::Error,
    path::{Path, PathBuf},
    process::exit,
};

use clap::{Parser, Subcommand, ValueEnum};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use kakebo::{
    Category, CsvStore, MovementForm, MovementId, MovementRecord, MovementStore, SqliteStore,
    ValidationError, timezone,
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Record and review incomes and expenses.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The kind of store that `path` points to.
    #[arg(long, value_enum, default_value_t = Backend::Sqlite)]
    backend: Backend,

    /// File path to the movement CSV file or SQLite database.
    #[arg(long)]
    path: PathBuf,

    /// Canonical timezone used to decide what today's date is, e.g. "Europe/Madrid".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// Print debug logs. `RUST_LOG` takes precedence when set.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    /// A comma separated file, append only.
    Csv,
    /// A SQLite database with a `movimientos` table.
    Sqlite,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the movement file or database.
    Init,
    /// Record a new movement.
    Add {
        /// When the movement happened, as YYYY-MM-DD.
        #[arg(long)]
        date: String,
        /// What the movement was for.
        #[arg(long)]
        concept: String,
        /// How much money moved. Negative amounts need a category.
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
        /// Makes the movement an expense: NECESIDAD, CULTURA, OCIO_VICIO or EXTRAS.
        #[arg(long)]
        category: Option<Category>,
    },
    /// List every movement.
    List {
        /// Print the movements as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show a single movement (SQLite only).
    Show {
        /// The ID of the movement.
        id: MovementId,
    },
    /// Change the fields of a stored movement (SQLite only).
    Edit {
        /// The ID of the movement.
        id: MovementId,
        /// The new date, as YYYY-MM-DD.
        #[arg(long)]
        date: Option<String>,
        /// The new concept.
        #[arg(long)]
        concept: Option<String>,
        /// The new amount.
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<f64>,
        /// The new category, which makes the movement an expense.
        #[arg(long, conflicts_with = "income")]
        category: Option<Category>,
        /// Make the movement an income, dropping its category.
        #[arg(long)]
        income: bool,
    },
    /// Delete a movement (SQLite only).
    Delete {
        /// The ID of the movement.
        id: MovementId,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    setup_logging(args.verbose);

    match args.command {
        Command::Init => {
            match args.backend {
                Backend::Csv => {
                    CsvStore::open(&args.path)?;
                }
                Backend::Sqlite => {
                    SqliteStore::initialize(&args.path)?;
                }
            }
            println!("Movement store ready at {:?}", args.path);
        }
        Command::Add {
            date,
            concept,
            amount,
            category,
        } => {
            let form = MovementForm {
                date: parse_date(&date),
                concept,
                amount,
                category,
            };
            let today = timezone::today(&args.timezone)?;
            let movement = form.build(today).unwrap_or_else(|errors| exit_invalid(&errors));

            let store = open_store(args.backend, &args.path)?;
            match store.create(&movement)? {
                Some(id) => println!("Saved movement {id}"),
                None => println!("Saved movement"),
            }
        }
        Command::List { json } => {
            let records = open_store(args.backend, &args.path)?.get_all()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                records.iter().for_each(print_record);
            }
        }
        Command::Show { id } => {
            let store = sqlite_only(args.backend, &args.path, "show");

            match store.read_by_id(id)? {
                Some(record) => print_record(&record),
                None => {
                    eprintln!("No movement with ID {id}");
                    exit(1);
                }
            }
        }
        Command::Edit {
            id,
            date,
            concept,
            amount,
            category,
            income,
        } => {
            let store = sqlite_only(args.backend, &args.path, "edit");
            let Some(mut record) = store.read_by_id(id)? else {
                eprintln!("No movement with ID {id}");
                exit(1);
            };

            let mut form = MovementForm::from(&record.movement);
            if let Some(date) = date {
                form.date = parse_date(&date);
            }
            if let Some(concept) = concept {
                form.concept = concept;
            }
            if let Some(amount) = amount {
                form.amount = amount;
            }
            if income {
                form.category = None;
            } else if category.is_some() {
                form.category = category;
            }
            let today = timezone::today(&args.timezone)?;
            record.movement = form.build(today).unwrap_or_else(|errors| exit_invalid(&errors));

            store.write(&record)?;
            println!("Updated movement {id}");
        }
        Command::Delete { id } => {
            let store = sqlite_only(args.backend, &args.path, "delete");
            store.delete(id)?;
            println!("Deleted movement {id}");
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_log).init();
}

/// Parse a YYYY-MM-DD date, `None` if the text is not a valid date.
fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), DATE_FORMAT).ok()
}

fn open_store(backend: Backend, path: &Path) -> Result<Box<dyn MovementStore>, kakebo::Error> {
    match backend {
        Backend::Csv => Ok(Box::new(CsvStore::open(path)?)),
        Backend::Sqlite => Ok(Box::new(SqliteStore::open(path))),
    }
}

fn sqlite_only(backend: Backend, path: &Path, command: &str) -> SqliteStore {
    if backend != Backend::Sqlite {
        eprintln!("'{command}' needs a SQLite store, CSV movements cannot be looked up by ID.");
        exit(1);
    }

    SqliteStore::open(path)
}

fn exit_invalid(errors: &[ValidationError]) -> ! {
    for error in errors {
        eprintln!("{error}");
    }

    exit(1);
}

fn print_record(record: &MovementRecord) {
    let movement = &record.movement;
    let id = record
        .id
        .map_or_else(|| "-".to_owned(), |id| id.to_string());
    // Expenses are stored as magnitudes, show them as money going out.
    let signed_amount = if movement.is_expense() {
        -movement.amount
    } else {
        movement.amount
    };
    let category = movement
        .category()
        .map(|category| category.to_string())
        .unwrap_or_default();

    println!(
        "{id:>5}  {}  {:<30}  {signed_amount:>10.2}  {category}",
        movement.date, movement.concept
    );
}
