//! Core movement domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Serialize, Serializer};
use time::Date;

use crate::{Error, database_id::MovementId};

/// What an expense was spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// Things you cannot live without: rent, groceries, bills.
    #[serde(rename = "NECESIDAD")]
    Need,
    /// Books, courses, concerts, museums.
    #[serde(rename = "CULTURA")]
    Culture,
    /// Eating out, drinks, hobbies and other indulgences.
    #[serde(rename = "OCIO_VICIO")]
    LeisureVice,
    /// One-off or unexpected spending: gifts, repairs.
    #[serde(rename = "EXTRAS")]
    Extras,
}

impl Category {
    /// Every category, in the order they are presented to the user.
    pub const ALL: [Category; 4] = [
        Category::Need,
        Category::Culture,
        Category::LeisureVice,
        Category::Extras,
    ];

    /// The upper case name shown to the user and used in JSON output.
    pub fn name(self) -> &'static str {
        match self {
            Category::Need => "NECESIDAD",
            Category::Culture => "CULTURA",
            Category::LeisureVice => "OCIO_VICIO",
            Category::Extras => "EXTRAS",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Parse either the display name (e.g. "OCIO_VICIO") or the English
    /// variant name (e.g. "leisure-vice"), ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_uppercase().replace('-', "_");

        match normalised.as_str() {
            "NECESIDAD" | "NEED" => Ok(Category::Need),
            "CULTURA" | "CULTURE" => Ok(Category::Culture),
            "OCIO_VICIO" | "LEISURE_VICE" | "LEISUREVICE" => Ok(Category::LeisureVice),
            "EXTRAS" => Ok(Category::Extras),
            _ => Err(Error::UnknownCategory(s.to_owned())),
        }
    }
}

/// Whether money came in or went out, and for expenses, what it went on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum MovementKind {
    /// Money earned. Incomes are never categorised.
    Income,
    /// Money spent, always with a category.
    Expense(Category),
}

/// A single recorded financial event.
///
/// The amount of an expense is the magnitude that was spent; the sign is
/// carried by [MovementKind::Expense] rather than by the number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movement {
    /// A short description of what the movement was for.
    pub concept: String,
    /// When the movement happened.
    #[serde(serialize_with = "serialize_iso_date")]
    pub date: Date,
    /// How much money moved.
    pub amount: f64,
    /// Income or expense.
    #[serde(flatten)]
    pub kind: MovementKind,
}

impl Movement {
    /// Create an income.
    pub fn income(concept: &str, date: Date, amount: f64) -> Self {
        Self {
            concept: concept.to_owned(),
            date,
            amount,
            kind: MovementKind::Income,
        }
    }

    /// Create an expense in `category`.
    pub fn expense(concept: &str, date: Date, amount: f64, category: Category) -> Self {
        Self {
            concept: concept.to_owned(),
            date,
            amount,
            kind: MovementKind::Expense(category),
        }
    }

    /// The category of an expense, `None` for an income.
    pub fn category(&self) -> Option<Category> {
        match self.kind {
            MovementKind::Income => None,
            MovementKind::Expense(category) => Some(category),
        }
    }

    /// Whether this movement is an expense.
    pub fn is_expense(&self) -> bool {
        matches!(self.kind, MovementKind::Expense(_))
    }
}

fn serialize_iso_date<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(date)
}

/// A movement together with the identity a store assigned to it.
///
/// Records built with [MovementRecord::new] have no identity yet; writing
/// them to a [SqliteStore](crate::SqliteStore) inserts a new row. Records
/// read back from the database carry their row ID, so mutating the movement
/// and writing the record again updates that row in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementRecord {
    /// The row ID, `None` until the movement has been stored by a store that
    /// assigns identities.
    pub id: Option<MovementId>,
    /// The movement itself.
    #[serde(flatten)]
    pub movement: Movement,
}

impl MovementRecord {
    /// Wrap a movement that has not been stored yet.
    pub fn new(movement: Movement) -> Self {
        Self { id: None, movement }
    }
}


#[cfg(test)]
mod movement_tests {
    use time::macros::date;

    use crate::{Category, Movement, MovementKind};

    #[test]
    fn equality_is_structural() {
        let first = Movement::expense("Gasto", date!(2000 - 01 - 01), 23.45, Category::Extras);
        let second = Movement::expense("Gasto", date!(2000 - 01 - 01), 23.45, Category::Extras);
        let other_category =
            Movement::expense("Gasto", date!(2000 - 01 - 01), 23.45, Category::Need);

        assert_eq!(first, second);
        assert_ne!(first, other_category);
    }

    #[test]
    fn income_and_expense_with_same_fields_differ() {
        let income = Movement::income("Lottery", date!(2024 - 05 - 14), 100.0);
        let expense = Movement::expense("Lottery", date!(2024 - 05 - 14), 100.0, Category::Extras);

        assert_ne!(income, expense);
        assert_eq!(income.category(), None);
        assert_eq!(expense.category(), Some(Category::Extras));
        assert!(!income.is_expense());
        assert_eq!(expense.kind, MovementKind::Expense(Category::Extras));
    }

    #[test]
    fn serializes_as_flat_json() {
        let movement =
            Movement::expense("comida familiar", date!(2024 - 04 - 06), 35.0, Category::LeisureVice);

        let json = serde_json::to_value(&movement).expect("Could not serialize movement");

        assert_eq!(
            json,
            serde_json::json!({
                "concept": "comida familiar",
                "date": "2024-04-06",
                "amount": 35.0,
                "kind": "expense",
                "category": "OCIO_VICIO",
            })
        );
    }
}
