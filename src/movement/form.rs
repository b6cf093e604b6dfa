//! Validation of raw movement input and construction of movements from it.

use time::Date;
use unicode_segmentation::UnicodeSegmentation;

use crate::movement::{Category, Movement};

/// The minimum number of characters in a movement's concept.
pub const MIN_CONCEPT_LENGTH: usize = 5;

/// A reason why raw movement input was rejected.
///
/// The display text is the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No date, or an incomplete date, was entered.
    #[error("invalid date")]
    MissingDate,
    /// Movements record events that have already happened.
    #[error("future dates not allowed")]
    FutureDate,
    /// The concept is shorter than [MIN_CONCEPT_LENGTH].
    #[error("concept must be at least 5 characters")]
    ConceptTooShort,
    /// A movement of zero moves no money.
    #[error("must supply a positive or negative value")]
    ZeroAmount,
    /// The amount is not a number or is infinite.
    #[error("amount must be a finite number")]
    InvalidAmount,
    /// A negative amount is an expense and expenses need a category.
    #[error("category required")]
    MissingCategory,
}

/// Check raw movement input.
///
/// Every check runs, so the returned list holds every problem with the input
/// rather than just the first. An empty list means the input is acceptable.
/// `today` is the current local date, see [crate::timezone::today].
pub fn validate(
    date: Option<Date>,
    concept: &str,
    amount: f64,
    category: Option<Category>,
    today: Date,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match date {
        None => errors.push(ValidationError::MissingDate),
        Some(date) if date > today => errors.push(ValidationError::FutureDate),
        Some(_) => {}
    }

    if concept.graphemes(true).count() < MIN_CONCEPT_LENGTH {
        errors.push(ValidationError::ConceptTooShort);
    }

    if !amount.is_finite() {
        errors.push(ValidationError::InvalidAmount);
    } else if amount == 0.0 {
        errors.push(ValidationError::ZeroAmount);
    }

    if amount < 0.0 && category.is_none() {
        errors.push(ValidationError::MissingCategory);
    }

    errors
}

/// Build a movement from input that has already passed [validate].
///
/// Selecting a category makes the movement an expense of the entered
/// magnitude; the sign of `amount` is dropped because the expense variant
/// already says the money went out. Without a category the movement is an
/// income of exactly `amount`.
pub fn build_movement(
    date: Date,
    concept: &str,
    amount: f64,
    category: Option<Category>,
) -> Movement {
    match category {
        Some(category) => Movement::expense(concept, date, amount.abs(), category),
        None => Movement::income(concept, date, amount),
    }
}

/// The raw fields of a movement as entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementForm {
    /// The entered date, `None` if the date is missing or incomplete.
    pub date: Option<Date>,
    /// The entered description.
    pub concept: String,
    /// The entered amount. Empty input should be passed as `0.0`.
    pub amount: f64,
    /// The selected expense category, if any.
    pub category: Option<Category>,
}

impl From<&Movement> for MovementForm {
    /// Fill the form with a stored movement's fields, e.g. before editing it.
    ///
    /// Clearing the form's category and building it again turns an expense
    /// into an income of the same magnitude.
    fn from(movement: &Movement) -> Self {
        Self {
            date: Some(movement.date),
            concept: movement.concept.clone(),
            amount: movement.amount,
            category: movement.category(),
        }
    }
}

impl MovementForm {
    /// Check the form, see [validate].
    pub fn validate(&self, today: Date) -> Vec<ValidationError> {
        validate(self.date, &self.concept, self.amount, self.category, today)
    }

    /// Validate the form and build the movement it describes.
    ///
    /// # Errors
    /// Returns every [ValidationError] found if the form is not acceptable.
    pub fn build(&self, today: Date) -> Result<Movement, Vec<ValidationError>> {
        let errors = self.validate(today);

        match self.date {
            Some(date) if errors.is_empty() => Ok(build_movement(
                date,
                &self.concept,
                self.amount,
                self.category,
            )),
            _ => Err(errors),
        }
    }
}
