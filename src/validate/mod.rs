/// Per-field validation: normalization and scalar constraint checks.
///
/// Every rule is field-scoped. Entity-level entry points run all fields and
/// accumulate failures so a submission reports everything wrong at once; a
/// field that fails its length check reports once and skips its remaining
/// checks.
pub mod mission;

use crate::domain::{AstronautInput, MissionInput, SpaceshipInput};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

pub const MIN_ADULT_AGE: i32 = 18;

/// Failure taxonomy for field-scoped errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationKind {
    InvalidFormat,
    OutOfRange,
    ScheduleConflict,
    ResourceConflict,
    CapacityExceeded,
}

/// A single field-scoped failure
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: ValidationKind,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }
}

/// Ordered accumulator of field failures from one validation pass
#[derive(Debug, Clone, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Append another report's failures, preserving order
    pub fn append(&mut self, other: FieldErrors) {
        self.errors.extend(other.errors);
    }

    pub fn capture<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(error);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Presentation contract: field name -> list of messages
    pub fn into_field_map(self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in self.errors {
            map.entry(error.field.to_string())
                .or_default()
                .push(error.message);
        }
        map
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Trimmed, letters-only name of at least two characters
pub fn alpha_name(field: &'static str, label: &str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < 2 {
        return Err(FieldError::new(
            field,
            ValidationKind::InvalidFormat,
            format!("{label} must contain at least 2 characters"),
        ));
    }
    if !trimmed.chars().all(|c| c.is_alphabetic()) {
        return Err(FieldError::new(
            field,
            ValidationKind::InvalidFormat,
            format!("{label} may contain only letters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Like [`alpha_name`] but spaces are permitted and ignored by the
/// alphabetic check (mission name, destination)
pub fn spaced_name(field: &'static str, label: &str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < 2 {
        return Err(FieldError::new(
            field,
            ValidationKind::InvalidFormat,
            format!("{label} must contain at least 2 characters"),
        ));
    }
    if !trimmed
        .chars()
        .filter(|c| *c != ' ')
        .all(|c| c.is_alphabetic())
    {
        return Err(FieldError::new(
            field,
            ValidationKind::InvalidFormat,
            format!("{label} may contain only letters and spaces"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trimmed free-form name of at least two characters (spaceship name)
pub fn plain_name(field: &'static str, label: &str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < 2 {
        return Err(FieldError::new(
            field,
            ValidationKind::InvalidFormat,
            format!("{label} must contain at least 2 characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Manufacturer: letters, digits, hyphen, whitespace, parentheses, period
pub fn manufacturer(value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < 2 {
        return Err(FieldError::new(
            "manufacturer",
            ValidationKind::InvalidFormat,
            "manufacturer must contain at least 2 characters",
        ));
    }
    let allowed = |c: char| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '(' | ')' | '.');
    if !trimmed.chars().all(allowed) {
        return Err(FieldError::new(
            "manufacturer",
            ValidationKind::InvalidFormat,
            "manufacturer may contain only letters, digits, hyphens, spaces, parentheses and periods",
        ));
    }
    Ok(trimmed.to_string())
}

/// A date that must not lie in the future
pub fn past_date(
    field: &'static str,
    label: &str,
    value: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, FieldError> {
    if value > today {
        return Err(FieldError::new(
            field,
            ValidationKind::OutOfRange,
            format!("{label} cannot be in the future"),
        ));
    }
    Ok(value)
}

/// Whole-year age, adjusted down by one when this year's birthday has not
/// yet been reached
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Birth date: in the past and implying age >= 18
pub fn birth_date(value: NaiveDate, today: NaiveDate) -> Result<NaiveDate, FieldError> {
    let value = past_date("birth_date", "birth date", value, today)?;
    if age_on(value, today) < MIN_ADULT_AGE {
        return Err(FieldError::new(
            "birth_date",
            ValidationKind::OutOfRange,
            format!("astronaut must be at least {MIN_ADULT_AGE} years old"),
        ));
    }
    Ok(value)
}

pub fn capacity(value: i32) -> Result<i32, FieldError> {
    if value < 0 {
        return Err(FieldError::new(
            "capacity",
            ValidationKind::OutOfRange,
            "capacity cannot be negative",
        ));
    }
    Ok(value)
}

pub fn mass(value: f64) -> Result<f64, FieldError> {
    if value <= 0.0 {
        return Err(FieldError::new(
            "mass",
            ValidationKind::OutOfRange,
            "mass must be positive",
        ));
    }
    Ok(value)
}

/// Validate and normalize an astronaut payload
pub fn astronaut(input: &AstronautInput, today: NaiveDate) -> Result<AstronautInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    let first_name = errors.capture(alpha_name("first_name", "first name", &input.first_name));
    let last_name = errors.capture(alpha_name("last_name", "last name", &input.last_name));
    let nationality = errors.capture(alpha_name("nationality", "nationality", &input.nationality));
    let birth = errors.capture(birth_date(input.birth_date, today));

    let normalized = AstronautInput {
        first_name: first_name.unwrap_or_default(),
        last_name: last_name.unwrap_or_default(),
        birth_date: birth.unwrap_or(input.birth_date),
        nationality: nationality.unwrap_or_default(),
    };
    errors.into_result(normalized)
}

/// Validate and normalize a spaceship payload
pub fn spaceship(input: &SpaceshipInput, today: NaiveDate) -> Result<SpaceshipInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = errors.capture(plain_name("name", "spaceship name", &input.name));
    let maker = errors.capture(manufacturer(&input.manufacturer));
    let launch = errors.capture(past_date(
        "launch_date",
        "launch date",
        input.launch_date,
        today,
    ));
    let cap = errors.capture(capacity(input.capacity));
    let mass_t = errors.capture(mass(input.mass));

    let normalized = SpaceshipInput {
        name: name.unwrap_or_default(),
        manufacturer: maker.unwrap_or_default(),
        launch_date: launch.unwrap_or(input.launch_date),
        capacity: cap.unwrap_or(input.capacity),
        mass: mass_t.unwrap_or(input.mass),
        is_available: input.is_available,
    };
    errors.into_result(normalized)
}

/// Validate and normalize the scalar fields of a mission payload.
///
/// Cross-field and cross-entity rules live in [`mission`]; their failures
/// are reported together with these, so the report is returned alongside
/// the normalized payload instead of cutting the submission short.
pub fn mission_fields(input: &MissionInput) -> (MissionInput, FieldErrors) {
    let mut errors = FieldErrors::new();
    let name = errors.capture(spaced_name("name", "mission name", &input.name));
    let destination = errors.capture(spaced_name("destination", "destination", &input.destination));

    let normalized = MissionInput {
        name: name.unwrap_or_default(),
        destination: destination.unwrap_or_default(),
        ..input.clone()
    };
    (normalized, errors)
}
