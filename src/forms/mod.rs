//! Submitted-form schemas: raw strings in, typed values or per-field
//! messages out. Invalid forms are re-rendered with their messages, never
//! turned into HTTP errors.

pub mod login;
pub mod patient;
pub mod register;
pub mod upload;

pub use login::{LoginForm, ValidLogin};
pub use patient::PatientForm;
pub use register::{RegisterForm, ValidRegistration};
pub use upload::{UploadForm, ValidUpload};

use std::collections::BTreeMap;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_NOT_INTEGER: &str = "Not a valid integer value.";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn for_field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.for_field(field).is_empty()
    }

    /// `Ok(value)` when nothing was recorded, otherwise the errors.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// Required text: missing, empty and whitespace-only values are rejected.
/// The value is kept as submitted.
pub(crate) fn required<'a>(
    errors: &mut FormErrors,
    field: &'static str,
    value: &'a Option<String>,
) -> Option<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            errors.add(field, MSG_REQUIRED);
            None
        }
    }
}

/// Reject values longer than `max` characters.
pub(crate) fn max_length(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("Field cannot be longer than {max} characters."));
    }
}

/// Required integer field.
pub(crate) fn required_integer(
    errors: &mut FormErrors,
    field: &'static str,
    value: &Option<String>,
) -> Option<i64> {
    let raw = required(errors, field, value)?;
    match raw.trim().parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.add(field, MSG_NOT_INTEGER);
            None
        }
    }
}
