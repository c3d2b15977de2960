//! Core error types for multiform.
//!
//! [`ValidationError`] is raised by validators and by the `clean` hooks of
//! forms and form sets. [`MultiformError`] is the crate-wide error enum
//! returned from fallible operations such as reading cleaned data from an
//! invalid form set or loading settings.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Represents a validation error with optional field-level errors.
///
/// Validation errors are either simple (a list of messages) or compound
/// (per-field error lists). A simple error raised from a form's `clean`
/// hook becomes a non-field error; a compound one is attached to the
/// named fields.
///
/// # Examples
///
/// ```
/// use multiform_core::error::ValidationError;
///
/// let err = ValidationError::new("This field is required.", "required");
/// assert_eq!(err.messages(), vec!["This field is required.".to_string()]);
///
/// let mut field_errors = std::collections::HashMap::new();
/// field_errors.insert(
///     "email".to_string(),
///     vec![ValidationError::new("Enter a valid email address.", "invalid")],
/// );
/// let err = ValidationError::with_field_errors(field_errors);
/// assert!(err.has_field_errors());
/// ```
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "invalid").
    pub code: String,
    /// Additional parameters providing context for the message.
    pub params: HashMap<String, String>,
    /// Further messages raised together with the primary one.
    pub extra_messages: Vec<String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            extra_messages: Vec::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` carrying several messages at once.
    pub fn from_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut messages = messages.into_iter().map(Into::into);
        let first = messages.next().unwrap_or_default();
        Self {
            message: first,
            code: "invalid".to_string(),
            params: HashMap::new(),
            extra_messages: messages.collect(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            extra_messages: Vec::new(),
            field_errors,
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if this error targets specific fields.
    pub fn has_field_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }

    /// Returns the flat list of messages, ignoring field errors.
    pub fn messages(&self) -> Vec<String> {
        std::iter::once(&self.message)
            .filter(|m| !m.is_empty())
            .chain(self.extra_messages.iter())
            .cloned()
            .collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.field_errors.is_empty() {
            let mut fields: Vec<&String> = self.field_errors.keys().collect();
            fields.sort();
            let mut first = true;
            for field in fields {
                for error in &self.field_errors[field] {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
            return Ok(());
        }
        write!(f, "{}", self.messages().join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for multiform.
#[derive(Error, Debug)]
pub enum MultiformError {
    /// Validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Cleaned data was requested from something that did not validate.
    #[error("Cleaned data unavailable: {0}")]
    CleanedDataUnavailable(String),

    /// A form index was outside the form set.
    #[error("Form index {index} out of range for {len} forms")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of forms in the set.
        len: usize,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A value could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for MultiformError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, MultiformError>`.
pub type MultiformResult<T> = Result<T, MultiformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_simple() {
        let err = ValidationError::new("This field is required.", "required");
        assert_eq!(err.to_string(), "This field is required.");
    }

    #[test]
    fn test_validation_error_display_field_errors() {
        let mut field_errors = HashMap::new();
        field_errors.insert(
            "email".to_string(),
            vec![ValidationError::new("Invalid email.", "invalid")],
        );
        let err = ValidationError::with_field_errors(field_errors);
        assert_eq!(err.to_string(), "email: Invalid email.");
    }

    #[test]
    fn test_validation_error_from_messages() {
        let err = ValidationError::from_messages(["First.", "Second."]);
        assert_eq!(err.messages(), vec!["First.", "Second."]);
        assert_eq!(err.to_string(), "First.; Second.");
    }

    #[test]
    fn test_validation_error_with_param() {
        let err = ValidationError::new("Too short.", "min_length").with_param("min", "8");
        assert_eq!(err.params.get("min").map(String::as_str), Some("8"));
    }

    #[test]
    fn test_multiform_error_display() {
        let err = MultiformError::IndexOutOfRange { index: 3, len: 2 };
        assert_eq!(err.to_string(), "Form index 3 out of range for 2 forms");
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: MultiformError = ValidationError::new("Bad.", "invalid").into();
        assert!(matches!(err, MultiformError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: Bad.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: MultiformError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }
}
