//! Form field definitions and type-level validation.
//!
//! Each [`FormFieldDef`] describes a single form field, including its type,
//! validators, widget, and metadata. The [`FormFieldType`] enum defines
//! the type-specific parsing and coercion logic used by
//! [`clean_field_value`] and [`field_has_changed`].

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;

use multiform_core::utils::text::pretty_name;
use multiform_core::ValidationError;
use regex::Regex;

use crate::form_data::RawInput;
use crate::value::Value;
use crate::widgets::WidgetType;

/// Message used when a required field is empty.
pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// Defines the type of a form field, including type-specific parameters.
#[derive(Debug, Clone)]
pub enum FormFieldType {
    /// A character (string) field.
    Char {
        /// Minimum length (characters).
        min_length: Option<usize>,
        /// Maximum length (characters).
        max_length: Option<usize>,
        /// Whether to strip leading/trailing whitespace.
        strip: bool,
    },
    /// An integer field.
    Integer {
        /// Minimum allowed value.
        min_value: Option<i64>,
        /// Maximum allowed value.
        max_value: Option<i64>,
    },
    /// A floating-point field.
    Float {
        /// Minimum allowed value.
        min_value: Option<f64>,
        /// Maximum allowed value.
        max_value: Option<f64>,
    },
    /// A checkbox. Required booleans must be checked.
    Boolean,
    /// An email address field.
    Email,
    /// A date field (YYYY-MM-DD).
    Date,
    /// A UUID field.
    Uuid,
    /// A single-choice field.
    Choice {
        /// Available choices as `(value, display_label)` pairs.
        choices: Vec<(String, String)>,
    },
    /// A multiple-choice field.
    MultipleChoice {
        /// Available choices as `(value, display_label)` pairs.
        choices: Vec<(String, String)>,
    },
    /// A file upload field. Forms containing one need multipart encoding.
    File {
        /// Maximum file size in bytes.
        max_size: Option<usize>,
        /// Allowed file extensions (e.g. `["jpg", "png"]`), case-insensitive.
        allowed_extensions: Vec<String>,
    },
    /// A field validated against a regular expression.
    Regex {
        /// The regex pattern string.
        regex: String,
    },
}

impl FormFieldType {
    /// A char field with no length limits that strips whitespace.
    pub const fn char() -> Self {
        Self::Char {
            min_length: None,
            max_length: None,
            strip: true,
        }
    }

    /// An integer field with no bounds.
    pub const fn integer() -> Self {
        Self::Integer {
            min_value: None,
            max_value: None,
        }
    }

    /// A file field with no size or extension limits.
    pub const fn file() -> Self {
        Self::File {
            max_size: None,
            allowed_extensions: Vec::new(),
        }
    }

    const fn is_textual(&self) -> bool {
        matches!(
            self,
            Self::Char { .. } | Self::Email | Self::Choice { .. } | Self::Regex { .. }
        )
    }
}

/// Additional validation applied to a cleaned, non-empty value.
pub trait Validator: Send + Sync {
    /// Returns an error if `value` is unacceptable.
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self(value)
    }
}

/// Complete definition of a form field.
pub struct FormFieldDef {
    /// The field name, unprefixed.
    pub name: String,
    /// The field type, controlling parsing and coercion.
    pub field_type: FormFieldType,
    /// Whether this field is required.
    pub required: bool,
    /// Initial value used when the form has none for this field.
    pub initial: Option<Value>,
    /// Help text displayed alongside the field.
    pub help_text: String,
    /// Explicit label; defaults to the prettified name.
    pub label: Option<String>,
    /// The widget type used for rendering.
    pub widget: WidgetType,
    /// Additional validators applied after type coercion.
    pub validators: Vec<Box<dyn Validator>>,
    /// Custom error messages keyed by error code.
    pub error_messages: HashMap<String, String>,
    /// Whether the field is disabled (rendered but not editable).
    pub disabled: bool,
}

impl fmt::Debug for FormFieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormFieldDef")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("initial", &self.initial)
            .field("widget", &self.widget)
            .field("validators", &self.validators.len())
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl FormFieldDef {
    /// Creates a required field using the default widget for its type.
    pub fn new(name: impl Into<String>, field_type: FormFieldType) -> Self {
        let widget = default_widget_for_field_type(&field_type);
        Self {
            name: name.into(),
            field_type,
            required: true,
            initial: None,
            help_text: String::new(),
            label: None,
            widget,
            validators: Vec::new(),
            error_messages: HashMap::new(),
            disabled: false,
        }
    }

    /// Sets whether this field is required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the widget type.
    #[must_use]
    pub fn widget(mut self, widget: WidgetType) -> Self {
        self.widget = widget;
        self
    }

    /// Adds a validator.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Sets a custom error message for a given code ("required", "invalid").
    #[must_use]
    pub fn error_message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), msg.into());
        self
    }

    /// Sets whether this field is disabled.
    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// The label shown to users.
    pub fn label_text(&self) -> String {
        self.label.clone().unwrap_or_else(|| pretty_name(&self.name))
    }

    /// Choices for choice fields, empty otherwise.
    pub fn choices(&self) -> &[(String, String)] {
        match &self.field_type {
            FormFieldType::Choice { choices } | FormFieldType::MultipleChoice { choices } => {
                choices
            }
            _ => &[],
        }
    }

    fn error(&self, code: &str, default: impl Into<String>) -> ValidationError {
        let message = self
            .error_messages
            .get(code)
            .cloned()
            .unwrap_or_else(|| default.into());
        ValidationError::new(message, code)
    }
}

/// Returns the default widget type for a given form field type.
pub const fn default_widget_for_field_type(field_type: &FormFieldType) -> WidgetType {
    match field_type {
        FormFieldType::Char { .. } | FormFieldType::Uuid | FormFieldType::Regex { .. } => {
            WidgetType::TextInput
        }
        FormFieldType::Integer { .. } | FormFieldType::Float { .. } => WidgetType::NumberInput,
        FormFieldType::Boolean => WidgetType::CheckboxInput,
        FormFieldType::Email => WidgetType::EmailInput,
        FormFieldType::Date => WidgetType::DateInput,
        FormFieldType::Choice { .. } => WidgetType::Select,
        FormFieldType::MultipleChoice { .. } => WidgetType::SelectMultiple,
        FormFieldType::File { .. } => WidgetType::FileInput,
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
    })
}

/// The value an empty submission cleans to.
pub fn empty_value(field_type: &FormFieldType) -> Value {
    match field_type {
        t if t.is_textual() => Value::String(String::new()),
        FormFieldType::Boolean => Value::Bool(false),
        FormFieldType::MultipleChoice { .. } => Value::List(Vec::new()),
        _ => Value::Null,
    }
}

/// Coerces raw input into a typed value without checking requiredness or
/// constraints. Empty input yields [`empty_value`].
pub fn coerce(field: &FormFieldDef, raw: &RawInput) -> Result<Value, ValidationError> {
    match &field.field_type {
        FormFieldType::Boolean => {
            let checked = raw.as_text().is_some_and(|s| {
                !matches!(s.trim().to_lowercase().as_str(), "" | "false" | "0" | "off")
            });
            return Ok(Value::Bool(checked));
        }
        FormFieldType::MultipleChoice { .. } => {
            let items = match raw {
                RawInput::List(items) => items.clone(),
                RawInput::Text(s) if !s.is_empty() => vec![s.clone()],
                _ => Vec::new(),
            };
            return Ok(Value::List(items.into_iter().map(Value::String).collect()));
        }
        FormFieldType::File { .. } => {
            return match raw {
                RawInput::File(file) if file.name.is_empty() => Err(field.error(
                    "invalid",
                    "No file was submitted. Check the encoding type on the form.",
                )),
                RawInput::File(file) if file.size == 0 => {
                    Err(field.error("empty", "The submitted file is empty."))
                }
                RawInput::File(file) => Ok(Value::File(file.clone())),
                _ => Ok(Value::Null),
            };
        }
        _ => {}
    }

    let text = match raw {
        RawInput::Text(s) => s.as_str(),
        RawInput::List(items) => items.last().map_or("", String::as_str),
        RawInput::Missing | RawInput::File(_) => "",
    };
    let text = match &field.field_type {
        FormFieldType::Char { strip: false, .. } => text,
        _ => text.trim(),
    };
    if text.is_empty() {
        return Ok(empty_value(&field.field_type));
    }

    match &field.field_type {
        FormFieldType::Integer { .. } => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| field.error("invalid", "Enter a whole number.")),
        FormFieldType::Float { .. } => text
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Float)
            .ok_or_else(|| field.error("invalid", "Enter a number.")),
        FormFieldType::Date => chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| field.error("invalid", "Enter a valid date.")),
        FormFieldType::Uuid => uuid::Uuid::parse_str(text)
            .map(Value::Uuid)
            .map_err(|_| field.error("invalid", "Enter a valid UUID.")),
        _ => Ok(Value::String(text.to_string())),
    }
}

fn check_constraints(field: &FormFieldDef, value: &Value, errors: &mut Vec<ValidationError>) {
    match (&field.field_type, value) {
        (
            FormFieldType::Char {
                min_length,
                max_length,
                ..
            },
            Value::String(s),
        ) => {
            let len = s.chars().count();
            if let Some(min) = min_length.filter(|min| len < *min) {
                errors.push(ValidationError::new(
                    format!("Ensure this value has at least {min} characters (it has {len})."),
                    "min_length",
                ));
            }
            if let Some(max) = max_length.filter(|max| len > *max) {
                errors.push(ValidationError::new(
                    format!("Ensure this value has at most {max} characters (it has {len})."),
                    "max_length",
                ));
            }
        }
        (
            FormFieldType::Integer {
                min_value,
                max_value,
            },
            Value::Int(n),
        ) => {
            if let Some(min) = min_value.filter(|min| n < min) {
                errors.push(ValidationError::new(
                    format!("Ensure this value is greater than or equal to {min}."),
                    "min_value",
                ));
            }
            if let Some(max) = max_value.filter(|max| n > max) {
                errors.push(ValidationError::new(
                    format!("Ensure this value is less than or equal to {max}."),
                    "max_value",
                ));
            }
        }
        (
            FormFieldType::Float {
                min_value,
                max_value,
            },
            Value::Float(n),
        ) => {
            if let Some(min) = min_value.filter(|min| n < min) {
                errors.push(ValidationError::new(
                    format!("Ensure this value is greater than or equal to {min}."),
                    "min_value",
                ));
            }
            if let Some(max) = max_value.filter(|max| n > max) {
                errors.push(ValidationError::new(
                    format!("Ensure this value is less than or equal to {max}."),
                    "max_value",
                ));
            }
        }
        (FormFieldType::Email, Value::String(s)) => {
            if !email_regex().is_match(s) {
                errors.push(field.error("invalid", "Enter a valid email address."));
            }
        }
        (FormFieldType::Choice { choices }, Value::String(s)) => {
            if !choices.iter().any(|(v, _)| v == s) {
                errors.push(ValidationError::new(
                    format!("Select a valid choice. {s} is not one of the available choices."),
                    "invalid_choice",
                ));
            }
        }
        (FormFieldType::MultipleChoice { choices }, Value::List(items)) => {
            for item in items {
                let s = item.to_form_string();
                if !choices.iter().any(|(v, _)| *v == s) {
                    errors.push(ValidationError::new(
                        format!("Select a valid choice. {s} is not one of the available choices."),
                        "invalid_choice",
                    ));
                }
            }
        }
        (
            FormFieldType::File {
                max_size,
                allowed_extensions,
            },
            Value::File(file),
        ) => {
            if let Some(max) = max_size.filter(|max| file.size > *max) {
                errors.push(ValidationError::new(
                    format!("Ensure this file has at most {max} bytes (it has {}).", file.size),
                    "max_size",
                ));
            }
            if !allowed_extensions.is_empty() {
                let ext = file.extension().unwrap_or_default();
                if !allowed_extensions.iter().any(|e| e.to_lowercase() == ext) {
                    errors.push(ValidationError::new(
                        format!(
                            "File extension \u{201c}{ext}\u{201d} is not allowed. Allowed extensions are: {}.",
                            allowed_extensions.join(", ")
                        ),
                        "invalid_extension",
                    ));
                }
            }
        }
        (FormFieldType::Regex { regex }, Value::String(s)) => match Regex::new(regex) {
            Ok(re) if re.is_match(s) => {}
            Ok(_) => errors.push(field.error("invalid", "Enter a valid value.")),
            Err(e) => errors.push(ValidationError::new(format!("Invalid regex: {e}"), "invalid")),
        },
        _ => {}
    }
}

/// Cleans (validates and coerces) raw input into a typed `Value`.
///
/// 1. Type coercion ([`coerce`])
/// 2. Required check
/// 3. Type-specific constraints (lengths, bounds, choices, files)
/// 4. Custom validators
///
/// Errors from steps 3 and 4 accumulate.
pub fn clean_field_value(
    field: &FormFieldDef,
    raw: &RawInput,
) -> Result<Value, Vec<ValidationError>> {
    let value = coerce(field, raw).map_err(|e| vec![e])?;

    let is_empty = match &field.field_type {
        FormFieldType::Boolean => value == Value::Bool(false),
        _ => value.is_empty(),
    };
    if is_empty {
        if field.required {
            return Err(vec![field.error("required", REQUIRED_MESSAGE)]);
        }
        return Ok(value);
    }

    let mut errors = Vec::new();
    check_constraints(field, &value, &mut errors);
    for validator in &field.validators {
        if let Err(e) = validator.validate(&value) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => !matches!(s.to_lowercase().as_str(), "" | "false" | "0"),
        Value::Int(i) => *i != 0,
        other => !other.is_empty(),
    }
}

fn normalized(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(v) => v.clone(),
    }
}

/// Returns `true` if the submitted input differs from `initial`.
///
/// Uncoercible input counts as changed. Disabled fields never change; file
/// fields change whenever a file is submitted.
pub fn field_has_changed(field: &FormFieldDef, initial: Option<&Value>, raw: &RawInput) -> bool {
    if field.disabled {
        return false;
    }
    if matches!(field.field_type, FormFieldType::File { .. }) {
        return matches!(raw, RawInput::File(_));
    }
    let Ok(data) = coerce(field, raw) else {
        return true;
    };
    match &field.field_type {
        FormFieldType::Boolean => initial.is_some_and(truthy) != truthy(&data),
        FormFieldType::MultipleChoice { .. } => {
            let as_set = |v: &Value| -> BTreeSet<String> {
                match v {
                    Value::List(items) => items.iter().map(Value::to_form_string).collect(),
                    Value::Null => BTreeSet::new(),
                    other => std::iter::once(other.to_form_string()).collect(),
                }
            };
            initial.map_or_else(BTreeSet::new, as_set) != as_set(&data)
        }
        _ => normalized(initial) != normalized(Some(&data)),
    }
}
