//! Validation pipeline for form processing.
//!
//! 1. Field-level validation (type coercion + per-field validators)
//! 2. Form-level cross-field validation (async `clean` hook)
//!
//! Errors accumulate rather than short-circuiting, so all validation
//! issues are reported at once.

use std::collections::HashMap;

use multiform_core::ValidationError;

use crate::error_list::{ErrorDict, NON_FIELD_ERRORS};
use crate::fields::{clean_field_value, FormFieldDef};
use crate::form::Form;
use crate::form_data::RawInput;
use crate::value::Value;

/// Performs field-level validation for all fields.
///
/// Disabled fields skip validation and take their initial value (from
/// `initial`, falling back to the field's own initial).
pub fn clean_fields(
    field_defs: &[FormFieldDef],
    raw_inputs: &HashMap<String, RawInput>,
    initial: &HashMap<String, Value>,
    cleaned_data: &mut HashMap<String, Value>,
    errors: &mut ErrorDict,
    error_class: &str,
) {
    for field in field_defs {
        if field.disabled {
            if let Some(value) = initial.get(&field.name).or(field.initial.as_ref()) {
                cleaned_data.insert(field.name.clone(), value.clone());
            }
            continue;
        }

        let raw = raw_inputs.get(&field.name).unwrap_or(&RawInput::Missing);
        match clean_field_value(field, raw) {
            Ok(value) => {
                cleaned_data.insert(field.name.clone(), value);
            }
            Err(field_errors) => {
                for err in &field_errors {
                    errors.add_error(&field.name, err, error_class);
                }
            }
        }
    }
}

/// Recorded for a failed `clean` hook whose error carries no message.
pub const INVALID_MESSAGE: &str = "Enter a valid value.";

fn invalid() -> ValidationError {
    ValidationError::new(INVALID_MESSAGE, "invalid")
}

/// Records an error raised by a form-level `clean` hook.
///
/// Field-targeted errors attach to their fields and evict those fields from
/// `cleaned_data`; plain errors become non-field errors. A failed hook always
/// leaves at least one error behind, even when `err` has no messages.
pub fn add_form_error(
    err: &ValidationError,
    cleaned_data: &mut HashMap<String, Value>,
    errors: &mut ErrorDict,
    error_class: &str,
) {
    if err.has_field_errors() {
        let mut fields: Vec<&String> = err.field_errors.keys().collect();
        fields.sort();
        for field in fields {
            let mut recorded = false;
            for field_err in &err.field_errors[field] {
                if !field_err.messages().is_empty() {
                    errors.add_error(field, field_err, error_class);
                    recorded = true;
                }
            }
            if !recorded {
                errors.add_error(field, &invalid(), error_class);
            }
            cleaned_data.remove(field.as_str());
        }
    } else if err.messages().is_empty() {
        errors.add_error(NON_FIELD_ERRORS, &invalid(), error_class);
    } else {
        errors.add_error(NON_FIELD_ERRORS, err, error_class);
    }
}

/// Flattens an error raised by a set-level `clean` hook into
/// `(message, code)` pairs.
///
/// Field-targeted messages read `field: message`. Never returns an empty
/// list.
pub fn flatten_error(err: &ValidationError) -> Vec<(String, String)> {
    let mut flat: Vec<(String, String)> = err
        .messages()
        .into_iter()
        .map(|message| (message, err.code.clone()))
        .collect();
    let mut fields: Vec<&String> = err.field_errors.keys().collect();
    fields.sort();
    for field in fields {
        for field_err in &err.field_errors[field] {
            flat.extend(
                flatten_error(field_err)
                    .into_iter()
                    .map(|(message, code)| (format!("{field}: {message}"), code)),
            );
        }
    }
    if flat.is_empty() {
        flat.push((INVALID_MESSAGE.to_string(), "invalid".to_string()));
    }
    flat
}

/// Validates `form` and returns its errors, if any.
pub async fn validate(form: &mut dyn Form) -> Result<(), ErrorDict> {
    if form.is_valid().await {
        Ok(())
    } else {
        Err(form.errors().await.clone())
    }
}
