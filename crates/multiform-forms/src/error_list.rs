//! Error containers and their HTML, text, and JSON renderings.
//!
//! [`ErrorList`] is an ordered list of messages for one field (or for a
//! whole form or form set). [`ErrorDict`] maps field names to error lists.

use std::collections::BTreeMap;
use std::fmt;

use multiform_core::utils::text::escape_html;
use multiform_core::ValidationError;

/// Key under which form-level (non-field) errors are stored.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// The default CSS class for rendered error lists.
pub const DEFAULT_ERROR_CLASS: &str = "errorlist";

/// An ordered list of error messages, each with an optional code.
///
/// # Examples
///
/// ```
/// use multiform_forms::error_list::ErrorList;
///
/// let mut errors = ErrorList::new();
/// errors.push("This field is required.");
/// assert_eq!(
///     errors.as_ul(),
///     r#"<ul class="errorlist"><li>This field is required.</li></ul>"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorList {
    messages: Vec<String>,
    codes: Vec<String>,
    error_class: String,
}

impl Default for ErrorList {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorList {
    /// Creates an empty list rendered with the default CSS class.
    pub fn new() -> Self {
        Self::with_error_class(DEFAULT_ERROR_CLASS)
    }

    /// Creates an empty list rendered with `error_class`.
    pub fn with_error_class(error_class: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            codes: Vec::new(),
            error_class: error_class.into(),
        }
    }

    /// Creates a list from messages.
    pub fn from_messages<I, S>(messages: I, error_class: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
        Self {
            codes: vec![String::new(); messages.len()],
            messages,
            error_class: error_class.to_string(),
        }
    }

    /// Returns the CSS class used when rendering.
    pub fn error_class(&self) -> &str {
        &self.error_class
    }

    /// Appends a message without a code.
    pub fn push(&mut self, message: impl Into<String>) {
        self.push_with_code(message, "");
    }

    /// Appends a message tagged with `code`.
    pub fn push_with_code(&mut self, message: impl Into<String>, code: impl Into<String>) {
        self.messages.push(message.into());
        self.codes.push(code.into());
    }

    /// The code of each message, in order. Uncoded messages have `""`.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterates over the messages.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.messages.iter()
    }

    /// The messages as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.messages
    }

    /// Renders `<ul class="...">` with one `<li>` per message, or nothing
    /// when empty.
    pub fn as_ul(&self) -> String {
        if self.messages.is_empty() {
            return String::new();
        }
        let items: String = self
            .messages
            .iter()
            .map(|e| format!("<li>{}</li>", escape_html(e)))
            .collect();
        format!(r#"<ul class="{}">{items}</ul>"#, escape_html(&self.error_class))
    }

    /// Renders one `* message` line per message.
    pub fn as_text(&self) -> String {
        self.messages
            .iter()
            .map(|e| format!("* {e}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the messages as a JSON array of `{message, code}` objects.
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.messages
                .iter()
                .zip(&self.codes)
                .map(|(message, code)| serde_json::json!({ "message": message, "code": code }))
                .collect(),
        )
    }
}

impl Extend<String> for ErrorList {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        for message in iter {
            self.push(message);
        }
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl PartialEq<[&str]> for ErrorList {
    fn eq(&self, other: &[&str]) -> bool {
        self.messages.len() == other.len()
            && self.messages.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl<const N: usize> PartialEq<[&str; N]> for ErrorList {
    fn eq(&self, other: &[&str; N]) -> bool {
        *self == other[..]
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ul())
    }
}

/// Per-field errors of one form, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDict {
    errors: BTreeMap<String, ErrorList>,
}

impl ErrorDict {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `message` to the list for `field`, creating it with
    /// `error_class` if needed.
    pub fn add(&mut self, field: &str, message: impl Into<String>, error_class: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| ErrorList::with_error_class(error_class))
            .push(message);
    }

    /// Adds every message of `err` to the list for `field`, keeping its
    /// code.
    pub fn add_error(&mut self, field: &str, err: &ValidationError, error_class: &str) {
        let list = self
            .errors
            .entry(field.to_string())
            .or_insert_with(|| ErrorList::with_error_class(error_class));
        for message in err.messages() {
            list.push_with_code(message, err.code.as_str());
        }
    }

    /// Replaces the list for `field`.
    pub fn insert(&mut self, field: impl Into<String>, errors: ErrorList) {
        self.errors.insert(field.into(), errors);
    }

    /// Returns the list for `field`.
    pub fn get(&self, field: &str) -> Option<&ErrorList> {
        self.errors.get(field)
    }

    /// Returns `true` if `field` has errors.
    pub fn contains_key(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Number of fields with errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if no field has errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates over `(field, errors)` in field-name order.
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, ErrorList> {
        self.errors.iter()
    }

    /// Flattens to plain `field -> messages` pairs.
    pub fn to_messages(&self) -> BTreeMap<String, Vec<String>> {
        self.errors
            .iter()
            .map(|(k, v)| (k.clone(), v.as_slice().to_vec()))
            .collect()
    }

    /// Renders `<ul class="errorlist">` with a nested list per field.
    pub fn as_ul(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        let items: String = self
            .errors
            .iter()
            .map(|(field, list)| format!("<li>{field}{}</li>", list.as_ul()))
            .collect();
        format!(r#"<ul class="{DEFAULT_ERROR_CLASS}">{items}</ul>"#)
    }

    /// Renders `* field` followed by indented messages.
    pub fn as_text(&self) -> String {
        let mut out = Vec::new();
        for (field, list) in &self.errors {
            out.push(format!("* {field}"));
            out.extend(list.iter().map(|e| format!("  * {e}")));
        }
        out.join("\n")
    }

    /// Returns a JSON object mapping each field to its error array.
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.errors
                .iter()
                .map(|(k, v)| (k.clone(), v.as_json()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a ErrorDict {
    type Item = (&'a String, &'a ErrorList);
    type IntoIter = std::collections::btree_map::Iter<'a, String, ErrorList>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ErrorDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ul())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_renders_nothing() {
        let errors = ErrorList::new();
        assert!(errors.is_empty());
        assert_eq!(errors.as_ul(), "");
        assert_eq!(errors.as_text(), "");
        assert!(errors.as_slice().is_empty());
    }

    #[test]
    fn test_list_escapes_messages() {
        let errors = ErrorList::from_messages(["<b>bad</b>"], "errors");
        assert_eq!(
            errors.as_ul(),
            r#"<ul class="errors"><li>&lt;b&gt;bad&lt;/b&gt;</li></ul>"#
        );
        assert_eq!(errors.error_class(), "errors");
    }

    #[test]
    fn test_list_as_text_and_json() {
        let errors = ErrorList::from_messages(["One.", "Two."], DEFAULT_ERROR_CLASS);
        assert_eq!(errors.as_text(), "* One.\n* Two.");
        assert_eq!(
            errors.as_json(),
            serde_json::json!([
                {"message": "One.", "code": ""},
                {"message": "Two.", "code": ""}
            ])
        );
        assert_eq!(errors, ["One.", "Two."]);
    }

    #[test]
    fn test_dict_add_and_render() {
        let mut dict = ErrorDict::new();
        dict.add("name", "Required.", DEFAULT_ERROR_CLASS);
        dict.add("age", "Too old.", DEFAULT_ERROR_CLASS);
        dict.add("age", "Not a number.", DEFAULT_ERROR_CLASS);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get("age").map(ErrorList::len), Some(2));
        assert_eq!(
            dict.as_ul(),
            concat!(
                r#"<ul class="errorlist">"#,
                r#"<li>age<ul class="errorlist"><li>Too old.</li><li>Not a number.</li></ul></li>"#,
                r#"<li>name<ul class="errorlist"><li>Required.</li></ul></li>"#,
                "</ul>"
            )
        );
        assert_eq!(dict.as_text(), "* age\n  * Too old.\n  * Not a number.\n* name\n  * Required.");
    }

    #[test]
    fn test_codes_reach_json() {
        let mut dict = ErrorDict::new();
        dict.add_error(
            "age",
            &ValidationError::new("This field is required.", "required"),
            DEFAULT_ERROR_CLASS,
        );
        dict.add("age", "Plain.", DEFAULT_ERROR_CLASS);
        let list = dict.get("age").unwrap();
        assert_eq!(list.codes(), ["required", ""]);
        assert_eq!(
            dict.as_json(),
            serde_json::json!({"age": [
                {"message": "This field is required.", "code": "required"},
                {"message": "Plain.", "code": ""}
            ]})
        );
    }

    #[test]
    fn test_error_class_is_escaped() {
        let errors = ErrorList::from_messages(["Bad."], "x\" onclick=\"y");
        assert_eq!(
            errors.as_ul(),
            r#"<ul class="x&quot; onclick=&quot;y"><li>Bad.</li></ul>"#
        );
    }

    #[test]
    fn test_dict_to_messages() {
        let mut dict = ErrorDict::new();
        dict.add("char_field", "This field is required.", DEFAULT_ERROR_CLASS);
        let messages = dict.to_messages();
        assert_eq!(
            messages.get("char_field"),
            Some(&vec!["This field is required.".to_string()])
        );
        assert_eq!(
            dict.as_json(),
            serde_json::json!({"char_field": [{"message": "This field is required.", "code": ""}]})
        );
    }
}
