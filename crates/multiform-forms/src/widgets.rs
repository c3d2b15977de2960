//! Widget system for rendering HTML form elements.
//!
//! Widgets are the bridge between form fields and their HTML representation.
//! Each widget knows how to render itself as HTML, extract a field's
//! [`RawInput`] from submitted data, and generate an `id` for its `<label>`.
//!
//! Attributes always render sorted by name so output is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use multiform_core::utils::text::escape_html;

use crate::form_data::{FormData, FormFiles, RawInput};
use crate::media::Media;
use crate::value::Value;

/// HTML attributes, rendered in name order.
pub type Attrs = BTreeMap<String, String>;

/// Enumerates all built-in widget types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="email">`.
    EmailInput,
    /// `<input type="date">`.
    DateInput,
    /// `<input type="hidden">`.
    HiddenInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="checkbox">`.
    CheckboxInput,
    /// `<select>`.
    Select,
    /// `<select multiple>`.
    SelectMultiple,
    /// `<input type="file">`.
    FileInput,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::EmailInput => "EmailInput",
            Self::DateInput => "DateInput",
            Self::HiddenInput => "HiddenInput",
            Self::Textarea => "Textarea",
            Self::CheckboxInput => "CheckboxInput",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
            Self::FileInput => "FileInput",
        };
        write!(f, "{name}")
    }
}

/// A trait for HTML form widgets.
pub trait Widget: Send + Sync + fmt::Debug {
    /// Returns the widget type enum variant.
    fn widget_type(&self) -> WidgetType;

    /// Renders the widget for `name` showing `value`.
    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String;

    /// Extracts this widget's input from submitted data.
    fn value_from_data(&self, data: &FormData, _files: &FormFiles, name: &str) -> RawInput {
        data.get(name)
            .map_or(RawInput::Missing, |v| RawInput::Text(v.to_string()))
    }

    /// Returns the `id` a `<label>` should point at.
    fn id_for_label(&self, id: &str) -> String {
        id.to_string()
    }

    /// Hidden widgets render without a label row.
    fn is_hidden(&self) -> bool {
        false
    }

    /// Whether the enclosing form must use `multipart/form-data`.
    fn needs_multipart_form(&self) -> bool {
        false
    }

    /// Assets this widget requires.
    fn media(&self) -> Media {
        Media::new()
    }
}

/// Formats attributes as ` key="value"` pairs in name order.
pub fn render_attrs(attrs: &Attrs) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape_html(v)))
        .collect()
}

fn render_input(input_type: &str, name: &str, value: &Value, attrs: &Attrs) -> String {
    let mut final_attrs = attrs.clone();
    final_attrs.insert("type".to_string(), input_type.to_string());
    final_attrs.insert("name".to_string(), name.to_string());
    let shown = value.to_form_string();
    if !shown.is_empty() {
        final_attrs.insert("value".to_string(), shown);
    }
    format!("<input{} />", render_attrs(&final_attrs))
}

// ---------------------------------------------------------------------------
// Built-in widgets
// ---------------------------------------------------------------------------

/// A basic `<input type="text">` widget.
#[derive(Debug, Clone)]
pub struct TextInput;

impl Widget for TextInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::TextInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        render_input("text", name, value, attrs)
    }
}

/// A `<input type="number">` widget.
#[derive(Debug, Clone)]
pub struct NumberInput;

impl Widget for NumberInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::NumberInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        render_input("number", name, value, attrs)
    }
}

/// A `<input type="email">` widget.
#[derive(Debug, Clone)]
pub struct EmailInput;

impl Widget for EmailInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::EmailInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        render_input("email", name, value, attrs)
    }
}

/// A `<input type="date">` widget.
#[derive(Debug, Clone)]
pub struct DateInput;

impl Widget for DateInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::DateInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        render_input("date", name, value, attrs)
    }
}

/// A `<input type="hidden">` widget.
#[derive(Debug, Clone)]
pub struct HiddenInput;

impl Widget for HiddenInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::HiddenInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        render_input("hidden", name, value, attrs)
    }

    fn is_hidden(&self) -> bool {
        true
    }
}

/// A `<textarea>` widget.
#[derive(Debug, Clone)]
pub struct Textarea;

impl Widget for Textarea {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Textarea
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let mut final_attrs = attrs.clone();
        final_attrs.entry("cols".to_string()).or_insert_with(|| "40".to_string());
        final_attrs.entry("rows".to_string()).or_insert_with(|| "10".to_string());
        final_attrs.insert("name".to_string(), name.to_string());
        format!(
            "<textarea{}>\r\n{}</textarea>",
            render_attrs(&final_attrs),
            escape_html(&value.to_form_string())
        )
    }
}

/// A `<input type="checkbox">` widget.
#[derive(Debug, Clone)]
pub struct CheckboxInput;

impl CheckboxInput {
    fn is_checked(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::String(s) => !matches!(s.to_lowercase().as_str(), "" | "false" | "0" | "off"),
            _ => true,
        }
    }
}

impl Widget for CheckboxInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::CheckboxInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let mut final_attrs = attrs.clone();
        final_attrs.insert("type".to_string(), "checkbox".to_string());
        final_attrs.insert("name".to_string(), name.to_string());
        if Self::is_checked(value) {
            final_attrs.insert("checked".to_string(), "checked".to_string());
        }
        format!("<input{} />", render_attrs(&final_attrs))
    }
}

fn render_options(choices: &[(String, String)], selected: &[String]) -> String {
    choices
        .iter()
        .map(|(value, label)| {
            let sel = if selected.contains(value) {
                r#" selected="selected""#
            } else {
                ""
            };
            format!(
                r#"<option value="{}"{sel}>{}</option>"#,
                escape_html(value),
                escape_html(label)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A `<select>` widget.
#[derive(Debug, Clone)]
pub struct Select {
    /// `(value, label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl Select {
    /// Creates a select over `choices`.
    pub const fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for Select {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Select
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let mut final_attrs = attrs.clone();
        final_attrs.insert("name".to_string(), name.to_string());
        let selected = vec![value.to_form_string()];
        format!(
            "<select{}>\n{}\n</select>",
            render_attrs(&final_attrs),
            render_options(&self.choices, &selected)
        )
    }
}

/// A `<select multiple>` widget.
#[derive(Debug, Clone)]
pub struct SelectMultiple {
    /// `(value, label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl SelectMultiple {
    /// Creates a multi-select over `choices`.
    pub const fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for SelectMultiple {
    fn widget_type(&self) -> WidgetType {
        WidgetType::SelectMultiple
    }

    fn render(&self, name: &str, value: &Value, attrs: &Attrs) -> String {
        let mut final_attrs = attrs.clone();
        final_attrs.insert("name".to_string(), name.to_string());
        final_attrs.insert("multiple".to_string(), "multiple".to_string());
        let selected: Vec<String> = match value {
            Value::List(items) => items.iter().map(Value::to_form_string).collect(),
            Value::Null => Vec::new(),
            other => vec![other.to_form_string()],
        };
        format!(
            "<select{}>\n{}\n</select>",
            render_attrs(&final_attrs),
            render_options(&self.choices, &selected)
        )
    }

    fn value_from_data(&self, data: &FormData, _files: &FormFiles, name: &str) -> RawInput {
        data.get_list(name)
            .map_or(RawInput::Missing, |items| RawInput::List(items.to_vec()))
    }
}

/// A `<input type="file">` widget.
#[derive(Debug, Clone)]
pub struct FileInput;

impl Widget for FileInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::FileInput
    }

    fn render(&self, name: &str, _value: &Value, attrs: &Attrs) -> String {
        // File inputs never echo a value back.
        render_input("file", name, &Value::Null, attrs)
    }

    fn value_from_data(&self, _data: &FormData, files: &FormFiles, name: &str) -> RawInput {
        files
            .get(name)
            .map_or(RawInput::Missing, |f| RawInput::File(f.clone()))
    }

    fn needs_multipart_form(&self) -> bool {
        true
    }
}

/// Creates a boxed widget, populating choices for select widgets.
pub fn create_widget(widget_type: WidgetType, choices: &[(String, String)]) -> Box<dyn Widget> {
    match widget_type {
        WidgetType::TextInput => Box::new(TextInput),
        WidgetType::NumberInput => Box::new(NumberInput),
        WidgetType::EmailInput => Box::new(EmailInput),
        WidgetType::DateInput => Box::new(DateInput),
        WidgetType::HiddenInput => Box::new(HiddenInput),
        WidgetType::Textarea => Box::new(Textarea),
        WidgetType::CheckboxInput => Box::new(CheckboxInput),
        WidgetType::Select => Box::new(Select::new(choices.to_vec())),
        WidgetType::SelectMultiple => Box::new(SelectMultiple::new(choices.to_vec())),
        WidgetType::FileInput => Box::new(FileInput),
    }
}
