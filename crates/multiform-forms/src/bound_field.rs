//! Bound fields: form fields populated with a value and errors.
//!
//! A [`BoundField`] pairs a field definition with its html name, the value
//! to display, validation errors, and the widget used for rendering. Form
//! renderers iterate over bound fields to build rows.

use multiform_core::utils::text::escape_html;

use crate::error_list::ErrorList;
use crate::fields::FormFieldDef;
use crate::value::Value;
use crate::widgets::{self, Attrs, Widget};

/// A form field bound to a value and validation state.
pub struct BoundField {
    /// The field's HTML name attribute (prefixed).
    pub name: String,
    /// Snapshot of the field definition.
    pub field: BoundFieldDef,
    /// The value shown by the widget.
    pub value: Value,
    /// Validation errors for this field.
    pub errors: ErrorList,
    /// The widget instance used for rendering.
    pub widget: Box<dyn Widget>,
    auto_id: String,
    label_suffix: String,
    use_required_attribute: bool,
}

/// Owned copy of the field metadata a `BoundField` needs.
#[derive(Debug, Clone)]
pub struct BoundFieldDef {
    /// The unprefixed field name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Help text.
    pub help_text: String,
    /// Whether the field is required.
    pub required: bool,
    /// Whether the field is disabled.
    pub disabled: bool,
}

impl BoundField {
    /// Creates a bound field with default id and label formatting.
    pub fn new(field_def: &FormFieldDef, html_name: impl Into<String>, value: Value, errors: ErrorList) -> Self {
        Self {
            name: html_name.into(),
            field: BoundFieldDef {
                name: field_def.name.clone(),
                label: field_def.label_text(),
                help_text: field_def.help_text.clone(),
                required: field_def.required,
                disabled: field_def.disabled,
            },
            value,
            errors,
            widget: widgets::create_widget(field_def.widget, field_def.choices()),
            auto_id: "id_%s".to_string(),
            label_suffix: ":".to_string(),
            use_required_attribute: true,
        }
    }

    /// Sets the `id` template (`%s` is replaced by the html name).
    #[must_use]
    pub fn with_auto_id(mut self, auto_id: impl Into<String>) -> Self {
        self.auto_id = auto_id.into();
        self
    }

    /// Sets the label suffix.
    #[must_use]
    pub fn with_label_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.label_suffix = suffix.into();
        self
    }

    /// Sets whether required fields render the `required` attribute.
    #[must_use]
    pub fn with_required_attribute(mut self, enabled: bool) -> Self {
        self.use_required_attribute = enabled;
        self
    }

    /// Returns the HTML `id` for this field, or an empty string when ids
    /// are disabled.
    pub fn auto_id(&self) -> String {
        if self.auto_id.contains("%s") {
            self.auto_id.replace("%s", &self.name)
        } else if self.auto_id.is_empty() {
            String::new()
        } else {
            self.name.clone()
        }
    }

    /// Renders the widget HTML for this bound field.
    pub fn render(&self, extra_attrs: &Attrs) -> String {
        let mut attrs = extra_attrs.clone();
        let id = self.auto_id();
        if !id.is_empty() {
            attrs.entry("id".to_string()).or_insert(id);
        }
        if self.use_required_attribute && self.field.required && !self.widget.is_hidden() {
            attrs.insert("required".to_string(), "required".to_string());
        }
        if self.field.disabled {
            attrs.insert("disabled".to_string(), "disabled".to_string());
        }
        self.widget.render(&self.name, &self.value, &attrs)
    }

    /// Renders a `<label>` element for this field.
    pub fn label_tag(&self) -> String {
        let mut contents = escape_html(&self.field.label);
        if !self.label_suffix.is_empty() && !contents.ends_with(&[':', '?', '.', '!'][..]) {
            contents.push_str(&self.label_suffix);
        }
        let id = self.auto_id();
        let label_id = if id.is_empty() {
            String::new()
        } else {
            self.widget.id_for_label(&id)
        };
        if label_id.is_empty() {
            format!("<label>{contents}</label>")
        } else {
            format!(r#"<label for="{}">{contents}</label>"#, escape_html(&label_id))
        }
    }

    /// Returns `true` if the widget is hidden.
    pub fn is_hidden(&self) -> bool {
        self.widget.is_hidden()
    }

    /// Returns `true` if this field has any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Renders the error list as an HTML `<ul>` element.
    pub fn errors_as_ul(&self) -> String {
        self.errors.as_ul()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FormFieldType;
    use crate::widgets::WidgetType;

    fn char_field(name: &str) -> FormFieldDef {
        FormFieldDef::new(name, FormFieldType::char())
    }

    #[test]
    fn test_render_with_prefixed_name() {
        let bf = BoundField::new(&char_field("char_field"), "form-0-char_field", Value::Null, ErrorList::new())
            .with_required_attribute(false);
        assert_eq!(
            bf.render(&Attrs::new()),
            r#"<input id="id_form-0-char_field" name="form-0-char_field" type="text" />"#
        );
        assert_eq!(
            bf.label_tag(),
            r#"<label for="id_form-0-char_field">Char field:</label>"#
        );
    }

    #[test]
    fn test_required_attribute() {
        let bf = BoundField::new(&char_field("name"), "name", Value::from("a"), ErrorList::new());
        assert_eq!(
            bf.render(&Attrs::new()),
            r#"<input id="id_name" name="name" required="required" type="text" value="a" />"#
        );
    }

    #[test]
    fn test_auto_id_variants() {
        let field = char_field("email");
        let bf = BoundField::new(&field, "email", Value::Null, ErrorList::new());
        assert_eq!(bf.auto_id(), "id_email");
        let bf = BoundField::new(&field, "email", Value::Null, ErrorList::new()).with_auto_id("id-%s");
        assert_eq!(bf.auto_id(), "id-email");
        let bf = BoundField::new(&field, "email", Value::Null, ErrorList::new()).with_auto_id("yes");
        assert_eq!(bf.auto_id(), "email");
        let bf = BoundField::new(&field, "email", Value::Null, ErrorList::new()).with_auto_id("");
        assert_eq!(bf.auto_id(), "");
        assert_eq!(bf.label_tag(), "<label>Email:</label>");
    }

    #[test]
    fn test_label_suffix_not_doubled() {
        let field = char_field("q").label("Why?");
        let bf = BoundField::new(&field, "q", Value::Null, ErrorList::new());
        assert_eq!(bf.label_tag(), r#"<label for="id_q">Why?</label>"#);
        let bf = BoundField::new(&char_field("q"), "q", Value::Null, ErrorList::new())
            .with_label_suffix("");
        assert_eq!(bf.label_tag(), r#"<label for="id_q">Q</label>"#);
    }

    #[test]
    fn test_label_for_is_escaped_like_input_id() {
        let bf = BoundField::new(&char_field("q"), "q", Value::Null, ErrorList::new())
            .with_auto_id("id_\"%s")
            .with_required_attribute(false);
        assert_eq!(bf.label_tag(), r#"<label for="id_&quot;q">Q:</label>"#);
        assert!(bf.render(&Attrs::new()).contains(r#"id="id_&quot;q""#));
    }

    #[test]
    fn test_errors() {
        let field = char_field("email");
        let bf = BoundField::new(&field, "email", Value::Null, ErrorList::new());
        assert!(!bf.has_errors());
        assert_eq!(bf.errors_as_ul(), "");

        let errors = ErrorList::from_messages(["This field is required."], "errorlist");
        let bf = BoundField::new(&field, "email", Value::Null, errors);
        assert!(bf.has_errors());
        assert_eq!(
            bf.errors_as_ul(),
            r#"<ul class="errorlist"><li>This field is required.</li></ul>"#
        );
    }

    #[test]
    fn test_disabled_and_hidden() {
        let field = char_field("locked").disabled(true).required(false);
        let bf = BoundField::new(&field, "locked", Value::from("v"), ErrorList::new());
        assert!(bf.render(&Attrs::new()).contains(r#"disabled="disabled""#));

        let hidden = char_field("token").widget(WidgetType::HiddenInput);
        let bf = BoundField::new(&hidden, "token", Value::from("t"), ErrorList::new());
        assert!(bf.is_hidden());
        assert!(!bf.render(&Attrs::new()).contains("required"));
    }
}
