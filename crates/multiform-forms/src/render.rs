//! Row-based HTML rendering of forms.
//!
//! Every layout (table, list, paragraph) is produced by the same routine,
//! parameterised by a [`Layout`]. Errors of hidden fields are lifted into
//! the top error row, and hidden widgets are appended to the last row.

use multiform_core::utils::text::escape_html;

use crate::form::Form;
use crate::widgets::Attrs;

/// Row templates for one rendering style.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    normal_row: fn(errors: &str, label: &str, field: &str, help_text: &str) -> String,
    error_row: fn(errors: &str) -> String,
    row_ender: &'static str,
    help_text: fn(text: &str) -> String,
    errors_on_separate_row: bool,
}

fn table_row(errors: &str, label: &str, field: &str, help_text: &str) -> String {
    format!("<tr><th>{label}</th><td>{errors}{field}{help_text}</td></tr>")
}

fn table_error_row(errors: &str) -> String {
    format!(r#"<tr><td colspan="2">{errors}</td></tr>"#)
}

fn table_help_text(text: &str) -> String {
    format!(r#"<br /><span class="helptext">{text}</span>"#)
}

fn ul_row(errors: &str, label: &str, field: &str, help_text: &str) -> String {
    format!("<li>{errors}{label} {field}{help_text}</li>")
}

fn ul_error_row(errors: &str) -> String {
    format!("<li>{errors}</li>")
}

fn p_row(_errors: &str, label: &str, field: &str, help_text: &str) -> String {
    format!("<p>{label} {field}{help_text}</p>")
}

fn p_error_row(errors: &str) -> String {
    errors.to_string()
}

fn span_help_text(text: &str) -> String {
    format!(r#" <span class="helptext">{text}</span>"#)
}

/// `<tr><th>label</th><td>errors field help</td></tr>` rows.
pub const TABLE: Layout = Layout {
    normal_row: table_row,
    error_row: table_error_row,
    row_ender: "</td></tr>",
    help_text: table_help_text,
    errors_on_separate_row: false,
};

/// `<li>errors label field help</li>` rows.
pub const UL: Layout = Layout {
    normal_row: ul_row,
    error_row: ul_error_row,
    row_ender: "</li>",
    help_text: span_help_text,
    errors_on_separate_row: false,
};

/// `<p>label field help</p>` rows, with errors on their own row.
pub const P: Layout = Layout {
    normal_row: p_row,
    error_row: p_error_row,
    row_ender: "</p>",
    help_text: span_help_text,
    errors_on_separate_row: true,
};

/// Renders `form` with `layout`. Rows are joined with `"\n"`.
pub fn html_output<F: Form + ?Sized>(form: &F, layout: &Layout) -> String {
    let mut top_errors = form.non_field_errors();
    let mut output: Vec<String> = Vec::new();
    let mut hidden_fields: Vec<String> = Vec::new();

    for bf in form.bound_fields() {
        let rendered = bf.render(&Attrs::new());
        if bf.is_hidden() {
            top_errors.extend(
                bf.errors
                    .iter()
                    .map(|e| format!("(Hidden field {}) {e}", bf.field.name)),
            );
            hidden_fields.push(rendered);
            continue;
        }

        let errors = bf.errors_as_ul();
        if layout.errors_on_separate_row && !errors.is_empty() {
            output.push((layout.error_row)(&errors));
        }
        let label = if bf.field.label.is_empty() {
            String::new()
        } else {
            bf.label_tag()
        };
        let help_text = if bf.field.help_text.is_empty() {
            String::new()
        } else {
            (layout.help_text)(&escape_html(&bf.field.help_text))
        };
        let row_errors = if layout.errors_on_separate_row { "" } else { errors.as_str() };
        output.push((layout.normal_row)(row_errors, &label, &rendered, &help_text));
    }

    if !top_errors.is_empty() {
        output.insert(0, (layout.error_row)(&top_errors.as_ul()));
    }

    if !hidden_fields.is_empty() {
        let hidden = hidden_fields.concat();
        match output.last_mut() {
            Some(last) if last.ends_with(layout.row_ender) => {
                let cut = last.len() - layout.row_ender.len();
                last.insert_str(cut, &hidden);
            }
            _ => {
                let mut row = (layout.normal_row)("", "", "", "");
                let cut = row.len() - layout.row_ender.len();
                row.insert_str(cut, &hidden);
                output.push(row);
            }
        }
    }

    output.join("\n")
}

/// Renders `form` as table rows.
pub fn as_table<F: Form + ?Sized>(form: &F) -> String {
    html_output(form, &TABLE)
}

/// Renders `form` as list items.
pub fn as_ul<F: Form + ?Sized>(form: &F) -> String {
    html_output(form, &UL)
}

/// Renders `form` as paragraphs.
pub fn as_p<F: Form + ?Sized>(form: &F) -> String {
    html_output(form, &P)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FormFieldDef, FormFieldType};
    use crate::form::BaseForm;
    use crate::form_data::{FormData, FormFiles};
    use crate::widgets::WidgetType;

    fn single_field_form() -> BaseForm {
        BaseForm::new(vec![FormFieldDef::new("char_field", FormFieldType::char())])
    }

    #[test]
    fn test_table_row() {
        assert_eq!(
            single_field_form().as_table(),
            concat!(
                r#"<tr><th><label for="id_char_field">Char field:</label></th><td>"#,
                r#"<input id="id_char_field" name="char_field" required="required" type="text" />"#,
                "</td></tr>"
            )
        );
    }

    #[test]
    fn test_ul_and_p_rows() {
        let form = single_field_form();
        assert_eq!(
            form.as_ul(),
            concat!(
                r#"<li><label for="id_char_field">Char field:</label> "#,
                r#"<input id="id_char_field" name="char_field" required="required" type="text" /></li>"#
            )
        );
        assert_eq!(
            form.as_p(),
            concat!(
                r#"<p><label for="id_char_field">Char field:</label> "#,
                r#"<input id="id_char_field" name="char_field" required="required" type="text" /></p>"#
            )
        );
    }

    #[test]
    fn test_help_text() {
        let form = BaseForm::new(vec![FormFieldDef::new("name", FormFieldType::char())
            .required(false)
            .help_text("Your <full> name")]);
        assert!(form
            .as_table()
            .ends_with(r#"<br /><span class="helptext">Your &lt;full&gt; name</span></td></tr>"#));
        assert!(form
            .as_ul()
            .ends_with(r#" <span class="helptext">Your &lt;full&gt; name</span></li>"#));
    }

    #[tokio::test]
    async fn test_errors_placement() {
        let mut form = single_field_form();
        form.bind(FormData::new(), FormFiles::new());
        form.full_clean().await;
        let error_ul = r#"<ul class="errorlist"><li>This field is required.</li></ul>"#;

        assert!(form.as_table().contains(&format!("<td>{error_ul}<input")));
        assert!(form.as_ul().starts_with(&format!("<li>{error_ul}<label")));
        let p = form.as_p();
        assert!(p.starts_with(&format!("{error_ul}\n<p>")));
    }

    #[test]
    fn test_hidden_field_appended_to_last_row() {
        let form = BaseForm::new(vec![
            FormFieldDef::new("name", FormFieldType::char()).required(false),
            FormFieldDef::new("token", FormFieldType::char())
                .required(false)
                .widget(WidgetType::HiddenInput),
        ]);
        let html = form.as_table();
        assert_eq!(html.lines().count(), 1);
        assert!(html.ends_with(
            r#"<input id="id_token" name="token" type="hidden" /></td></tr>"#
        ));
    }

    #[test]
    fn test_hidden_only_form_gets_own_row() {
        let form = BaseForm::new(vec![FormFieldDef::new("token", FormFieldType::char())
            .required(false)
            .widget(WidgetType::HiddenInput)]);
        assert_eq!(
            form.as_p(),
            r#"<p> <input id="id_token" name="token" type="hidden" /></p>"#
        );
    }

    #[tokio::test]
    async fn test_hidden_field_errors_lifted_to_top() {
        let mut form = BaseForm::new(vec![FormFieldDef::new("token", FormFieldType::char())
            .widget(WidgetType::HiddenInput)]);
        form.bind(FormData::new(), FormFiles::new());
        form.full_clean().await;
        let html = form.as_ul();
        assert!(html.starts_with(
            r#"<li><ul class="errorlist"><li>(Hidden field token) This field is required.</li></ul></li>"#
        ));
    }
}
