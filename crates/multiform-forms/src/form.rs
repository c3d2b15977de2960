//! Form trait and `BaseForm` implementation.
//!
//! The [`Form`] trait is the core abstraction for every form type. It
//! supports async validation (a `clean` hook may need I/O), lazy error
//! computation, change detection, and HTML rendering.
//!
//! [`BaseForm`] is a concrete, general-purpose implementation built from a
//! list of field definitions. [`FormClass`] is a constructor for forms of
//! one kind; [`DeclaredForm`] is the closure-backed implementation used to
//! declare form classes without writing a new type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use multiform_core::{FormSettings, ValidationError};
use uuid::Uuid;

use crate::bound_field::BoundField;
use crate::error_list::{ErrorDict, ErrorList, NON_FIELD_ERRORS};
use crate::fields::{field_has_changed, FormFieldDef};
use crate::form_data::{FormData, FormFiles, RawInput};
use crate::media::Media;
use crate::render;
use crate::validation;
use crate::value::Value;
use crate::widgets;

/// Construction parameters shared by every form.
#[derive(Debug, Clone)]
pub struct FormOptions {
    /// Submitted form data. `Some` binds the form.
    pub data: Option<FormData>,
    /// Submitted files. `Some` binds the form.
    pub files: Option<FormFiles>,
    /// Template for HTML ids; `%s` is replaced by the html name. Empty
    /// disables ids.
    pub auto_id: String,
    /// Namespace prepended to field names as `{prefix}-{name}`.
    pub prefix: Option<String>,
    /// Initial values keyed by field name.
    pub initial: HashMap<String, Value>,
    /// CSS class of rendered error lists.
    pub error_class: String,
    /// Suffix appended to labels.
    pub label_suffix: String,
    /// Whether required fields render the `required` attribute.
    pub use_required_attribute: bool,
    /// Extra construction values available to field builders.
    pub defaults: HashMap<String, Value>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self::from_settings(&FormSettings::default())
    }
}

impl FormOptions {
    /// Creates options with rendering defaults taken from `settings`.
    pub fn from_settings(settings: &FormSettings) -> Self {
        Self {
            data: None,
            files: None,
            auto_id: settings.auto_id.clone(),
            prefix: None,
            initial: HashMap::new(),
            error_class: settings.error_class.clone(),
            label_suffix: settings.label_suffix.clone(),
            use_required_attribute: settings.use_required_attribute,
            defaults: HashMap::new(),
        }
    }

    /// Returns `true` if data or files were supplied.
    pub const fn is_bound(&self) -> bool {
        self.data.is_some() || self.files.is_some()
    }
}

/// The core form trait. All form types implement this.
///
/// Errors are computed lazily: the first call to [`errors`](Form::errors)
/// or [`is_valid`](Form::is_valid) runs [`full_clean`](Form::full_clean)
/// and caches the result. Rendering methods are synchronous and show the
/// cached validation state.
#[async_trait]
pub trait Form: Send + Sync {
    /// Name of the form class this instance was built from.
    fn class_name(&self) -> &str;

    /// Id of the form class this instance was built from, if known.
    fn class_id(&self) -> Option<Uuid> {
        None
    }

    /// Returns the form's field definitions.
    fn fields(&self) -> &[FormFieldDef];

    /// Appends a field definition.
    fn add_field(&mut self, field: FormFieldDef);

    /// Returns the initial values for fields.
    fn initial(&self) -> &HashMap<String, Value>;

    /// Returns the form prefix (for namespacing multiple forms on one page).
    fn prefix(&self) -> Option<&str>;

    /// Returns `field_name` with the form prefix applied.
    fn add_prefix(&self, field_name: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}-{field_name}"),
            None => field_name.to_string(),
        }
    }

    /// Binds data and files, discarding any cached validation state.
    fn bind(&mut self, data: FormData, files: FormFiles);

    /// Returns `true` if this form has been bound to data.
    fn is_bound(&self) -> bool;

    /// Runs validation and caches errors and cleaned data.
    ///
    /// An unbound form ends with empty errors and no cleaned data.
    async fn full_clean(&mut self);

    /// Returns the per-field errors, validating first if needed.
    async fn errors(&mut self) -> &ErrorDict;

    /// Returns the cached errors without validating.
    fn cached_errors(&self) -> Option<&ErrorDict>;

    /// Returns `true` if the form is bound and has no errors.
    async fn is_valid(&mut self) -> bool {
        self.is_bound() && self.errors().await.is_empty()
    }

    /// Returns the cleaned data of the last validation run, if any.
    fn cleaned_data(&self) -> Option<&HashMap<String, Value>>;

    /// Returns the form-level errors of the last validation run.
    fn non_field_errors(&self) -> ErrorList;

    /// Names of the fields whose submitted value differs from the initial.
    fn changed_data(&self) -> Vec<String>;

    /// Returns `true` if any field changed.
    fn has_changed(&self) -> bool {
        !self.changed_data().is_empty()
    }

    /// Returns `true` if rendering requires `multipart/form-data`.
    fn is_multipart(&self) -> bool;

    /// Returns the combined media of the form and its widgets.
    fn media(&self) -> Media;

    /// Returns bound fields for rendering.
    fn bound_fields(&self) -> Vec<BoundField>;

    /// Returns `true` if this form was built from `class`.
    ///
    /// Compares class ids. Forms without a class id fall back to comparing
    /// class names.
    fn is_instance_of(&self, class: &dyn FormClass) -> bool {
        match self.class_id() {
            Some(id) => id == class.id(),
            None => self.class_name() == class.name(),
        }
    }

    /// Renders the form as HTML table rows.
    fn as_table(&self) -> String {
        render::as_table(self)
    }

    /// Renders the form as HTML `<li>` elements.
    fn as_ul(&self) -> String {
        render::as_ul(self)
    }

    /// Renders the form as HTML `<p>` elements.
    fn as_p(&self) -> String {
        render::as_p(self)
    }

    /// Cross-field validation hook. Override to add form-level validation.
    ///
    /// Receives the data of the fields that passed field-level validation.
    /// The default implementation does nothing.
    async fn clean(&self, _cleaned_data: &HashMap<String, Value>) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Form-level validation callback used by [`BaseForm`] and [`DeclaredForm`].
pub type CleanFn = Arc<dyn Fn(&HashMap<String, Value>) -> Result<(), ValidationError> + Send + Sync>;

/// A general-purpose form implementation.
///
/// `BaseForm` holds a list of field definitions and manages binding,
/// validation, and cleaned data.
pub struct BaseForm {
    class_name: String,
    class_id: Option<Uuid>,
    field_defs: Vec<FormFieldDef>,
    options: FormOptions,
    media: Media,
    cleaner: Option<CleanFn>,
    errors: Option<ErrorDict>,
    cleaned_data: Option<HashMap<String, Value>>,
}

impl fmt::Debug for BaseForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseForm")
            .field("class_name", &self.class_name)
            .field("fields", &self.field_defs)
            .field("prefix", &self.options.prefix)
            .field("is_bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}

impl BaseForm {
    /// Creates a new unbound `BaseForm` with the given field definitions.
    pub fn new(fields: Vec<FormFieldDef>) -> Self {
        Self::from_options("BaseForm", fields, FormOptions::default())
    }

    /// Creates a form of class `class_name` from construction options.
    pub fn from_options(class_name: impl Into<String>, fields: Vec<FormFieldDef>, options: FormOptions) -> Self {
        Self {
            class_name: class_name.into(),
            class_id: None,
            field_defs: fields,
            options,
            media: Media::new(),
            cleaner: None,
            errors: None,
            cleaned_data: None,
        }
    }

    /// Sets initial values for fields.
    #[must_use]
    pub fn with_initial(mut self, initial: HashMap<String, Value>) -> Self {
        self.options.initial = initial;
        self
    }

    /// Sets the form prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = Some(prefix.into());
        self
    }

    /// Sets form-level media.
    #[must_use]
    pub fn with_media(mut self, media: Media) -> Self {
        self.media = media;
        self
    }

    /// Records the id of the class this form was built from.
    #[must_use]
    pub fn with_class_id(mut self, id: Uuid) -> Self {
        self.class_id = Some(id);
        self
    }

    /// Sets the form-level validation callback.
    #[must_use]
    pub fn with_cleaner(mut self, cleaner: CleanFn) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Returns the construction options.
    pub const fn options(&self) -> &FormOptions {
        &self.options
    }

    fn raw_input(&self, field: &FormFieldDef) -> RawInput {
        let widget = widgets::create_widget(field.widget, field.choices());
        let empty_data = FormData::new();
        let empty_files = FormFiles::new();
        widget.value_from_data(
            self.options.data.as_ref().unwrap_or(&empty_data),
            self.options.files.as_ref().unwrap_or(&empty_files),
            &self.add_prefix(&field.name),
        )
    }

    fn initial_for(&self, field: &FormFieldDef) -> Option<Value> {
        self.options
            .initial
            .get(&field.name)
            .or(field.initial.as_ref())
            .cloned()
    }

    fn display_value(&self, field: &FormFieldDef) -> Value {
        if !self.is_bound() || field.disabled {
            return self.initial_for(field).unwrap_or(Value::Null);
        }
        match self.raw_input(field) {
            RawInput::Missing => Value::Null,
            RawInput::Text(s) => Value::String(s),
            RawInput::List(items) => Value::List(items.into_iter().map(Value::String).collect()),
            RawInput::File(file) => Value::File(file),
        }
    }
}

#[async_trait]
impl Form for BaseForm {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn class_id(&self) -> Option<Uuid> {
        self.class_id
    }

    fn fields(&self) -> &[FormFieldDef] {
        &self.field_defs
    }

    fn add_field(&mut self, field: FormFieldDef) {
        self.field_defs.push(field);
        self.errors = None;
        self.cleaned_data = None;
    }

    fn initial(&self) -> &HashMap<String, Value> {
        &self.options.initial
    }

    fn prefix(&self) -> Option<&str> {
        self.options.prefix.as_deref()
    }

    fn bind(&mut self, data: FormData, files: FormFiles) {
        self.options.data = Some(data);
        self.options.files = Some(files);
        self.errors = None;
        self.cleaned_data = None;
    }

    fn is_bound(&self) -> bool {
        self.options.is_bound()
    }

    async fn full_clean(&mut self) {
        let mut errors = ErrorDict::new();
        if !self.is_bound() {
            self.errors = Some(errors);
            self.cleaned_data = None;
            return;
        }

        let raw_inputs: HashMap<String, RawInput> = self
            .field_defs
            .iter()
            .map(|field| (field.name.clone(), self.raw_input(field)))
            .collect();

        // Step 1: Field-level validation
        let mut cleaned = HashMap::new();
        validation::clean_fields(
            &self.field_defs,
            &raw_inputs,
            &self.options.initial,
            &mut cleaned,
            &mut errors,
            &self.options.error_class,
        );

        // Step 2: Form-level cross-field validation (async)
        if let Err(err) = self.clean(&cleaned).await {
            validation::add_form_error(&err, &mut cleaned, &mut errors, &self.options.error_class);
        }

        tracing::trace!(
            form = %self.class_name,
            prefix = ?self.options.prefix,
            errors = errors.len(),
            "form cleaned"
        );
        self.errors = Some(errors);
        self.cleaned_data = Some(cleaned);
    }

    async fn errors(&mut self) -> &ErrorDict {
        if self.errors.is_none() {
            self.full_clean().await;
        }
        self.errors.get_or_insert_with(ErrorDict::new)
    }

    fn cached_errors(&self) -> Option<&ErrorDict> {
        self.errors.as_ref()
    }

    fn cleaned_data(&self) -> Option<&HashMap<String, Value>> {
        self.cleaned_data.as_ref()
    }

    fn non_field_errors(&self) -> ErrorList {
        self.errors
            .as_ref()
            .and_then(|errors| errors.get(NON_FIELD_ERRORS))
            .cloned()
            .unwrap_or_else(|| ErrorList::with_error_class(&self.options.error_class))
    }

    fn changed_data(&self) -> Vec<String> {
        self.field_defs
            .iter()
            .filter(|field| {
                let initial = self.initial_for(field);
                field_has_changed(field, initial.as_ref(), &self.raw_input(field))
            })
            .map(|field| field.name.clone())
            .collect()
    }

    fn is_multipart(&self) -> bool {
        self.field_defs.iter().any(|field| {
            widgets::create_widget(field.widget, field.choices()).needs_multipart_form()
        })
    }

    fn media(&self) -> Media {
        self.field_defs.iter().fold(self.media.clone(), |media, field| {
            media + widgets::create_widget(field.widget, field.choices()).media()
        })
    }

    fn bound_fields(&self) -> Vec<BoundField> {
        self.field_defs
            .iter()
            .map(|field| {
                let errors = self
                    .errors
                    .as_ref()
                    .and_then(|errors| errors.get(&field.name))
                    .cloned()
                    .unwrap_or_else(|| ErrorList::with_error_class(&self.options.error_class));
                BoundField::new(field, self.add_prefix(&field.name), self.display_value(field), errors)
                    .with_auto_id(&self.options.auto_id)
                    .with_label_suffix(&self.options.label_suffix)
                    .with_required_attribute(self.options.use_required_attribute)
            })
            .collect()
    }

    async fn clean(&self, cleaned_data: &HashMap<String, Value>) -> Result<(), ValidationError> {
        match &self.cleaner {
            Some(cleaner) => cleaner(cleaned_data),
            None => Ok(()),
        }
    }
}

/// A constructor for forms of one kind.
///
/// Form sets hold form classes and instantiate them with per-form options.
pub trait FormClass: Send + Sync {
    /// The class name reported by instances.
    fn name(&self) -> &str;

    /// Identifies this class; distinct classes never share an id, even when
    /// their names match.
    fn id(&self) -> Uuid;

    /// Builds a form instance.
    fn create(&self, options: FormOptions) -> Box<dyn Form>;
}

impl fmt::Debug for dyn Form + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Form({})", self.class_name())
    }
}

impl fmt::Debug for dyn FormClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormClass({})", self.name())
    }
}

/// Field builder of a [`DeclaredForm`]. Receives the construction options,
/// including `defaults`.
pub type FieldsFn = Arc<dyn Fn(&FormOptions) -> Vec<FormFieldDef> + Send + Sync>;

/// A form class declared from a field builder.
///
/// # Examples
///
/// ```
/// use multiform_forms::fields::{FormFieldDef, FormFieldType};
/// use multiform_forms::form::{DeclaredForm, FormClass, FormOptions};
///
/// let contact = DeclaredForm::new("ContactForm", |_| {
///     vec![FormFieldDef::new("email", FormFieldType::Email)]
/// });
/// let form = contact.create(FormOptions::default());
/// assert_eq!(form.class_name(), "ContactForm");
/// assert!(!form.is_bound());
/// ```
///
/// Clones are the same class.
#[derive(Clone)]
pub struct DeclaredForm {
    id: Uuid,
    name: String,
    fields: FieldsFn,
    media: Media,
    cleaner: Option<CleanFn>,
}

impl fmt::Debug for DeclaredForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredForm")
            .field("name", &self.name)
            .field("media", &self.media)
            .finish_non_exhaustive()
    }
}

impl DeclaredForm {
    /// Declares a form class named `name` whose fields come from `fields`.
    pub fn new<F>(name: impl Into<String>, fields: F) -> Self
    where
        F: Fn(&FormOptions) -> Vec<FormFieldDef> + Send + Sync + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            fields: Arc::new(fields),
            media: Media::new(),
            cleaner: None,
        }
    }

    /// Sets form-level media.
    #[must_use]
    pub fn with_media(mut self, media: Media) -> Self {
        self.media = media;
        self
    }

    /// Sets the form-level validation callback.
    #[must_use]
    pub fn with_clean<F>(mut self, clean: F) -> Self
    where
        F: Fn(&HashMap<String, Value>) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.cleaner = Some(Arc::new(clean));
        self
    }
}

impl FormClass for DeclaredForm {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn create(&self, options: FormOptions) -> Box<dyn Form> {
        let fields = (self.fields)(&options);
        let mut form = BaseForm::from_options(self.name.clone(), fields, options)
            .with_media(self.media.clone())
            .with_class_id(self.id);
        if let Some(cleaner) = &self.cleaner {
            form = form.with_cleaner(Arc::clone(cleaner));
        }
        Box::new(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FormFieldType;
    use crate::form_data::UploadedFile;

    fn make_test_form() -> BaseForm {
        BaseForm::new(vec![
            FormFieldDef::new(
                "username",
                FormFieldType::Char {
                    min_length: Some(3),
                    max_length: Some(20),
                    strip: true,
                },
            ),
            FormFieldDef::new("email", FormFieldType::Email),
            FormFieldDef::new(
                "age",
                FormFieldType::Integer {
                    min_value: Some(0),
                    max_value: Some(150),
                },
            )
            .required(false),
        ])
    }

    #[tokio::test]
    async fn test_form_unbound() {
        let mut form = make_test_form();
        assert!(!form.is_bound());
        assert!(!form.is_valid().await);
        assert!(form.errors().await.is_empty());
        assert!(form.cleaned_data().is_none());
    }

    #[tokio::test]
    async fn test_form_bind_and_validate() {
        let mut form = make_test_form();
        form.bind(
            FormData::parse("username=alice&email=alice@example.com&age=30"),
            FormFiles::new(),
        );
        assert!(form.is_bound());
        assert!(form.is_valid().await);
        let cleaned = form.cleaned_data().unwrap();
        assert_eq!(cleaned.get("username"), Some(&Value::from("alice")));
        assert_eq!(cleaned.get("email"), Some(&Value::from("alice@example.com")));
        assert_eq!(cleaned.get("age"), Some(&Value::Int(30)));
    }

    #[tokio::test]
    async fn test_form_validation_errors() {
        let mut form = make_test_form();
        form.bind(FormData::parse("username=ab&email=not-email"), FormFiles::new());
        assert!(!form.is_valid().await);
        let errors = form.errors().await;
        assert!(errors.contains_key("username"));
        assert!(errors.contains_key("email"));
        assert!(!errors.contains_key("age"));
    }

    #[tokio::test]
    async fn test_form_with_prefix() {
        let mut form = make_test_form().with_prefix("myform");
        assert_eq!(form.prefix(), Some("myform"));
        assert_eq!(form.add_prefix("email"), "myform-email");
        form.bind(
            FormData::parse("myform-username=alice&myform-email=alice@example.com&myform-age=25"),
            FormFiles::new(),
        );
        assert!(form.is_valid().await);
    }

    #[tokio::test]
    async fn test_errors_are_cached_until_rebind() {
        let mut form = make_test_form();
        form.bind(FormData::new(), FormFiles::new());
        assert!(form.cached_errors().is_none());
        assert_eq!(form.errors().await.len(), 2);
        assert!(form.cached_errors().is_some());

        form.bind(
            FormData::parse("username=alice&email=alice@example.com"),
            FormFiles::new(),
        );
        assert!(form.cached_errors().is_none());
        assert!(form.is_valid().await);
    }

    #[tokio::test]
    async fn test_clean_hook_non_field_error() {
        let mut form = BaseForm::new(vec![
            FormFieldDef::new("password", FormFieldType::char()),
            FormFieldDef::new("confirm", FormFieldType::char()),
        ])
        .with_cleaner(Arc::new(|data: &HashMap<String, Value>| {
            if data.get("password") == data.get("confirm") {
                Ok(())
            } else {
                Err(ValidationError::new("Passwords do not match.", "mismatch"))
            }
        }));
        form.bind(FormData::parse("password=a&confirm=b"), FormFiles::new());
        assert!(!form.is_valid().await);
        assert_eq!(form.non_field_errors(), ["Passwords do not match."]);
    }

    #[tokio::test]
    async fn test_changed_data() {
        let mut initial = HashMap::new();
        initial.insert("username".to_string(), Value::from("alice"));
        let mut form = make_test_form().with_initial(initial);
        form.bind(
            FormData::parse("username=alice&email=a@example.com"),
            FormFiles::new(),
        );
        assert_eq!(form.changed_data(), vec!["email".to_string()]);
        assert!(form.has_changed());
    }

    #[test]
    fn test_unbound_bound_fields_show_initial() {
        let mut initial = HashMap::new();
        initial.insert("username".to_string(), Value::from("bob"));
        let form = make_test_form().with_initial(initial);
        let fields = form.bound_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].value, Value::from("bob"));
        assert_eq!(fields[1].value, Value::Null);
    }

    #[test]
    fn test_is_multipart_and_media() {
        let form = make_test_form();
        assert!(!form.is_multipart());
        assert!(form.media().is_empty());

        let form = BaseForm::new(vec![FormFieldDef::new("upload", FormFieldType::file())])
            .with_media(Media::new().with_js("upload.js"));
        assert!(form.is_multipart());
        assert_eq!(form.media().js(), ["upload.js".to_string()]);
    }

    #[tokio::test]
    async fn test_file_field_reads_files() {
        let mut form = BaseForm::new(vec![FormFieldDef::new("upload", FormFieldType::file())]);
        let files = FormFiles::new().with_file(
            "upload",
            UploadedFile::new("a.txt", "text/plain", b"hi".to_vec()),
        );
        form.bind(FormData::new(), files);
        assert!(form.is_valid().await);
        assert!(matches!(
            form.cleaned_data().and_then(|d| d.get("upload")),
            Some(Value::File(_))
        ));
    }

    #[test]
    fn test_declared_form_uses_defaults() {
        let class = DeclaredForm::new("Dynamic", |options: &FormOptions| {
            let mut fields = vec![FormFieldDef::new("name", FormFieldType::char())];
            if options.defaults.contains_key("with_age") {
                fields.push(FormFieldDef::new("age", FormFieldType::integer()));
            }
            fields
        });
        let plain = class.create(FormOptions::default());
        assert_eq!(plain.fields().len(), 1);

        let mut options = FormOptions::default();
        options.defaults.insert("with_age".to_string(), Value::Bool(true));
        let extended = class.create(options);
        assert_eq!(extended.fields().len(), 2);
        assert!(extended.is_instance_of(&class));
    }

    #[test]
    fn test_same_name_classes_are_distinct() {
        let first = DeclaredForm::new("Contact", |_| Vec::new());
        let second = DeclaredForm::new("Contact", |_| Vec::new());
        let form = first.create(FormOptions::default());
        assert!(form.is_instance_of(&first));
        assert!(form.is_instance_of(&first.clone()));
        assert!(!form.is_instance_of(&second));

        // Forms built outside a class compare by name.
        let loose = BaseForm::from_options("Contact", Vec::new(), FormOptions::default());
        assert!(loose.is_instance_of(&second));
    }

    #[test]
    fn test_add_field() {
        let mut form = make_test_form();
        form.add_field(FormFieldDef::new("extra", FormFieldType::char()));
        assert_eq!(form.fields().len(), 4);
        assert_eq!(form.fields()[3].name, "extra");
    }
}
