//! Heterogeneous form sets.
//!
//! A [`MultiFormSet`] holds one instance of each of several distinct form
//! classes and behaves like a single collection of forms: it prefixes each
//! instance as `{prefix}-{index}`, validates them together, aggregates
//! their errors and cleaned data by index, and renders them side by side.
//!
//! Instances are constructed eagerly by [`MultiFormSetBuilder::build`].
//! Validation runs lazily on the first call to
//! [`errors`](MultiFormSet::errors), [`non_form_errors`](MultiFormSet::non_form_errors)
//! or [`is_valid`](MultiFormSet::is_valid) and is cached afterwards.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use async_trait::async_trait;
use multiform_core::logging::formset_span;
use multiform_core::{FormSettings, MultiformError, MultiformResult, ValidationError};
use tracing::Instrument;

use crate::error_list::{ErrorDict, ErrorList};
use crate::form::{Form, FormClass, FormOptions};
use crate::form_data::{FormData, FormFiles};
use crate::media::Media;
use crate::validation;
use crate::value::Value;

/// The prefix used when none is supplied.
const DEFAULT_PREFIX: &str = "form";

/// Customisation points of a form set.
///
/// Both hooks default to doing nothing.
#[async_trait]
pub trait FormSetHooks: Send + Sync {
    /// Called on every form right after construction. May add fields.
    fn add_fields(&self, _form: &mut dyn Form, _index: usize) {}

    /// Set-level validation, run after every form has been cleaned.
    ///
    /// Returned messages become the set's non-form errors. Field-targeted
    /// messages are recorded as `field: message`; an error without any
    /// message still records one.
    async fn clean(&self, _forms: &[Box<dyn Form>]) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl FormSetHooks for NoHooks {}

/// A fixed, ordered collection of forms of distinct classes.
pub struct MultiFormSet {
    form_classes: Vec<Arc<dyn FormClass>>,
    forms: Vec<Box<dyn Form>>,
    prefix: String,
    auto_id: String,
    error_class: String,
    data: FormData,
    files: FormFiles,
    is_bound: bool,
    initial: Option<Vec<HashMap<String, Value>>>,
    defaults: HashMap<String, Value>,
    hooks: Arc<dyn FormSetHooks>,
    errors: Option<Vec<ErrorDict>>,
    non_form_errors: Option<ErrorList>,
}

impl fmt::Debug for MultiFormSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiFormSet")
            .field("form_classes", &self.form_classes)
            .field("prefix", &self.prefix)
            .field("is_bound", &self.is_bound)
            .finish_non_exhaustive()
    }
}

impl MultiFormSet {
    /// Starts building a set over `form_classes`, in order.
    pub fn builder(form_classes: Vec<Arc<dyn FormClass>>) -> MultiFormSetBuilder {
        MultiFormSetBuilder::new(form_classes)
    }

    /// Builds an unbound set with default options.
    pub fn new(form_classes: Vec<Arc<dyn FormClass>>) -> Self {
        Self::builder(form_classes).build()
    }

    /// The prefix used when none is supplied: `"form"`.
    pub const fn get_default_prefix() -> &'static str {
        DEFAULT_PREFIX
    }

    /// The set prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The id template shared by every form.
    pub fn auto_id(&self) -> &str {
        &self.auto_id
    }

    /// CSS class of rendered error lists.
    pub fn error_class(&self) -> &str {
        &self.error_class
    }

    /// Submitted data; empty when unbound.
    pub const fn data(&self) -> &FormData {
        &self.data
    }

    /// Submitted files; empty when unbound.
    pub const fn files(&self) -> &FormFiles {
        &self.files
    }

    /// Per-form initial values, if supplied.
    pub fn initial(&self) -> Option<&[HashMap<String, Value>]> {
        self.initial.as_deref()
    }

    /// Extra values passed to every form class.
    pub const fn defaults(&self) -> &HashMap<String, Value> {
        &self.defaults
    }

    /// Returns `true` if data or files were supplied.
    pub const fn is_bound(&self) -> bool {
        self.is_bound
    }

    /// Returns the prefix of the form at `index`.
    pub fn add_prefix(&self, index: usize) -> String {
        format!("{}-{index}", self.prefix)
    }

    /// Runs the `add_fields` hook on `form`.
    pub fn add_fields(&self, form: &mut dyn Form, index: usize) {
        self.hooks.add_fields(form, index);
    }

    /// The form classes, in order.
    pub fn form_classes(&self) -> &[Arc<dyn FormClass>] {
        &self.form_classes
    }

    /// The form instances, in class order.
    pub fn forms(&self) -> &[Box<dyn Form>] {
        &self.forms
    }

    /// Iterates over the form instances.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Form> + '_ {
        self.forms.iter().map(AsRef::as_ref)
    }

    /// Returns the form at `index`.
    pub fn get(&self, index: usize) -> Option<&dyn Form> {
        self.forms.get(index).map(AsRef::as_ref)
    }

    /// Returns the form at `index`, or an error naming the bounds.
    pub fn form(&self, index: usize) -> MultiformResult<&dyn Form> {
        self.get(index).ok_or(MultiformError::IndexOutOfRange {
            index,
            len: self.forms.len(),
        })
    }

    /// Number of forms.
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Returns `true` if the set has no forms.
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Per-form errors, in form order. Validates on first access.
    ///
    /// Empty for an unbound set.
    pub async fn errors(&mut self) -> &[ErrorDict] {
        if self.errors.is_none() {
            self.full_clean().await;
        }
        self.errors.get_or_insert_with(Vec::new)
    }

    /// Errors raised by the set-level `clean` hook. Validates on first
    /// access.
    pub async fn non_form_errors(&mut self) -> &ErrorList {
        if self.non_form_errors.is_none() {
            self.full_clean().await;
        }
        let error_class = &self.error_class;
        self.non_form_errors
            .get_or_insert_with(|| ErrorList::with_error_class(error_class.as_str()))
    }

    /// Number of non-form errors plus the number of errored fields across
    /// all forms.
    pub async fn total_error_count(&mut self) -> usize {
        let non_form = self.non_form_errors().await.len();
        let per_form: usize = self.errors().await.iter().map(ErrorDict::len).sum();
        non_form + per_form
    }

    /// Returns `true` if the set is bound, every form is valid and the
    /// set-level `clean` raised nothing.
    pub async fn is_valid(&mut self) -> bool {
        if !self.is_bound {
            return false;
        }
        self.errors().await;
        let mut forms_valid = true;
        for form in &mut self.forms {
            forms_valid &= form.is_valid().await;
        }
        forms_valid && self.non_form_errors().await.is_empty()
    }

    /// Validates every form and the set, caching the results.
    pub async fn full_clean(&mut self) {
        let span = formset_span(&self.prefix, self.forms.len());
        async {
            self.errors = Some(Vec::new());
            self.non_form_errors = Some(ErrorList::with_error_class(self.error_class.as_str()));
            if !self.is_bound {
                tracing::debug!("form set is unbound, skipping validation");
                return;
            }

            let mut errors = Vec::with_capacity(self.forms.len());
            for form in &mut self.forms {
                errors.push(validation::validate(form.as_mut()).await.err().unwrap_or_default());
            }

            let mut non_form_errors = ErrorList::with_error_class(self.error_class.as_str());
            if let Err(err) = self.clean().await {
                for (message, code) in validation::flatten_error(&err) {
                    non_form_errors.push_with_code(message, code);
                }
            }

            tracing::debug!(
                invalid_forms = errors.iter().filter(|e| !e.is_empty()).count(),
                non_form_errors = non_form_errors.len(),
                "form set cleaned"
            );
            self.errors = Some(errors);
            self.non_form_errors = Some(non_form_errors);
        }
        .instrument(span)
        .await;
    }

    /// Runs the set-level validation hook.
    pub async fn clean(&self) -> Result<(), ValidationError> {
        self.hooks.clean(&self.forms).await
    }

    /// Per-form cleaned data, in form order.
    ///
    /// # Errors
    ///
    /// Returns [`MultiformError::CleanedDataUnavailable`] if the set is
    /// unbound or invalid.
    pub async fn cleaned_data(&mut self) -> MultiformResult<Vec<&HashMap<String, Value>>> {
        if !self.is_valid().await {
            return Err(MultiformError::CleanedDataUnavailable(format!(
                "form set '{}' is not valid",
                self.prefix
            )));
        }
        self.forms
            .iter()
            .enumerate()
            .map(|(index, form)| {
                form.cleaned_data().ok_or_else(|| {
                    MultiformError::CleanedDataUnavailable(format!("form {index} was not cleaned"))
                })
            })
            .collect()
    }

    /// Per-form errors as JSON: an array with one object per form.
    pub async fn errors_as_json(&mut self) -> serde_json::Value {
        serde_json::Value::Array(self.errors().await.iter().map(ErrorDict::as_json).collect())
    }

    /// Returns `true` if any form's data differs from its initial values.
    pub fn has_changed(&self) -> bool {
        self.forms.iter().any(|form| form.has_changed())
    }

    /// Returns `true` if any form needs `multipart/form-data`.
    pub fn is_multipart(&self) -> bool {
        self.forms.iter().any(|form| form.is_multipart())
    }

    /// The merged media of every form.
    pub fn media(&self) -> Media {
        self.forms
            .iter()
            .fold(Media::new(), |media, form| media + form.media())
    }

    /// Renders every form as table rows, separated by a space.
    pub fn as_table(&self) -> String {
        self.render_with(|form| form.as_table())
    }

    /// Renders every form as paragraphs, separated by a space.
    pub fn as_p(&self) -> String {
        self.render_with(|form| form.as_p())
    }

    /// Renders every form as list items, separated by a space.
    pub fn as_ul(&self) -> String {
        self.render_with(|form| form.as_ul())
    }

    fn render_with(&self, render: impl Fn(&dyn Form) -> String) -> String {
        self.iter().map(render).collect::<Vec<_>>().join(" ")
    }
}

impl Index<usize> for MultiFormSet {
    type Output = dyn Form;

    fn index(&self, index: usize) -> &Self::Output {
        self.forms[index].as_ref()
    }
}

impl<'a> IntoIterator for &'a MultiFormSet {
    type Item = &'a Box<dyn Form>;
    type IntoIter = std::slice::Iter<'a, Box<dyn Form>>;

    fn into_iter(self) -> Self::IntoIter {
        self.forms.iter()
    }
}

impl fmt::Display for MultiFormSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_table())
    }
}

/// Builder for [`MultiFormSet`].
pub struct MultiFormSetBuilder {
    form_classes: Vec<Arc<dyn FormClass>>,
    data: Option<FormData>,
    files: Option<FormFiles>,
    auto_id: String,
    prefix: Option<String>,
    initial: Option<Vec<HashMap<String, Value>>>,
    error_class: String,
    label_suffix: String,
    defaults: HashMap<String, Value>,
    hooks: Arc<dyn FormSetHooks>,
}

impl MultiFormSetBuilder {
    /// Creates a builder with default options.
    pub fn new(form_classes: Vec<Arc<dyn FormClass>>) -> Self {
        let settings = FormSettings::default();
        Self {
            form_classes,
            data: None,
            files: None,
            auto_id: settings.auto_id,
            prefix: None,
            initial: None,
            error_class: settings.error_class,
            label_suffix: settings.label_suffix,
            defaults: HashMap::new(),
            hooks: Arc::new(NoHooks),
        }
    }

    /// Binds submitted data. Empty data still binds.
    #[must_use]
    pub fn with_data(mut self, data: FormData) -> Self {
        self.data = Some(data);
        self
    }

    /// Binds submitted files.
    #[must_use]
    pub fn with_files(mut self, files: FormFiles) -> Self {
        self.files = Some(files);
        self
    }

    /// Sets the id template.
    #[must_use]
    pub fn with_auto_id(mut self, auto_id: impl Into<String>) -> Self {
        self.auto_id = auto_id.into();
        self
    }

    /// Sets the set prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets per-form initial values, by form index.
    #[must_use]
    pub fn with_initial(mut self, initial: Vec<HashMap<String, Value>>) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Sets the CSS class of rendered error lists.
    #[must_use]
    pub fn with_error_class(mut self, error_class: impl Into<String>) -> Self {
        self.error_class = error_class.into();
        self
    }

    /// Sets the label suffix.
    #[must_use]
    pub fn with_label_suffix(mut self, label_suffix: impl Into<String>) -> Self {
        self.label_suffix = label_suffix.into();
        self
    }

    /// Sets extra values passed to every form class.
    #[must_use]
    pub fn with_defaults(mut self, defaults: HashMap<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Applies configured rendering options.
    #[must_use]
    pub fn with_settings(mut self, settings: &FormSettings) -> Self {
        self.auto_id.clone_from(&settings.auto_id);
        self.label_suffix.clone_from(&settings.label_suffix);
        self.error_class.clone_from(&settings.error_class);
        self
    }

    /// Installs customisation hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl FormSetHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Constructs every form and returns the set.
    ///
    /// Forms are built with the `required` attribute disabled.
    pub fn build(self) -> MultiFormSet {
        let prefix = self.prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        let is_bound = self.data.is_some() || self.files.is_some();
        let data = self.data.unwrap_or_default();
        let files = self.files.unwrap_or_default();
        let _span = formset_span(&prefix, self.form_classes.len()).entered();

        let forms: Vec<Box<dyn Form>> = self
            .form_classes
            .iter()
            .enumerate()
            .map(|(index, class)| {
                let options = FormOptions {
                    data: is_bound.then(|| data.clone()),
                    files: is_bound.then(|| files.clone()),
                    auto_id: self.auto_id.clone(),
                    prefix: Some(format!("{prefix}-{index}")),
                    initial: self
                        .initial
                        .as_ref()
                        .and_then(|initial| initial.get(index))
                        .cloned()
                        .unwrap_or_default(),
                    error_class: self.error_class.clone(),
                    label_suffix: self.label_suffix.clone(),
                    use_required_attribute: false,
                    defaults: self.defaults.clone(),
                };
                let mut form = class.create(options);
                self.hooks.add_fields(form.as_mut(), index);
                tracing::trace!(index, class = class.name(), "form constructed");
                form
            })
            .collect();

        tracing::debug!(forms = forms.len(), is_bound, "form set built");

        MultiFormSet {
            form_classes: self.form_classes,
            forms,
            prefix,
            auto_id: self.auto_id,
            error_class: self.error_class,
            data,
            files,
            is_bound,
            initial: self.initial,
            defaults: self.defaults,
            hooks: self.hooks,
            errors: None,
            non_form_errors: None,
        }
    }
}
