//! # multiform
//!
//! Heterogeneous form sets: several different forms prefixed, validated
//! and rendered as one collection.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `multiform` for everything, or on the individual
//! crates for finer-grained control.

/// Core types: settings, logging setup, and error types.
pub use multiform_core as core;

/// Forms, fields, widgets, and `MultiFormSet`.
pub use multiform_forms as forms;

/// Commonly used items, including the `async_trait` attribute needed to
/// implement `Form` and `FormSetHooks`.
pub mod prelude {
    pub use async_trait::async_trait;
    pub use multiform_core::{MultiformError, MultiformResult, Settings, ValidationError};
    pub use multiform_forms::{
        DeclaredForm, ErrorList, Form, FormClass, FormData, FormFieldDef, FormFieldType, FormFiles,
        FormOptions, FormSetHooks, Media, MultiFormSet, UploadedFile, Value,
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::prelude::*;

    struct RequireAny;

    #[async_trait]
    impl FormSetHooks for RequireAny {
        async fn clean(&self, forms: &[Box<dyn Form>]) -> Result<(), ValidationError> {
            if forms.iter().any(|form| form.has_changed()) {
                Ok(())
            } else {
                Err(ValidationError::new("Fill in at least one form.", "empty"))
            }
        }
    }

    fn classes() -> Vec<Arc<dyn FormClass>> {
        vec![
            Arc::new(DeclaredForm::new("Name", |_| {
                vec![FormFieldDef::new("name", FormFieldType::char()).required(false)]
            })),
            Arc::new(DeclaredForm::new("Age", |_| {
                vec![FormFieldDef::new("age", FormFieldType::integer()).required(false)]
            })),
        ]
    }

    #[tokio::test]
    async fn test_prelude_covers_hooks() {
        let mut empty = MultiFormSet::builder(classes())
            .with_data(FormData::new())
            .with_hooks(RequireAny)
            .build();
        assert!(!empty.is_valid().await);
        assert_eq!(*empty.non_form_errors().await, ["Fill in at least one form."]);

        let mut filled = MultiFormSet::builder(classes())
            .with_data(FormData::parse("form-1-age=40"))
            .with_hooks(RequireAny)
            .build();
        assert!(filled.is_valid().await);
        let cleaned = filled.cleaned_data().await.unwrap();
        assert_eq!(cleaned[1].get("age"), Some(&Value::Int(40)));
    }

    #[test]
    fn test_settings_reach_form_sets() {
        let settings = crate::core::settings_loader::from_toml_str(
            "[forms]\nlabel_suffix = \"\"\nauto_id = \"\"\n",
        )
        .unwrap();
        let set = MultiFormSet::builder(classes())
            .with_settings(&settings.forms)
            .build();
        assert!(set.as_ul().starts_with("<li><label>Name</label> <input name=\"form-0-name\""));
    }
}
