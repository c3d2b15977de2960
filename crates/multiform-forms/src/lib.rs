//! # multiform-forms
//!
//! Forms library for multiform. Provides the [`Form`](form::Form) trait,
//! field types with validation, widgets for HTML rendering, error lists,
//! media, and the heterogeneous [`MultiFormSet`](multiformset::MultiFormSet).

pub mod bound_field;
pub mod error_list;
pub mod fields;
pub mod form;
pub mod form_data;
pub mod media;
pub mod multiformset;
pub mod render;
pub mod validation;
pub mod value;
pub mod widgets;

pub use error_list::{ErrorDict, ErrorList};
pub use fields::{FormFieldDef, FormFieldType};
pub use form::{BaseForm, DeclaredForm, Form, FormClass, FormOptions};
pub use form_data::{FormData, FormFiles, UploadedFile};
pub use media::Media;
pub use multiformset::{FormSetHooks, MultiFormSet, MultiFormSetBuilder, NoHooks};
pub use value::Value;
