//! # multiform-core
//!
//! Core types, settings, logging, and error types for multiform.
//! This crate has no form-specific dependencies and provides the foundation
//! for the forms crate.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`utils`] - Utility types (`MultiValueDict`, text helpers)
//! - [`settings`] - Form and logging configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

pub use error::{MultiformError, MultiformResult, ValidationError};
pub use settings::{FormSettings, Settings};
