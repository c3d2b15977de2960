//! Utility types and functions for multiform.
//!
//! This module provides:
//! - [`MultiValueDict`]: A dictionary that can hold multiple values per key.
//! - [`text`]: String helpers for labels and HTML output.

mod multi_value_dict;
pub mod text;

pub use multi_value_dict::MultiValueDict;
