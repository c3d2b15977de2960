//! Settings for multiform.
//!
//! [`Settings`] holds the logging configuration and the [`FormSettings`]
//! applied to form sets built with `with_settings`. Every key has a default,
//! so partial configuration files are accepted.

use serde::{Deserialize, Serialize};

/// Rendering and naming defaults for forms and form sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Template for HTML `id` attributes. `%s` is replaced with the field's
    /// html name; an empty string disables ids.
    pub auto_id: String,
    /// Suffix appended to labels.
    pub label_suffix: String,
    /// CSS class of rendered error lists.
    pub error_class: String,
    /// Whether standalone forms render the `required` attribute.
    pub use_required_attribute: bool,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            auto_id: "id_%s".to_string(),
            label_suffix: ":".to_string(),
            error_class: "errorlist".to_string(),
            use_required_attribute: true,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Debug mode switches logging to a human-readable format.
    pub debug: bool,
    /// Log filter directive (e.g. "info", "multiform_forms=debug").
    pub log_level: String,
    /// Form rendering defaults.
    pub forms: FormSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            forms: FormSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.forms.auto_id, "id_%s");
        assert_eq!(settings.forms.label_suffix, ":");
        assert_eq!(settings.forms.error_class, "errorlist");
        assert!(settings.forms.use_required_attribute);
    }

    #[test]
    fn test_settings_roundtrip_json() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
