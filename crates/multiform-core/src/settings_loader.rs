//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON document (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `MULTIFORM_DEBUG` | `debug` |
//! | `MULTIFORM_LOG_LEVEL` | `log_level` |
//! | `MULTIFORM_AUTO_ID` | `forms.auto_id` |
//! | `MULTIFORM_LABEL_SUFFIX` | `forms.label_suffix` |
//! | `MULTIFORM_ERROR_CLASS` | `forms.error_class` |

use std::path::Path;

use crate::error::MultiformError;
use crate::settings::Settings;

/// Loads settings from a TOML string. Missing keys keep their defaults.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, MultiformError> {
    toml::from_str(toml_str)
        .map_err(|e| MultiformError::ConfigurationError(format!("Failed to parse TOML: {e}")))
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, MultiformError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        MultiformError::ConfigurationError(format!(
            "Failed to read settings file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a JSON string. Missing keys keep their defaults.
pub fn from_json_str(json_str: &str) -> Result<Settings, MultiformError> {
    serde_json::from_str(json_str)
        .map_err(|e| MultiformError::ConfigurationError(format!("Failed to parse JSON: {e}")))
}

/// Loads settings from a TOML file, then applies environment overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, MultiformError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Applies `MULTIFORM_*` environment variables to `settings`.
pub fn apply_env_overrides(settings: &mut Settings) -> Result<(), MultiformError> {
    apply_overrides_from(settings, |key| std::env::var(key).ok())
}

/// Applies overrides read through `lookup`, which maps a variable name to
/// its value.
pub fn apply_overrides_from<F>(settings: &mut Settings, lookup: F) -> Result<(), MultiformError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(debug) = lookup("MULTIFORM_DEBUG") {
        settings.debug = parse_bool(&debug).ok_or_else(|| {
            MultiformError::ConfigurationError(format!(
                "MULTIFORM_DEBUG must be a boolean, got '{debug}'"
            ))
        })?;
    }
    if let Some(level) = lookup("MULTIFORM_LOG_LEVEL") {
        settings.log_level = level;
    }
    if let Some(auto_id) = lookup("MULTIFORM_AUTO_ID") {
        settings.forms.auto_id = auto_id;
    }
    if let Some(suffix) = lookup("MULTIFORM_LABEL_SUFFIX") {
        settings.forms.label_suffix = suffix;
    }
    if let Some(class) = lookup("MULTIFORM_ERROR_CLASS") {
        settings.forms.error_class = class;
    }
    Ok(())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_from_toml_str_partial() {
        let settings = from_toml_str(
            r#"
            debug = true

            [forms]
            auto_id = "field-%s"
            "#,
        )
        .unwrap();
        assert!(settings.debug);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.forms.auto_id, "field-%s");
        assert_eq!(settings.forms.label_suffix, ":");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let err = from_toml_str("debug = [").unwrap_err();
        assert!(matches!(err, MultiformError::ConfigurationError(_)));
    }

    #[test]
    fn test_from_json_str() {
        let settings = from_json_str(r#"{"log_level": "debug", "forms": {"label_suffix": ""}}"#)
            .unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.forms.label_suffix, "");
        assert_eq!(settings.forms.error_class, "errorlist");
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = from_toml_file("/nonexistent/multiform.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = [
            ("MULTIFORM_DEBUG", "yes"),
            ("MULTIFORM_LOG_LEVEL", "trace"),
            ("MULTIFORM_ERROR_CLASS", "errors"),
        ]
        .into_iter()
        .collect();
        let mut settings = Settings::default();
        apply_overrides_from(&mut settings, |k| env.get(k).map(|v| (*v).to_string())).unwrap();
        assert!(settings.debug);
        assert_eq!(settings.log_level, "trace");
        assert_eq!(settings.forms.error_class, "errors");
        assert_eq!(settings.forms.auto_id, "id_%s");
    }

    #[test]
    fn test_apply_overrides_bad_bool() {
        let mut settings = Settings::default();
        let result = apply_overrides_from(&mut settings, |k| {
            (k == "MULTIFORM_DEBUG").then(|| "maybe".to_string())
        });
        assert!(result.is_err());
    }
}
