//! Validation for setting names and values

use crate::config::DeprecationPolicy;
use crate::contract::{SettingValue, SettingsError, PROTECTED_FIELD};
use jsonschema::Validator;
use serde_json::Value;

/// Settings that must end with a slash when non-empty
pub const TRAILING_SLASH_SETTINGS: &[&str] = &["MEDIA_URL", "STATIC_URL"];

/// Validate a setting name
///
/// Rejects the empty name and the store's protected internal field.
pub fn validate_setting_name(name: &str) -> Result<(), SettingsError> {
    if name.is_empty() {
        return Err(SettingsError::Validation {
            message: "setting name cannot be empty".to_string(),
        });
    }

    if name == PROTECTED_FIELD {
        return Err(SettingsError::Protected {
            name: name.to_string(),
        });
    }

    Ok(())
}

/// Deprecation message for a URL setting without a trailing slash
///
/// Empty strings and non-string values pass. Any number of trailing
/// slashes is accepted and the value is never normalized.
pub fn trailing_slash_deprecation(name: &str, value: &SettingValue) -> Option<String> {
    if !TRAILING_SLASH_SETTINGS.contains(&name) {
        return None;
    }

    match value {
        Value::String(url) if !url.is_empty() && !url.ends_with('/') => {
            Some(format!("If set, {} must end with a slash", name))
        }
        _ => None,
    }
}

/// Apply the deprecation policy to a value about to be stored
pub fn check_deprecations(
    policy: DeprecationPolicy,
    name: &str,
    value: &SettingValue,
) -> Result<(), SettingsError> {
    let Some(message) = trailing_slash_deprecation(name, value) else {
        return Ok(());
    };

    match policy {
        DeprecationPolicy::Error => Err(SettingsError::Deprecation {
            setting: name.to_string(),
            message,
        }),
        DeprecationPolicy::Warn => {
            tracing::warn!(setting = name, value = %value, "DeprecationWarning: {}", message);
            Ok(())
        }
        DeprecationPolicy::Ignore => Ok(()),
    }
}

/// Validate a setting value against a JSON Schema
pub fn validate_against_schema(
    setting: &str,
    data: &Value,
    schema: &Value,
) -> Result<(), SettingsError> {
    // Compile the schema
    let validator = Validator::new(schema).map_err(|e| SettingsError::Validation {
        message: format!("Invalid JSON Schema for {}: {}", setting, e),
    })?;

    // Validate the data
    if let Err(error) = validator.validate(data) {
        return Err(SettingsError::SchemaValidation {
            setting: setting.to_string(),
            errors: vec![error.to_string()],
        });
    }

    Ok(())
}
