//! Settings API trait
//!
//! Implemented by the eager store (`Settings`) and the lazy global proxy
//! (`LazySettings`). Override helpers and the test hook only talk to this
//! trait, so they work the same against either.

use super::{
    error::SettingsError,
    model::{OverrideId, SettingKey, SettingValue, SettingsMap},
};
use serde::de::DeserializeOwned;

/// Settings API
pub trait SettingsApi: Send + Sync {
    // ===== Plain access =====

    /// Get a setting; `NotFound` if it was never set
    fn get(&self, name: &str) -> Result<SettingValue, SettingsError>;

    /// Set a setting, overwriting any prior value
    fn set(&self, name: &str, value: SettingValue) -> Result<(), SettingsError>;

    /// Delete a setting; `NotFound` if absent
    fn delete(&self, name: &str) -> Result<(), SettingsError>;

    /// Whether a setting is currently present
    fn contains(&self, name: &str) -> Result<bool, SettingsError> {
        match self.get(name) {
            Ok(_) => Ok(true),
            Err(SettingsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Get a setting or fall back to `default` when absent
    fn get_or(&self, name: &str, default: SettingValue) -> Result<SettingValue, SettingsError> {
        match self.get(name) {
            Err(SettingsError::NotFound { .. }) => Ok(default),
            other => other,
        }
    }

    /// Get a well-known setting decoded into its type
    fn get_typed<T: DeserializeOwned>(&self, key: SettingKey<T>) -> Result<T, SettingsError>
    where
        Self: Sized,
    {
        let value = self.get(key.name())?;
        key.decode(value).map_err(|e| SettingsError::Validation {
            message: format!("setting {} has unexpected type: {}", key.name(), e),
        })
    }

    // ===== Overrides =====

    /// Push an override frame and apply `overrides`
    fn begin_override(&self, overrides: &SettingsMap) -> Result<(), SettingsError>;

    /// Pop the most recent override frame and restore prior state
    fn end_override(&self) -> Result<(), SettingsError>;

    /// Number of open override frames
    fn override_depth(&self) -> Result<usize, SettingsError>;

    /// Id of the most recent open override frame
    fn current_override(&self) -> Result<Option<OverrideId>, SettingsError>;

    /// Whether the frame `id` is still on the override stack
    fn is_override_open(&self, id: OverrideId) -> Result<bool, SettingsError>;
}

impl<T: SettingsApi + ?Sized> SettingsApi for &T {
    fn get(&self, name: &str) -> Result<SettingValue, SettingsError> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        (**self).set(name, value)
    }

    fn delete(&self, name: &str) -> Result<(), SettingsError> {
        (**self).delete(name)
    }

    fn begin_override(&self, overrides: &SettingsMap) -> Result<(), SettingsError> {
        (**self).begin_override(overrides)
    }

    fn end_override(&self) -> Result<(), SettingsError> {
        (**self).end_override()
    }

    fn override_depth(&self) -> Result<usize, SettingsError> {
        (**self).override_depth()
    }

    fn current_override(&self) -> Result<Option<OverrideId>, SettingsError> {
        (**self).current_override()
    }

    fn is_override_open(&self, id: OverrideId) -> Result<bool, SettingsError> {
        (**self).is_override_open(id)
    }
}
