//! Contract models for settings conf
//!
//! Settings are a generic name → JSON value mapping. Well-known settings
//! additionally get a typed key so callers can read them without
//! hand-rolled deserialization.

use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Value of a single setting
pub type SettingValue = serde_json::Value;

/// Ordered name → value mapping used for overrides and settings modules
pub type SettingsMap = serde_json::Map<String, SettingValue>;

/// Name of the store's internal state handle. It can never be set or deleted.
pub const PROTECTED_FIELD: &str = "_wrapped";

/// Typed handle for a well-known setting
#[derive(Debug)]
pub struct SettingKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SettingKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for SettingKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SettingKey<T> {}

impl<T: DeserializeOwned> SettingKey<T> {
    /// Decode a raw value into the key's type
    pub fn decode(&self, value: SettingValue) -> Result<T, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Well-known setting names
pub mod keys {
    use super::SettingKey;

    pub const DEBUG: SettingKey<bool> = SettingKey::new("DEBUG");
    pub const MEDIA_URL: SettingKey<String> = SettingKey::new("MEDIA_URL");
    pub const STATIC_URL: SettingKey<Option<String>> = SettingKey::new("STATIC_URL");
    pub const TIME_ZONE: SettingKey<Option<String>> = SettingKey::new("TIME_ZONE");
    pub const SECRET_KEY: SettingKey<String> = SettingKey::new("SECRET_KEY");
    pub const INSTALLED_APPS: SettingKey<Vec<String>> = SettingKey::new("INSTALLED_APPS");
    pub const SETTINGS_MODULE: SettingKey<Option<String>> = SettingKey::new("SETTINGS_MODULE");
}

/// Identity of one open override frame
///
/// Ids are never reused within a store, so a frame that was closed can not
/// be mistaken for a later one opened at the same depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverrideId(u64);

impl OverrideId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What kind of mutation produced a change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Plain assignment
    Set,
    /// Plain deletion
    Deleted,
    /// Value applied by an override scope
    OverrideEnabled,
    /// Value restored when an override scope ended
    OverrideDisabled,
}

impl ChangeKind {
    /// True for the override transitions
    pub fn is_override(self) -> bool {
        matches!(self, Self::OverrideEnabled | Self::OverrideDisabled)
    }
}
