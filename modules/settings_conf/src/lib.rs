//! Settings Conf
//!
//! Lazily configured framework settings with scoped overrides and change
//! notifications. Settings are a name → JSON value store loaded from a
//! settings module named by `DJANGO_SETTINGS_MODULE`; tests override values
//! temporarily and every override is undone in strict LIFO order.

// Public exports
pub mod contract;
pub use contract::{
    client::SettingsApi, error::SettingsError, keys, ChangeKind, OverrideId, SettingKey,
    SettingValue, SettingsMap,
};

pub mod config;
pub use config::{Config, DeprecationPolicy};

pub mod domain;
pub use domain::{
    settings, LazySettings, OverrideGuard, OverrideSettings, SettingChanged,
    SettingChangedListener, Settings,
};

pub mod infra;
pub mod testing;
pub mod wsgi;
pub use wsgi::{application, Application};
