//! Contract layer - public settings API
//!
//! Transport-agnostic models, the error type and the `SettingsApi` trait.

pub mod client;
pub mod error;
pub mod model;

pub use client::SettingsApi;
pub use error::SettingsError;
pub use model::{keys, ChangeKind, OverrideId, SettingKey, SettingValue, SettingsMap, PROTECTED_FIELD};
