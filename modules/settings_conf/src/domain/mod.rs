//! Domain layer - settings store, overrides and notifications

pub mod environ;
pub mod events;
pub mod global_settings;
pub mod lazy;
pub mod loader;
pub mod overrides;
pub mod store;
pub mod validation;

pub use events::{ListenerId, SettingChanged, SettingChangedListener, SettingChangedSignal};
pub use lazy::{settings, LazySettings};
pub use loader::SettingsLoader;
pub use overrides::{OverrideGuard, OverrideSettings};
pub use store::{Settings, SettingsBuilder};
