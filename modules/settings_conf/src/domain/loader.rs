//! Loader trait for settings modules
//!
//! Implementations are in infra/loaders.rs

use crate::contract::SettingsMap;
use anyhow::Result;

/// Turns a settings module name (e.g. `mysite.settings`) into values
pub trait SettingsLoader: Send + Sync {
    /// Load a module; `Ok(None)` if this loader does not know it
    fn load(&self, module: &str) -> Result<Option<SettingsMap>>;
}
