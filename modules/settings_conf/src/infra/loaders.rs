//! Settings loader implementations

use crate::contract::SettingsMap;
use crate::domain::loader::SettingsLoader;
use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Check a dotted module name: non-empty identifier components only
pub fn validate_module_name(module: &str) -> Result<()> {
    if module.is_empty() {
        anyhow::bail!("settings module name cannot be empty");
    }

    for part in module.split('.') {
        let mut chars = part.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            anyhow::bail!("invalid settings module name '{}'", module);
        }
    }

    Ok(())
}

/// Loads `a.b.c` from `<root>/a/b/c.yaml` (or `.yml`)
#[derive(Debug, Clone)]
pub struct YamlFileLoader {
    root: PathBuf,
}

impl YamlFileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, module: &str) -> Vec<PathBuf> {
        let mut base = self.root.clone();
        base.extend(module.split('.'));
        EXTENSIONS
            .iter()
            .map(|ext| base.with_extension(ext))
            .collect()
    }
}

impl SettingsLoader for YamlFileLoader {
    fn load(&self, module: &str) -> Result<Option<SettingsMap>> {
        validate_module_name(module)?;

        let Some(path) = self.candidates(module).into_iter().find(|p| p.is_file()) else {
            return Ok(None);
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Some(SettingsMap::new()));
        }
        let values: Option<SettingsMap> = serde_yaml::from_str(&raw)
            .with_context(|| format!("settings module {} is not a mapping", path.display()))?;

        tracing::debug!(module, path = %path.display(), "loaded settings module");
        Ok(Some(values.unwrap_or_default()))
    }
}

/// In-memory settings modules
#[derive(Clone, Default)]
pub struct InMemoryLoader {
    modules: Arc<RwLock<HashMap<String, SettingsMap>>>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a module
    pub fn insert(&self, module: impl Into<String>, values: SettingsMap) {
        self.modules.write().insert(module.into(), values);
    }

    pub fn with_module(self, module: impl Into<String>, values: SettingsMap) -> Self {
        self.insert(module, values);
        self
    }
}

impl SettingsLoader for InMemoryLoader {
    fn load(&self, module: &str) -> Result<Option<SettingsMap>> {
        Ok(self.modules.read().get(module).cloned())
    }
}
