//! Configuration for the settings conf module

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the deprecation policy
pub const DEPRECATION_ENV: &str = "SETTINGS_CONF_DEPRECATION";
/// Environment variable overriding the settings root directory
pub const ROOT_ENV: &str = "SETTINGS_CONF_ROOT";

/// How deprecated setting values are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeprecationPolicy {
    /// Reject the value
    Error,
    /// Store the value and log a warning
    #[default]
    Warn,
    /// Store the value silently
    Ignore,
}

impl std::str::FromStr for DeprecationPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "default" => Ok(Self::Warn),
            "ignore" => Ok(Self::Ignore),
            other => anyhow::bail!("unknown deprecation policy: {}", other),
        }
    }
}

/// Settings conf configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Settings module used when neither an explicit path nor the
    /// environment variable names one
    #[serde(default = "default_settings_module")]
    pub default_settings_module: String,

    /// Directory the YAML loader resolves settings modules under
    #[serde(default)]
    pub settings_root: Option<PathBuf>,

    /// Treatment of deprecated setting values
    #[serde(default)]
    pub deprecation: DeprecationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_settings_module: default_settings_module(),
            settings_root: None,
            deprecation: DeprecationPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        // An empty document means "all defaults"
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(mut self) -> anyhow::Result<Self> {
        if let Ok(policy) = std::env::var(DEPRECATION_ENV) {
            self.deprecation = policy
                .parse()
                .with_context(|| format!("invalid {}", DEPRECATION_ENV))?;
        }
        if let Some(root) = std::env::var_os(ROOT_ENV) {
            self.settings_root = Some(PathBuf::from(root));
        }
        Ok(self)
    }
}

fn default_settings_module() -> String {
    crate::domain::global_settings::MODULE_NAME.to_string()
}
