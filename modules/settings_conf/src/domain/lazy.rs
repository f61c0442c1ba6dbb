//! Lazily configured settings proxy
//!
//! `LazySettings` resolves and loads the settings module on first access
//! (or takes manual values through `configure`). Listeners may connect
//! before that happens; they are shared with the store once it exists.

use super::environ::resolve_settings_module;
use super::events::{ListenerId, SettingChangedListener, SettingChangedSignal};
use super::global_settings;
use super::loader::SettingsLoader;
use super::store::Settings;
use crate::config::Config;
use crate::contract::{
    OverrideId, SettingValue, SettingsApi, SettingsError, SettingsMap, PROTECTED_FIELD,
};
use crate::infra::YamlFileLoader;
use once_cell::sync::{Lazy, OnceCell};
use std::sync::Arc;

static GLOBAL: Lazy<LazySettings> = Lazy::new(|| {
    let config = match Config::default().with_env_overrides() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid settings conf environment, using defaults");
            Config::default()
        }
    };
    LazySettings::from_config(config)
});

/// Process-wide settings, configured on first access
pub fn settings() -> &'static LazySettings {
    &GLOBAL
}

pub struct LazySettings {
    wrapped: OnceCell<Settings>,
    config: Config,
    loader: Arc<dyn SettingsLoader>,
    signal: Arc<SettingChangedSignal>,
    explicit_module: Option<String>,
}

impl LazySettings {
    pub fn new(config: Config, loader: Arc<dyn SettingsLoader>) -> Self {
        Self {
            wrapped: OnceCell::new(),
            config,
            loader,
            signal: Arc::new(SettingChangedSignal::new()),
            explicit_module: None,
        }
    }

    /// Proxy loading modules from YAML files under `settings_root`
    /// (current directory when unset)
    pub fn from_config(config: Config) -> Self {
        let root = config.settings_root.clone().unwrap_or_else(|| ".".into());
        Self::new(config, Arc::new(YamlFileLoader::new(root)))
    }

    /// Settings module path taking precedence over the environment
    pub fn with_settings_module(mut self, module: impl Into<String>) -> Self {
        self.explicit_module = Some(module.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the store has been created yet
    pub fn configured(&self) -> bool {
        self.wrapped.get().is_some()
    }

    /// Connect a change listener; works before the store exists
    pub fn connect(
        &self,
        setting: Option<&str>,
        listener: Arc<dyn SettingChangedListener>,
    ) -> ListenerId {
        self.signal.connect(setting, listener)
    }

    pub fn signal(&self) -> &Arc<SettingChangedSignal> {
        &self.signal
    }

    /// Configure manually instead of loading a settings module
    ///
    /// `defaults` replaces the compiled-in global defaults when given.
    pub fn configure(
        &self,
        defaults: Option<SettingsMap>,
        options: SettingsMap,
    ) -> Result<&Settings, SettingsError> {
        if self.configured() {
            return Err(SettingsError::AlreadyConfigured);
        }

        let settings = Settings::builder()
            .values(defaults.unwrap_or_else(global_settings::defaults))
            .values(options)
            .signal(self.signal.clone())
            .deprecation(self.config.deprecation)
            .build()?;

        self.wrapped
            .set(settings)
            .map_err(|_| SettingsError::AlreadyConfigured)?;
        tracing::info!("settings configured manually");
        self.settings()
    }

    /// The underlying store, loading it on first access
    pub fn settings(&self) -> Result<&Settings, SettingsError> {
        self.wrapped.get_or_try_init(|| self.setup())
    }

    fn setup(&self) -> Result<Settings, SettingsError> {
        let module = resolve_settings_module(
            self.explicit_module.as_deref(),
            &self.config.default_settings_module,
        );

        let mut builder = Settings::builder()
            .values(global_settings::defaults())
            .signal(self.signal.clone())
            .deprecation(self.config.deprecation)
            .settings_module(module.clone());

        if module != global_settings::MODULE_NAME {
            let values = self
                .loader
                .load(&module)
                .map_err(|e| {
                    SettingsError::improperly_configured(format!(
                        "Could not import settings '{}': {:#}",
                        module, e
                    ))
                })?
                .ok_or_else(|| {
                    SettingsError::improperly_configured(format!(
                        "Could not import settings '{}': no such settings module",
                        module
                    ))
                })?;
            builder = builder.values(importable(values));
        }

        let settings = builder.build()?;
        tracing::info!(settings_module = %module, "settings loaded");
        Ok(settings)
    }
}

/// Only UPPERCASE names are imported from a settings module
fn importable(values: SettingsMap) -> SettingsMap {
    values
        .into_iter()
        .filter(|(name, _)| {
            let keep = *name == name.to_uppercase();
            if !keep {
                tracing::debug!(setting = %name, "skipping non-uppercase name in settings module");
            }
            keep
        })
        .collect()
}

impl SettingsApi for LazySettings {
    fn get(&self, name: &str) -> Result<SettingValue, SettingsError> {
        self.settings()?.get(name)
    }

    fn set(&self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        if name == PROTECTED_FIELD {
            return Err(SettingsError::Protected {
                name: name.to_string(),
            });
        }
        self.settings()?.set(name, value)
    }

    fn delete(&self, name: &str) -> Result<(), SettingsError> {
        if name == PROTECTED_FIELD {
            return Err(SettingsError::Protected {
                name: name.to_string(),
            });
        }
        self.settings()?.delete(name)
    }

    fn begin_override(&self, overrides: &SettingsMap) -> Result<(), SettingsError> {
        self.settings()?.begin_override(overrides)
    }

    fn end_override(&self) -> Result<(), SettingsError> {
        self.settings()?.end_override()
    }

    fn override_depth(&self) -> Result<usize, SettingsError> {
        self.settings()?.override_depth()
    }

    fn current_override(&self) -> Result<Option<OverrideId>, SettingsError> {
        self.settings()?.current_override()
    }

    fn is_override_open(&self, id: OverrideId) -> Result<bool, SettingsError> {
        self.settings()?.is_override_open(id)
    }
}
