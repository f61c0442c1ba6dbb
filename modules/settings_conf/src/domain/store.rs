//! Settings store with override frames and change notifications

use super::events::{ListenerId, SettingChanged, SettingChangedListener, SettingChangedSignal};
use super::validation;
use crate::config::DeprecationPolicy;
use crate::contract::{
    ChangeKind, OverrideId, SettingValue, SettingsApi, SettingsError, SettingsMap,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Captured prior state of the keys touched by one override scope
///
/// `None` marks a key that was unset before the scope began.
#[derive(Debug)]
struct OverrideFrame {
    id: OverrideId,
    previous: Vec<(String, Option<SettingValue>)>,
}

#[derive(Debug, Default)]
struct State {
    values: SettingsMap,
    frames: Vec<OverrideFrame>,
    /// Next frame id; only ever grows
    next_id: u64,
}

impl State {
    fn is_open(&self, id: OverrideId) -> bool {
        self.frames.iter().any(|frame| frame.id == id)
    }
}

struct Inner {
    state: RwLock<State>,
    signal: Arc<SettingChangedSignal>,
    deprecation: DeprecationPolicy,
    /// Setting name -> JSON Schema its values must satisfy
    schemas: HashMap<String, Value>,
    settings_module: Option<String>,
}

/// Configured settings
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct Settings {
    inner: Arc<Inner>,
}

/// Builder for `Settings`
#[derive(Default)]
pub struct SettingsBuilder {
    values: SettingsMap,
    signal: Option<Arc<SettingChangedSignal>>,
    deprecation: DeprecationPolicy,
    schemas: HashMap<String, Value>,
    settings_module: Option<String>,
}

impl SettingsBuilder {
    /// Layer `values` over what has been added so far
    pub fn values(mut self, values: SettingsMap) -> Self {
        self.values.extend(values);
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: SettingValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Share an existing signal instead of creating a fresh one
    pub fn signal(mut self, signal: Arc<SettingChangedSignal>) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn deprecation(mut self, policy: DeprecationPolicy) -> Self {
        self.deprecation = policy;
        self
    }

    /// Require values of `name` to satisfy a JSON Schema
    pub fn schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    pub fn settings_module(mut self, module: impl Into<String>) -> Self {
        self.settings_module = Some(module.into());
        self
    }

    /// Validate the initial values and build the store
    ///
    /// No notifications are emitted for initial values.
    pub fn build(self) -> Result<Settings, SettingsError> {
        let mut values = self.values;
        if let Some(module) = &self.settings_module {
            values.insert("SETTINGS_MODULE".to_string(), Value::String(module.clone()));
        }

        let inner = Inner {
            state: RwLock::new(State::default()),
            signal: self.signal.unwrap_or_default(),
            deprecation: self.deprecation,
            schemas: self.schemas,
            settings_module: self.settings_module,
        };
        for (name, value) in &values {
            inner.validate(name, value)?;
        }
        inner.state.write().values = values;

        Ok(Settings {
            inner: Arc::new(inner),
        })
    }
}

impl Inner {
    fn validate(&self, name: &str, value: &SettingValue) -> Result<(), SettingsError> {
        validation::validate_setting_name(name)?;
        validation::check_deprecations(self.deprecation, name, value)?;
        if let Some(schema) = self.schemas.get(name) {
            validation::validate_against_schema(name, value, schema)?;
        }
        Ok(())
    }

    /// Send one notification per entry; every entry is delivered and the
    /// first listener error is returned
    fn notify_all(
        &self,
        changes: Vec<(String, Option<SettingValue>)>,
        kind: ChangeKind,
    ) -> Result<(), SettingsError> {
        let mut first_error = None;
        for (setting, value) in changes {
            let event = SettingChanged::new(setting, value, kind);
            if let Err(e) = self.signal.send(&event) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Store holding exactly `values`, with default policy
    pub fn from_map(values: SettingsMap) -> Result<Self, SettingsError> {
        Self::builder().values(values).build()
    }

    /// Settings module these settings were loaded from, if any
    pub fn settings_module(&self) -> Option<&str> {
        self.inner.settings_module.as_deref()
    }

    pub fn deprecation_policy(&self) -> DeprecationPolicy {
        self.inner.deprecation
    }

    pub fn signal(&self) -> &Arc<SettingChangedSignal> {
        &self.inner.signal
    }

    /// Connect a change listener, optionally filtered to one setting
    pub fn connect(
        &self,
        setting: Option<&str>,
        listener: Arc<dyn SettingChangedListener>,
    ) -> ListenerId {
        self.inner.signal.connect(setting, listener)
    }

    /// Copy of every current value
    pub fn snapshot(&self) -> SettingsMap {
        self.inner.state.read().values.clone()
    }
}

impl SettingsApi for Settings {
    fn get(&self, name: &str) -> Result<SettingValue, SettingsError> {
        self.inner
            .state
            .read()
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| SettingsError::not_found(name))
    }

    fn set(&self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        self.inner.validate(name, &value)?;

        self.inner
            .state
            .write()
            .values
            .insert(name.to_string(), value.clone());
        tracing::debug!(setting = name, "setting set");

        self.inner
            .signal
            .send(&SettingChanged::new(name, Some(value), ChangeKind::Set))
    }

    fn delete(&self, name: &str) -> Result<(), SettingsError> {
        validation::validate_setting_name(name)?;

        if self.inner.state.write().values.remove(name).is_none() {
            return Err(SettingsError::not_found(name));
        }
        tracing::debug!(setting = name, "setting deleted");

        self.inner
            .signal
            .send(&SettingChanged::new(name, None, ChangeKind::Deleted))
    }

    fn begin_override(&self, overrides: &SettingsMap) -> Result<(), SettingsError> {
        // Nothing is applied unless every value is acceptable
        for (name, value) in overrides {
            self.inner.validate(name, value)?;
        }

        let (id, depth) = {
            let mut state = self.inner.state.write();
            let previous = overrides
                .iter()
                .map(|(name, value)| {
                    let prior = state.values.insert(name.clone(), value.clone());
                    (name.clone(), prior)
                })
                .collect();
            state.next_id += 1;
            let id = OverrideId::new(state.next_id);
            state.frames.push(OverrideFrame { id, previous });
            (id, state.frames.len())
        };
        tracing::debug!(
            depth,
            frame = id.get(),
            keys = overrides.len(),
            "settings override enabled"
        );

        let changes = overrides
            .iter()
            .map(|(name, value)| (name.clone(), Some(value.clone())))
            .collect();
        if let Err(e) = self.inner.notify_all(changes, ChangeKind::OverrideEnabled) {
            // The scope never started for the caller, so undo it here
            while self.is_override_open(id)? {
                if let Err(rollback) = self.end_override() {
                    tracing::error!(error = %rollback, "listener failed while rolling back override");
                    if rollback == SettingsError::NoActiveOverride {
                        break;
                    }
                }
            }
            return Err(e);
        }

        Ok(())
    }

    fn end_override(&self) -> Result<(), SettingsError> {
        let (restored, depth) = {
            let mut state = self.inner.state.write();
            let frame = state.frames.pop().ok_or(SettingsError::NoActiveOverride)?;

            for (name, prior) in &frame.previous {
                match prior {
                    Some(value) => {
                        state.values.insert(name.clone(), value.clone());
                    }
                    None => {
                        state.values.remove(name);
                    }
                }
            }
            (frame.previous, state.frames.len())
        };
        tracing::debug!(depth, keys = restored.len(), "settings override disabled");

        self.inner.notify_all(restored, ChangeKind::OverrideDisabled)
    }

    fn override_depth(&self) -> Result<usize, SettingsError> {
        Ok(self.inner.state.read().frames.len())
    }

    fn current_override(&self) -> Result<Option<OverrideId>, SettingsError> {
        Ok(self.inner.state.read().frames.last().map(|frame| frame.id))
    }

    fn is_override_open(&self, id: OverrideId) -> Result<bool, SettingsError> {
        Ok(self.inner.state.read().is_open(id))
    }
}
