//! Scoped settings overrides
//!
//! `OverrideSettings` describes a set of temporary values. All of its
//! forms go through `begin_override` / `end_override`:
//! - `enable` / `disable`: explicit enter and exit
//! - `apply`: returns a guard that exits on drop, panics included
//! - `run`: wraps a single call
//! - `decorate`: wraps a callable so every invocation runs overridden
//!
//! Test suites get the same through `crate::testing::TestSuite`.

use crate::contract::{OverrideId, SettingValue, SettingsApi, SettingsError, SettingsMap};

/// A set of temporary setting values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideSettings {
    options: SettingsMap,
}

impl OverrideSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(options: SettingsMap) -> Self {
        Self { options }
    }

    /// Add one value to override
    pub fn set(mut self, name: impl Into<String>, value: SettingValue) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    pub fn options(&self) -> &SettingsMap {
        &self.options
    }

    /// Enter the override without a guard; pair with `disable`
    pub fn enable<S: SettingsApi + ?Sized>(&self, settings: &S) -> Result<(), SettingsError> {
        settings.begin_override(&self.options)
    }

    /// Exit the most recent override
    pub fn disable<S: SettingsApi + ?Sized>(&self, settings: &S) -> Result<(), SettingsError> {
        settings.end_override()
    }

    /// Enter the override; it is exited when the guard is dropped
    pub fn apply<'a, S: SettingsApi + ?Sized>(
        &self,
        settings: &'a S,
    ) -> Result<OverrideGuard<'a, S>, SettingsError> {
        settings.begin_override(&self.options)?;
        let id = settings
            .current_override()?
            .ok_or(SettingsError::NoActiveOverride)?;
        Ok(OverrideGuard {
            settings,
            id,
            active: true,
        })
    }

    /// Run `body` with the override applied
    ///
    /// The override is exited even if `body` panics. Listener errors on
    /// exit are returned after the body's value is computed.
    pub fn run<S, T>(&self, settings: &S, body: impl FnOnce() -> T) -> Result<T, SettingsError>
    where
        S: SettingsApi + ?Sized,
    {
        let guard = self.apply(settings)?;
        let value = body();
        guard.finish()?;
        Ok(value)
    }

    /// Wrap `f` so that every call runs with the override applied
    pub fn decorate<'a, S, A, T, F>(
        &self,
        settings: &'a S,
        f: F,
    ) -> impl Fn(A) -> Result<T, SettingsError> + 'a
    where
        S: SettingsApi + ?Sized,
        A: 'a,
        T: 'a,
        F: Fn(A) -> T + 'a,
    {
        let overrides = self.clone();
        move |arg| overrides.run(settings, || f(arg))
    }
}

/// Open override scope; restores prior state on drop
#[must_use = "the override is exited as soon as the guard is dropped"]
pub struct OverrideGuard<'a, S: SettingsApi + ?Sized> {
    settings: &'a S,
    /// Frame this scope pushed
    id: OverrideId,
    active: bool,
}

impl<'a, S: SettingsApi + ?Sized> OverrideGuard<'a, S> {
    /// Exit the scope now and report listener errors
    pub fn finish(mut self) -> Result<(), SettingsError> {
        self.close()
    }

    fn close(&mut self) -> Result<(), SettingsError> {
        self.active = false;

        if !self.settings.is_override_open(self.id)? {
            tracing::warn!(frame = self.id.get(), "settings override already exited");
            return Ok(());
        }
        if self.settings.current_override()? != Some(self.id) {
            tracing::warn!(
                frame = self.id.get(),
                "closing nested settings overrides left open"
            );
        }

        // Nested frames first, keeping restoration strictly LIFO
        let mut first_error = None;
        while self.settings.is_override_open(self.id)? {
            match self.settings.end_override() {
                Ok(()) => {}
                Err(SettingsError::NoActiveOverride) => break,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<'a, S: SettingsApi + ?Sized> Drop for OverrideGuard<'a, S> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.close() {
                tracing::error!(error = %e, "error while exiting settings override");
            }
        }
    }
}
