//! Common test utilities

#![allow(dead_code)]

use parking_lot::Mutex;
use settings_conf::{ChangeKind, SettingChanged, SettingChangedListener, Settings, SettingsMap};
use std::sync::Arc;

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}

/// Build a mapping from literal pairs
pub fn map(pairs: &[(&str, serde_json::Value)]) -> SettingsMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Fresh store holding the global defaults
pub fn fresh_settings() -> Settings {
    Settings::builder()
        .values(settings_conf::domain::global_settings::defaults())
        .build()
        .unwrap()
}

/// Listener recording every event it receives
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<SettingChanged>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener(&self) -> Arc<dyn SettingChangedListener> {
        let events = self.events.clone();
        Arc::new(move |event: &SettingChanged| -> anyhow::Result<()> {
            events.lock().push(event.clone());
            Ok(())
        })
    }

    pub fn events(&self) -> Vec<SettingChanged> {
        self.events.lock().clone()
    }

    /// Last value seen, like a module-level `testvalue` updated by a callback
    pub fn last_value(&self) -> Option<serde_json::Value> {
        self.events.lock().last().and_then(|e| e.value.clone())
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Listener that fails on every event of `kind` and ignores the rest
pub fn failing_on(kind: ChangeKind) -> Arc<dyn SettingChangedListener> {
    Arc::new(move |event: &SettingChanged| -> anyhow::Result<()> {
        if event.kind == kind {
            anyhow::bail!("listener exploded on {:?}", kind);
        }
        Ok(())
    })
}
