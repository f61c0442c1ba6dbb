//! Change notifications for settings
//!
//! Every mutation of the store emits a `SettingChanged` event:
//! - `Set` / `Deleted` for plain assignment and deletion
//! - `OverrideEnabled` per key when an override frame is pushed
//! - `OverrideDisabled` per key when it is popped, carrying the restored value
//!
//! Delivery is synchronous and inline with the mutation. Listeners are
//! filtered by setting name.

use crate::contract::model::{ChangeKind, SettingValue};
use crate::contract::SettingsError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Event data for a setting change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingChanged {
    /// Setting name
    pub setting: String,
    /// Value after the change (`None` when the setting is now absent)
    pub value: Option<SettingValue>,
    /// Mutation that produced the event
    pub kind: ChangeKind,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
}

impl SettingChanged {
    pub fn new(setting: impl Into<String>, value: Option<SettingValue>, kind: ChangeKind) -> Self {
        Self {
            setting: setting.into(),
            value,
            kind,
            timestamp: Utc::now(),
        }
    }

    /// True when an override scope is being entered
    pub fn enter(&self) -> bool {
        self.kind == ChangeKind::OverrideEnabled
    }
}

/// Receiver of change notifications
///
/// An error returned here propagates to the caller of the mutating
/// operation as `SettingsError::Listener`.
pub trait SettingChangedListener: Send + Sync {
    fn on_setting_changed(&self, event: &SettingChanged) -> anyhow::Result<()>;
}

impl<F> SettingChangedListener for F
where
    F: Fn(&SettingChanged) -> anyhow::Result<()> + Send + Sync,
{
    fn on_setting_changed(&self, event: &SettingChanged) -> anyhow::Result<()> {
        self(event)
    }
}

/// Handle returned by `connect`, used to disconnect a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Receiver {
    id: ListenerId,
    /// Only events for this setting are delivered; `None` receives all
    setting: Option<String>,
    listener: Arc<dyn SettingChangedListener>,
}

/// Signal dispatching `SettingChanged` events to connected listeners
#[derive(Default)]
pub struct SettingChangedSignal {
    receivers: RwLock<Vec<Receiver>>,
    next_id: AtomicU64,
}

impl SettingChangedSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a listener, optionally filtered to a single setting name
    pub fn connect(
        &self,
        setting: Option<&str>,
        listener: Arc<dyn SettingChangedListener>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.receivers.write().push(Receiver {
            id,
            setting: setting.map(str::to_string),
            listener,
        });
        id
    }

    /// Disconnect a listener; returns false if it was not connected
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let mut receivers = self.receivers.write();
        let before = receivers.len();
        receivers.retain(|r| r.id != id);
        receivers.len() != before
    }

    pub fn receiver_count(&self) -> usize {
        self.receivers.read().len()
    }

    /// Deliver an event to every matching listener in connection order
    ///
    /// All matching listeners run; the first failure is returned.
    pub fn send(&self, event: &SettingChanged) -> Result<(), SettingsError> {
        // Snapshot so listeners may connect/disconnect re-entrantly
        let targets: Vec<Arc<dyn SettingChangedListener>> = self
            .receivers
            .read()
            .iter()
            .filter(|r| r.setting.as_deref().map_or(true, |s| s == event.setting))
            .map(|r| r.listener.clone())
            .collect();

        let mut first_error = None;
        for listener in targets {
            if let Err(e) = listener.on_setting_changed(event) {
                tracing::error!(setting = %event.setting, kind = ?event.kind, error = %e, "setting_changed listener failed");
                if first_error.is_none() {
                    first_error = Some(SettingsError::Listener {
                        setting: event.setting.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
