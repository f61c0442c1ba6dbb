//! Contract error types for settings conf
//!
//! These errors are surfaced to every caller of the settings API.

/// Settings errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// Setting was never set (or was deleted)
    #[error("setting not found: {name}")]
    NotFound {
        /// Setting name
        name: String,
    },

    /// Attempt to touch the store's internal state handle
    #[error("can't modify protected field: {name}")]
    Protected {
        /// Protected field name
        name: String,
    },

    /// Value triggered a deprecation while deprecations are fatal
    #[error("deprecated value for {setting}: {message}")]
    Deprecation {
        /// Setting name
        setting: String,
        /// Deprecation message
        message: String,
    },

    /// Value rejected by a validation rule
    #[error("Validation error: {message}")]
    Validation {
        /// Validation error message
        message: String,
    },

    /// JSON Schema validation failed
    #[error("Schema validation failed for {setting}: {}", .errors.join(", "))]
    SchemaValidation {
        /// Setting name
        setting: String,
        /// Validation errors
        errors: Vec<String>,
    },

    /// `end_override` called with no open override frame
    #[error("no active settings override")]
    NoActiveOverride,

    /// A change listener failed
    #[error("listener failed for {setting}: {message}")]
    Listener {
        /// Setting the notification was about
        setting: String,
        /// Listener error message
        message: String,
    },

    /// Settings could not be loaded
    #[error("improperly configured: {message}")]
    ImproperlyConfigured {
        /// Error details
        message: String,
    },

    /// `configure` called on already configured settings
    #[error("Settings already configured.")]
    AlreadyConfigured,
}

impl SettingsError {
    pub(crate) fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn improperly_configured(message: impl Into<String>) -> Self {
        Self::ImproperlyConfigured {
            message: message.into(),
        }
    }
}
