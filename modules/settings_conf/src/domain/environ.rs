//! Settings module resolution
//!
//! Precedence: explicit path argument, then the `DJANGO_SETTINGS_MODULE`
//! environment variable, then the compiled-in default. For resolution an
//! empty value counts as unset. `setup_environ` never replaces a variable
//! that is present, even an empty one; it only fills in a missing one.

/// Environment variable naming the settings module
pub const SETTINGS_MODULE_VAR: &str = "DJANGO_SETTINGS_MODULE";

/// Resolve against the current process environment
pub fn resolve_settings_module(explicit: Option<&str>, default: &str) -> String {
    resolve_from(
        explicit,
        std::env::var(SETTINGS_MODULE_VAR).ok().as_deref(),
        default,
    )
}

/// Resolve from explicit values
pub fn resolve_from(explicit: Option<&str>, env_value: Option<&str>, default: &str) -> String {
    explicit
        .filter(|s| !s.is_empty())
        .or_else(|| env_value.filter(|s| !s.is_empty()))
        .unwrap_or(default)
        .to_string()
}

/// Resolve the settings module and publish it in the environment
///
/// An explicit path always overwrites the variable. Otherwise an existing
/// value is kept as is, empty included, and the default fills in only when
/// the variable is missing. Returns the value the variable now holds.
pub fn setup_environ(explicit: Option<&str>, default: &str) -> String {
    let explicit = explicit.filter(|s| !s.is_empty());
    let module = match (explicit, std::env::var(SETTINGS_MODULE_VAR)) {
        (Some(path), _) => path.to_string(),
        (None, Ok(existing)) => existing,
        (None, Err(_)) => default.to_string(),
    };
    if std::env::var(SETTINGS_MODULE_VAR).ok().as_deref() != Some(module.as_str()) {
        std::env::set_var(SETTINGS_MODULE_VAR, &module);
    }
    tracing::info!(settings_module = %module, "settings environment set up");
    module
}
