//! Compiled-in default settings
//!
//! Every configured store starts from these values; a settings module
//! only has to name what it changes.

use crate::contract::SettingsMap;
use serde_json::json;

/// Name the defaults are registered under
pub const MODULE_NAME: &str = "global_settings";

pub fn defaults() -> SettingsMap {
    let mut map = SettingsMap::new();
    map.insert("DEBUG".to_string(), json!(false));
    map.insert("TEMPLATE_DEBUG".to_string(), json!(false));
    map.insert("ADMINS".to_string(), json!([]));
    map.insert("INTERNAL_IPS".to_string(), json!([]));
    map.insert("TIME_ZONE".to_string(), json!("America/Chicago"));
    map.insert("USE_TZ".to_string(), json!(false));
    map.insert("LANGUAGE_CODE".to_string(), json!("en-us"));
    map.insert("USE_I18N".to_string(), json!(true));
    map.insert("INSTALLED_APPS".to_string(), json!([]));
    map.insert("SECRET_KEY".to_string(), json!(""));
    map.insert("MEDIA_ROOT".to_string(), json!(""));
    map.insert("MEDIA_URL".to_string(), json!(""));
    map.insert("STATIC_ROOT".to_string(), json!(""));
    map.insert("STATIC_URL".to_string(), json!(null));
    map.insert("ROOT_URLCONF".to_string(), json!(null));
    map.insert("DEFAULT_CHARSET".to_string(), json!("utf-8"));
    map.insert("APPEND_SLASH".to_string(), json!(true));
    map.insert("MIDDLEWARE_CLASSES".to_string(), json!([]));
    map
}
