//! Loader configuration.
//!
//! One process-wide [`Configuration`] is kept behind a lock and read through
//! [`configure`] / [`get_configure`]. Loaders snapshot it when they are created.

use std::sync::RwLock;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::ConfigError;

/// Key holding the list of document suffixes to probe.
pub const SUFFIXES_KEY: &str = "JSONSuffixes";

/// Keys that used to exist, with what replaced them.
pub const OBSOLETE_KEYS: [(&str, &str); 1] = [(
    "AllDictionariesAsClasses",
    "classes are detected automatically; use __classes__ to declare them explicitly",
)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Suffixes tried in order for every search root.
    #[serde(rename = "JSONSuffixes")]
    pub json_suffixes: Vec<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            json_suffixes: vec![".json".to_string()],
        }
    }
}

impl Configuration {
    pub fn get(&self, key: &str) -> Result<Json, ConfigError> {
        check_key(key)?;
        let document = serde_json::to_value(self).map_err(|e| invalid(key, e))?;
        document
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::Unknown(key.to_string()))
    }

    pub fn set(&mut self, key: &str, value: Json) -> Result<(), ConfigError> {
        check_key(key)?;
        let mut document = serde_json::to_value(&*self).map_err(|e| invalid(key, e))?;
        if let Some(map) = document.as_object_mut() {
            map.insert(key.to_string(), value);
        }
        let updated: Configuration = serde_json::from_value(document).map_err(|e| invalid(key, e))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.json_suffixes.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: SUFFIXES_KEY.to_string(),
                message: "at least one suffix is required".to_string(),
            });
        }
        if let Some(bad) = self.json_suffixes.iter().find(|s| s.is_empty() || s.contains('/')) {
            return Err(ConfigError::InvalidValue {
                key: SUFFIXES_KEY.to_string(),
                message: format!("'{}' is not a file suffix", bad),
            });
        }
        Ok(())
    }
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if let Some((_, reason)) = OBSOLETE_KEYS.iter().find(|(k, _)| *k == key) {
        return Err(ConfigError::Obsolete {
            key: key.to_string(),
            reason: reason.to_string(),
        });
    }
    if key != SUFFIXES_KEY {
        return Err(ConfigError::Unknown(key.to_string()));
    }
    Ok(())
}

fn invalid(key: &str, err: serde_json::Error) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    }
}

lazy_static! {
    static ref CONFIGURATION: RwLock<Configuration> = RwLock::new(Configuration::default());
}

/// Set a process-wide configuration item.
pub fn configure(key: &str, value: Json) -> Result<(), ConfigError> {
    let mut config = CONFIGURATION.write().unwrap_or_else(|e| e.into_inner());
    config.set(key, value)
}

/// Read a process-wide configuration item.
pub fn get_configure(key: &str) -> Result<Json, ConfigError> {
    CONFIGURATION
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(key)
}

/// Snapshot of the process-wide configuration.
pub fn current_configuration() -> Configuration {
    CONFIGURATION
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Restore the defaults.
pub fn reset_configuration() {
    *CONFIGURATION.write().unwrap_or_else(|e| e.into_inner()) = Configuration::default();
}
