//! Runner settings loaded from `sfall-bridge.toml`
//!
//! ```toml
//! ini_base_path = "mods"
//! stack_size = 1024
//! log_level = "debug"
//! ```

use crate::error::BridgeError;
use crate::program::STACK_SIZE;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Settings file looked up in the working directory by the runner
pub const DEFAULT_SETTINGS_FILE: &str = "sfall-bridge.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeSettings {
    /// Directory searched first for `.ini` files named by scripts
    #[serde(default)]
    pub ini_base_path: Option<String>,
    /// Capacity of the evaluation stack
    #[serde(default = "default_stack_size")]
    pub stack_size: usize,
    /// Default log filter when `RUST_LOG` is not set
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_stack_size() -> usize {
    STACK_SIZE
}

impl Default for BridgeSettings {
    fn default() -> Self {
        BridgeSettings {
            ini_base_path: None,
            stack_size: STACK_SIZE,
            log_level: None,
        }
    }
}

impl BridgeSettings {
    pub fn from_toml(text: &str) -> Result<Self, BridgeError> {
        let settings: BridgeSettings = toml::from_str(text)?;
        if settings.stack_size == 0 {
            return Err(BridgeError::Settings(
                "stack_size must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let text = fs::read_to_string(path)?;
        BridgeSettings::from_toml(&text)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, BridgeError> {
        if path.exists() {
            BridgeSettings::load(path)
        } else {
            Ok(BridgeSettings::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_file() {
        let settings = BridgeSettings::from_toml("").unwrap();
        assert_eq!(settings, BridgeSettings::default());
        assert_eq!(settings.stack_size, 1024);
    }

    #[test]
    fn test_all_fields() {
        let settings = BridgeSettings::from_toml(
            "ini_base_path = \"mods\"\nstack_size = 64\nlog_level = \"debug\"\n",
        )
        .unwrap();
        assert_eq!(settings.ini_base_path.as_deref(), Some("mods"));
        assert_eq!(settings.stack_size, 64);
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_rejects_bad_settings() {
        assert!(matches!(
            BridgeSettings::from_toml("stack_size = 0"),
            Err(BridgeError::Settings(_))
        ));
        assert!(BridgeSettings::from_toml("unknown_key = 1").is_err());
        assert!(BridgeSettings::from_toml("stack_size = \"big\"").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = BridgeSettings::load_or_default(&dir.path().join("none.toml")).unwrap();
        assert_eq!(settings, BridgeSettings::default());
    }
}
