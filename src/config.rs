use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::permission::{PermissionDescriptor, PermissionState, CLIPBOARD_READ, CLIPBOARD_WRITE};
use crate::toast;

/// Startup configuration, read from an optional JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Descriptors shown in the permission panel, in display order
    pub permissions: Vec<PermissionDescriptor>,
    /// Grant state each permission name starts in
    pub initial_states: HashMap<String, PermissionState>,
    pub toast_timeout_ms: u64,
    /// Clipboard polling period for change notifications; 0 disables them
    pub watch_interval_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            permissions: vec![
                PermissionDescriptor::new(CLIPBOARD_READ),
                PermissionDescriptor::new(CLIPBOARD_WRITE),
            ],
            initial_states: HashMap::from([
                (CLIPBOARD_READ.to_string(), PermissionState::Prompt),
                (CLIPBOARD_WRITE.to_string(), PermissionState::Granted),
            ]),
            toast_timeout_ms: toast::DEFAULT_TIMEOUT.as_millis() as u64,
            watch_interval_ms: 500,
        }
    }
}

impl DemoConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.permissions.is_empty() {
            return Err(ConfigError::Invalid("permissions must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for descriptor in &self.permissions {
            if !seen.insert(descriptor) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate permission descriptor: {}",
                    descriptor
                )));
            }
        }
        if self.toast_timeout_ms == 0 {
            return Err(ConfigError::Invalid("toast_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn toast_timeout(&self) -> Duration {
        Duration::from_millis(self.toast_timeout_ms)
    }

    pub fn watch_interval(&self) -> Option<Duration> {
        (self.watch_interval_ms > 0).then(|| Duration::from_millis(self.watch_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = DemoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.toast_timeout(), Duration::from_secs(3));
        assert_eq!(config.permissions.len(), 2);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"permissions": [{{"name": "clipboard-read", "allow_without_gesture": false}}], "watch_interval_ms": 0}}"#
        )
        .unwrap();

        let config = DemoConfig::load(file.path()).unwrap();
        assert_eq!(
            config.permissions,
            vec![PermissionDescriptor::with_gesture_flag(CLIPBOARD_READ, false)]
        );
        assert_eq!(config.watch_interval(), None);
        assert_eq!(config.toast_timeout_ms, 3000);
    }

    #[test]
    fn test_rejects_duplicates() {
        let config = DemoConfig {
            permissions: vec![
                PermissionDescriptor::new(CLIPBOARD_READ),
                PermissionDescriptor::new(CLIPBOARD_READ),
            ],
            ..DemoConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_empty_permissions() {
        let config = DemoConfig {
            permissions: Vec::new(),
            ..DemoConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            DemoConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
