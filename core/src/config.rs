use std::fs;
use std::path::Path;
use std::time::Duration;

use ron::ser::{to_string_pretty, PrettyConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{targets, Error, StorageAction};

pub const DEFAULT_CONFIG_PATH: &str = "qbctl.ron";
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

/// Settings for the panel itself. The backend's own configuration lives on the
/// server and is never written here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub api_base: String,
    pub poll_interval_ms: u64,
    pub notification_ttl_ms: u64,
    pub request_timeout_ms: Option<u64>,
    pub log_level: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval_ms: 2000,
            notification_ttl_ms: 5000,
            request_timeout_ms: None,
            log_level: "info".to_string(),
        }
    }
}

impl PanelConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn from_ron(contents: &str) -> Result<Self, Error> {
        ron::de::from_str(contents).map_err(|error| Error::Ron {
            action: StorageAction::Load,
            path: None,
            source: error.code,
        })
    }

    pub fn to_ron(&self) -> Result<String, Error> {
        to_string_pretty(self, PrettyConfig::new()).map_err(|source| Error::Ron {
            action: StorageAction::Save,
            path: None,
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::StorageIo {
            action: StorageAction::Load,
            path: Some(path.display().to_string()),
            source,
        })?;
        Self::from_ron(&contents).map_err(|error| with_path(error, path))
    }

    /// Loads `path`, falling back to defaults when the file is absent or
    /// unreadable. Only a missing file is silent.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!(target: targets::CONFIG, path = %path.display(), "Panel config loaded");
                config
            }
            Err(Error::StorageIo { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                info!(target: targets::CONFIG, path = %path.display(), "No panel config; using defaults");
                Self::default()
            }
            Err(error) => {
                warn!(
                    target: targets::CONFIG,
                    error = %error.technical_detail(),
                    "Panel config unusable; using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let contents = self.to_ron().map_err(|error| with_path(error, path))?;
        fs::write(path, contents).map_err(|source| Error::StorageIo {
            action: StorageAction::Save,
            path: Some(path.display().to_string()),
            source,
        })
    }
}

fn with_path(error: Error, path: &Path) -> Error {
    match error {
        Error::Ron { action, source, .. } => Error::Ron {
            action,
            path: Some(path.display().to_string()),
            source,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("qbctl-{}-{name}.ron", std::process::id()))
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config = PanelConfig::from_ron(r#"(api_base: "http://panel:8000", poll_interval_ms: 500)"#)
            .expect("parse");
        assert_eq!(config.api_base, "http://panel:8000");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.notification_ttl(), Duration::from_millis(5000));
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn malformed_file_is_a_load_error() {
        let error = PanelConfig::from_ron("(api_base: 42").expect_err("malformed");
        assert!(matches!(
            error,
            Error::Ron {
                action: StorageAction::Load,
                ..
            }
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = scratch_path("missing");
        let _ = fs::remove_file(&path);
        assert_eq!(PanelConfig::load_or_default(&path), PanelConfig::default());
        assert!(matches!(
            PanelConfig::load(&path),
            Err(Error::StorageIo {
                action: StorageAction::Load,
                ..
            })
        ));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let path = scratch_path("saved");
        let config = PanelConfig {
            api_base: "https://nas.lan:5000".to_string(),
            request_timeout_ms: Some(1500),
            log_level: "debug".to_string(),
            ..PanelConfig::default()
        };
        config.save(&path).expect("save");
        let loaded = PanelConfig::load(&path).expect("load");
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn garbage_on_disk_falls_back_and_reports_path() {
        let path = scratch_path("garbage");
        fs::write(&path, "not ron at all {").expect("write");
        let error = PanelConfig::load(&path).expect_err("garbage");
        let fallback = PanelConfig::load_or_default(&path);
        let _ = fs::remove_file(&path);

        match error {
            Error::Ron { path: Some(reported), .. } => assert!(reported.ends_with("garbage.ron")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fallback, PanelConfig::default());
    }
}
