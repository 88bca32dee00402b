use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Position of an entry inside its configuration list.
///
/// Entries have no stable identity on the backend: index `i` always means
/// "whatever currently sits at position `i`". Adding or removing an entry
/// invalidates every index held before the next mirror reload.
pub type EntryIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    LuckyDevice,
    QbitInstance,
}

impl EntryKind {
    pub const ALL: [EntryKind; 2] = [EntryKind::LuckyDevice, EntryKind::QbitInstance];

    pub fn collection(self) -> &'static str {
        match self {
            EntryKind::LuckyDevice => "lucky-devices",
            EntryKind::QbitInstance => "qbit-instances",
        }
    }

    pub fn collection_path(self) -> String {
        format!("/api/config/{}", self.collection())
    }

    pub fn entry_path(self, index: EntryIndex) -> String {
        format!("/api/config/{}/{index}", self.collection())
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryKind::LuckyDevice => "Device",
            EntryKind::QbitInstance => "Instance",
        }
    }

    pub fn endpoint_label(self) -> &'static str {
        match self {
            EntryKind::LuckyDevice => "API URL",
            EntryKind::QbitInstance => "Host",
        }
    }

    /// Devices carry a pool weight, instances carry login credentials.
    pub fn has_weight(self) -> bool {
        matches!(self, EntryKind::LuckyDevice)
    }

    pub fn has_credentials(self) -> bool {
        matches!(self, EntryKind::QbitInstance)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared view over the two list-typed configuration entries.
pub trait ConfigEntry: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntryKind;

    fn name(&self) -> &str;
    fn endpoint(&self) -> &str;
    fn enabled(&self) -> bool;
    fn description(&self) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuckyDevice {
    pub name: String,
    pub api_url: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl ConfigEntry for LuckyDevice {
    const KIND: EntryKind = EntryKind::LuckyDevice;

    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        &self.api_url
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QbitInstance {
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl ConfigEntry for QbitInstance {
    const KIND: EntryKind = EntryKind::QbitInstance;

    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        &self.host
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub poll_interval: u64,
    pub limit_on_delay: u64,
    pub limit_off_delay: u64,
    pub retry_interval: u64,
    pub limited_download: u64,
    pub limited_upload: u64,
    pub normal_download: u64,
    pub normal_upload: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval: 2,
            limit_on_delay: 5,
            limit_off_delay: 30,
            retry_interval: 10,
            limited_download: 1024,
            limited_upload: 512,
            normal_download: 0,
            normal_upload: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub lucky_devices: Vec<LuckyDevice>,
    #[serde(default)]
    pub qbittorrent_instances: Vec<QbitInstance>,
    #[serde(default)]
    pub controller_settings: ControllerSettings,
}

impl Configuration {
    pub fn len_of(&self, kind: EntryKind) -> usize {
        match kind {
            EntryKind::LuckyDevice => self.lucky_devices.len(),
            EntryKind::QbitInstance => self.qbittorrent_instances.len(),
        }
    }
}

/// One poll tick worth of status data. Payloads are passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub pool: serde_json::Value,
    pub instances: serde_json::Value,
    pub controller: serde_json::Value,
}

fn default_weight() -> f64 {
    1.0
}

fn default_enabled() -> bool {
    true
}
