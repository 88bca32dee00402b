pub mod api;
pub mod config;
pub mod connection;
pub mod error;
pub mod forms;
pub mod mirror;
pub mod model;
pub mod notify;
pub mod poller;
pub mod router;
pub mod targets;

#[cfg(test)]
mod test_support;

pub use api::{
    execute, fetch_json, ApiClient, ApiFuture, ApiRequest, ApiResponse, HttpApiClient, Method,
    MockApiClient, MockReply,
};
pub use config::{PanelConfig, DEFAULT_API_BASE, DEFAULT_CONFIG_PATH};
pub use connection::{ConnectionReport, ConnectionTester, TEST_CONNECTION_PATH};
pub use error::{Error, StorageAction};
pub use forms::{
    EditSession, FormController, FormEntry, FormMode, FormValues, SettingsForm, SubmitOutcome,
};
pub use mirror::{ConfigMirror, CONFIG_PATH};
pub use model::{
    ConfigEntry, Configuration, ControllerSettings, EntryIndex, EntryKind, LuckyDevice,
    QbitInstance, StatusSnapshot,
};
pub use notify::{
    Notification, NotificationId, NotificationQueue, Severity, DEFAULT_NOTIFICATION_TTL,
};
pub use poller::{
    LatestSnapshot, PollerHandle, StatusPoller, StatusRenderer, DEFAULT_POLL_PERIOD,
};
pub use router::{View, ViewRouter};
