use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{fetch_json, ApiClient, ApiRequest};
use crate::model::Configuration;
use crate::{targets, Error};

pub const CONFIG_PATH: &str = "/api/config/";

/// In-memory copy of the server configuration.
///
/// `reload` is the only writer. Each successful reload swaps in a whole new
/// `Configuration`; subscribers see the swap through their watch receiver.
#[derive(Clone)]
pub struct ConfigMirror {
    client: Arc<dyn ApiClient>,
    state: Arc<watch::Sender<Arc<Configuration>>>,
}

impl ConfigMirror {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self::with_initial(client, Configuration::default())
    }

    pub fn with_initial(client: Arc<dyn ApiClient>, initial: Configuration) -> Self {
        let (sender, _) = watch::channel(Arc::new(initial));
        Self {
            client,
            state: Arc::new(sender),
        }
    }

    pub fn client(&self) -> Arc<dyn ApiClient> {
        Arc::clone(&self.client)
    }

    /// Last successfully loaded configuration.
    pub fn current(&self) -> Arc<Configuration> {
        Arc::clone(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Configuration>> {
        self.state.subscribe()
    }

    /// Fetches the full configuration and replaces the mirror.
    ///
    /// Failures leave the previous configuration in place and are logged only;
    /// the error is still returned for callers that care.
    pub async fn reload(&self) -> Result<Arc<Configuration>, Error> {
        match fetch_json::<Configuration>(self.client.as_ref(), ApiRequest::get(CONFIG_PATH)).await {
            Ok(config) => {
                let config = Arc::new(config);
                debug!(
                    target: targets::MIRROR,
                    devices = config.lucky_devices.len(),
                    instances = config.qbittorrent_instances.len(),
                    "Configuration reloaded"
                );
                self.state.send_replace(Arc::clone(&config));
                Ok(config)
            }
            Err(error) => {
                warn!(
                    target: targets::MIRROR,
                    error = %error.technical_detail(),
                    "Configuration reload failed; keeping previous mirror"
                );
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::{Method, MockApiClient, MockReply};
    use crate::model::LuckyDevice;

    fn device(name: &str) -> LuckyDevice {
        LuckyDevice {
            name: name.to_string(),
            api_url: format!("http://{name}"),
            weight: 1.0,
            enabled: true,
            description: None,
        }
    }

    #[tokio::test]
    async fn reload_replaces_configuration_and_notifies_subscribers() {
        let mock = MockApiClient::new();
        mock.push_reply(
            Method::Get,
            CONFIG_PATH,
            MockReply::ok(&json!({
                "lucky_devices": [{"name": "a", "api_url": "http://a", "weight": 1.0, "enabled": true}],
                "qbittorrent_instances": [],
                "controller_settings": {}
            })),
        );
        let mirror = ConfigMirror::new(Arc::new(mock));
        let mut receiver = mirror.subscribe();
        assert!(!receiver.has_changed().expect("sender alive"));

        let config = mirror.reload().await.expect("reload");
        assert_eq!(config.lucky_devices, vec![device("a")]);
        assert!(receiver.has_changed().expect("sender alive"));
        assert_eq!(receiver.borrow_and_update().lucky_devices.len(), 1);
        assert!(Arc::ptr_eq(&mirror.current(), &config));
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let mock = MockApiClient::new();
        mock.push_reply(Method::Get, CONFIG_PATH, MockReply::json(500, &json!({"detail": "boom"})));
        mock.push_reply(Method::Get, CONFIG_PATH, MockReply::raw(200, "not json"));
        mock.push_reply(Method::Get, CONFIG_PATH, MockReply::transport("connection reset"));

        let initial = Configuration {
            lucky_devices: vec![device("kept")],
            ..Configuration::default()
        };
        let mirror = ConfigMirror::with_initial(Arc::new(mock), initial.clone());
        let mut receiver = mirror.subscribe();
        let before = mirror.current();

        assert!(matches!(mirror.reload().await, Err(Error::HttpStatus { status: 500, .. })));
        assert!(matches!(mirror.reload().await, Err(Error::Decode { .. })));
        assert!(matches!(mirror.reload().await, Err(Error::Transport { .. })));

        assert!(Arc::ptr_eq(&before, &mirror.current()));
        assert_eq!(*mirror.current(), initial);
        assert!(!receiver.has_changed().expect("sender alive"));
        let _ = receiver.borrow_and_update();
    }

    #[tokio::test]
    async fn snapshot_held_by_reader_is_not_patched_by_reload() {
        let mock = MockApiClient::new();
        mock.push_reply(
            Method::Get,
            CONFIG_PATH,
            MockReply::ok(&json!({"lucky_devices": [{"name": "new", "api_url": "http://new"}]})),
        );
        let mirror = ConfigMirror::with_initial(
            Arc::new(mock),
            Configuration {
                lucky_devices: vec![device("old")],
                ..Configuration::default()
            },
        );

        let held = mirror.current();
        mirror.reload().await.expect("reload");

        assert_eq!(held.lucky_devices[0].name, "old");
        assert_eq!(mirror.current().lucky_devices[0].name, "new");
    }
}
