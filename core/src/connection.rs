use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::api::{fetch_json, ApiClient, ApiRequest};
use crate::notify::NotificationQueue;
use crate::{targets, Error};

pub const TEST_CONNECTION_PATH: &str = "/api/lucky/test-connection";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// One-shot verification of a device endpoint. Holds no state of its own.
#[derive(Clone)]
pub struct ConnectionTester {
    client: Arc<dyn ApiClient>,
    notifications: NotificationQueue,
}

impl ConnectionTester {
    pub fn new(client: Arc<dyn ApiClient>, notifications: NotificationQueue) -> Self {
        Self {
            client,
            notifications,
        }
    }

    pub async fn test(&self, endpoint: &str) -> Result<ConnectionReport, Error> {
        let request = ApiRequest::post(TEST_CONNECTION_PATH, json!({ "api_url": endpoint }));

        match fetch_json::<ConnectionReport>(self.client.as_ref(), request).await {
            Ok(report) if report.success => {
                info!(target: targets::CONNECTION, endpoint, "Connection test succeeded");
                self.notifications.success("Connection test succeeded");
                Ok(report)
            }
            Ok(report) => {
                let reason = report.message.as_deref().unwrap_or("no reason given");
                info!(target: targets::CONNECTION, endpoint, reason, "Connection test failed");
                self.notifications
                    .danger(format!("Connection test failed: {reason}"));
                Ok(report)
            }
            Err(error) => {
                warn!(
                    target: targets::CONNECTION,
                    endpoint,
                    error = %error.technical_detail(),
                    "Connection test request failed"
                );
                self.notifications
                    .danger(format!("Test request failed: {}", error.user_summary()));
                Err(error)
            }
        }
    }
}
