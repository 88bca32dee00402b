//! In-memory stand-in for the controller backend's config routes.

use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::api::{ApiClient, ApiFuture, ApiRequest, ApiResponse, Method};
use crate::model::{Configuration, EntryKind, LuckyDevice, QbitInstance};
use crate::Error;

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBackend {
    config: Arc<Mutex<Configuration>>,
    fail_writes_with: Arc<Mutex<Option<u16>>>,
    writes: Arc<Mutex<Vec<ApiRequest>>>,
}

impl FakeBackend {
    pub(crate) fn with_devices(devices: Vec<LuckyDevice>) -> Self {
        let backend = Self::default();
        if let Ok(mut config) = backend.config.lock() {
            config.lucky_devices = devices;
        }
        backend
    }

    pub(crate) fn config(&self) -> Configuration {
        self.config.lock().expect("backend lock").clone()
    }

    pub(crate) fn fail_writes(&self, status: Option<u16>) {
        *self.fail_writes_with.lock().expect("backend lock") = status;
    }

    pub(crate) fn writes(&self) -> Vec<ApiRequest> {
        self.writes.lock().expect("backend lock").clone()
    }

    /// Mutates the backend directly, as another client would.
    pub(crate) fn remove_device_elsewhere(&self, index: usize) -> LuckyDevice {
        self.config.lock().expect("backend lock").lucky_devices.remove(index)
    }

    fn handle(&self, request: &ApiRequest) -> ApiResponse {
        if request.method == Method::Get && request.path == "/api/config/" {
            let config = self.config();
            return respond(200, serde_json::to_value(config).unwrap_or_default());
        }

        self.writes.lock().expect("backend lock").push(request.clone());
        if let Some(status) = *self.fail_writes_with.lock().expect("backend lock") {
            return respond(status, json!({"detail": "write rejected"}));
        }

        let mut config = self.config.lock().expect("backend lock");
        if request.path == "/api/config/controller-settings" && request.method == Method::Put {
            return match request.body.clone().map(serde_json::from_value) {
                Some(Ok(settings)) => {
                    config.controller_settings = settings;
                    respond(200, json!({"message": "ok"}))
                }
                _ => respond(422, json!({"detail": "bad settings"})),
            };
        }

        for kind in EntryKind::ALL {
            if request.path == kind.collection_path() && request.method == Method::Post {
                let Some(body) = request.body.clone() else {
                    return respond(422, json!({"detail": "missing body"}));
                };
                return match kind {
                    EntryKind::LuckyDevice => match serde_json::from_value::<LuckyDevice>(body) {
                        Ok(entry) => {
                            config.lucky_devices.push(entry);
                            respond(200, json!({"message": "added"}))
                        }
                        Err(_) => respond(422, json!({"detail": "bad device"})),
                    },
                    EntryKind::QbitInstance => match serde_json::from_value::<QbitInstance>(body) {
                        Ok(entry) => {
                            config.qbittorrent_instances.push(entry);
                            respond(200, json!({"message": "added"}))
                        }
                        Err(_) => respond(422, json!({"detail": "bad instance"})),
                    },
                };
            }

            let prefix = format!("{}/", kind.collection_path());
            let Some(index) = request
                .path
                .strip_prefix(&prefix)
                .and_then(|rest| rest.parse::<usize>().ok())
            else {
                continue;
            };
            if index >= config.len_of(kind) {
                return respond(500, json!({"detail": "index out of range"}));
            }

            match (request.method, kind) {
                (Method::Delete, EntryKind::LuckyDevice) => {
                    config.lucky_devices.remove(index);
                }
                (Method::Delete, EntryKind::QbitInstance) => {
                    config.qbittorrent_instances.remove(index);
                }
                (Method::Put, EntryKind::LuckyDevice) => {
                    match request.body.clone().map(serde_json::from_value) {
                        Some(Ok(entry)) => config.lucky_devices[index] = entry,
                        _ => return respond(422, json!({"detail": "bad device"})),
                    }
                }
                (Method::Put, EntryKind::QbitInstance) => {
                    match request.body.clone().map(serde_json::from_value) {
                        Some(Ok(entry)) => config.qbittorrent_instances[index] = entry,
                        _ => return respond(422, json!({"detail": "bad instance"})),
                    }
                }
                _ => return respond(405, json!({"detail": "method not allowed"})),
            }
            return respond(200, json!({"message": "ok"}));
        }

        respond(404, json!({"detail": "Not Found"}))
    }
}

fn respond(status: u16, body: serde_json::Value) -> ApiResponse {
    ApiResponse {
        status,
        body: body.to_string(),
    }
}

impl ApiClient for FakeBackend {
    fn send<'a>(&'a self, request: ApiRequest) -> ApiFuture<'a> {
        Box::pin(async move { Ok::<_, Error>(self.handle(&request)) })
    }
}

pub(crate) fn device(name: &str, weight: f64) -> LuckyDevice {
    LuckyDevice {
        name: name.to_string(),
        api_url: format!("http://{name}.lan:16601"),
        weight,
        enabled: true,
        description: None,
    }
}
