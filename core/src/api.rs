use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::{targets, Error};

const MAX_DETAIL_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type ApiFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse, Error>> + Send + 'a>>;

/// Transport seam for the controller REST API.
///
/// Implementations only fail with [`Error::Transport`]; status and body
/// interpretation happens in [`execute`] and [`fetch_json`].
pub trait ApiClient: Send + Sync {
    fn send<'a>(&'a self, request: ApiRequest) -> ApiFuture<'a>;
}

/// Sends `request` and turns non-2xx responses into [`Error::HttpStatus`].
pub async fn execute(client: &dyn ApiClient, request: ApiRequest) -> Result<ApiResponse, Error> {
    let method = request.method;
    let path = request.path.clone();
    let response = client.send(request).await?;
    if response.is_success() {
        return Ok(response);
    }

    Err(Error::HttpStatus {
        method: method.to_string(),
        path,
        status: response.status,
        detail: error_detail(&response.body),
    })
}

/// Like [`execute`] but also decodes the body as JSON.
pub async fn fetch_json<T>(client: &dyn ApiClient, request: ApiRequest) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let path = request.path.clone();
    let response = execute(client, request).await?;
    serde_json::from_str(&response.body).map_err(|error| {
        warn!(
            target: targets::API,
            path = %path,
            error = %error,
            "Response body is not valid JSON for the expected shape"
        );
        Error::Decode {
            path,
            details: error.to_string(),
        }
    })
}

fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed)
    {
        match map.get("detail") {
            Some(serde_json::Value::String(detail)) => return Some(detail.clone()),
            Some(other) => return Some(other.to_string()),
            None => {}
        }
    }

    Some(trimmed.chars().take(MAX_DETAIL_CHARS).collect())
}

#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, Error> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|error| Error::Transport {
            method: "INIT".to_string(),
            path: base_url.clone(),
            details: error.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let ApiRequest { method, path, body } = request;
        let url = format!("{}{}", self.base_url, path);

        debug!(target: targets::API, method = %method, url = %url, "HTTP request");
        if let Some(body) = &body {
            trace!(target: targets::API, method = %method, url = %url, body = %body, "HTTP request body");
        }

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let transport_error = |error: reqwest::Error| {
            warn!(
                target: targets::API,
                method = %method,
                url = %url,
                error = %error,
                "HTTP request failed"
            );
            Error::Transport {
                method: method.to_string(),
                path: path.clone(),
                details: error.to_string(),
            }
        };

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;

        debug!(target: targets::API, method = %method, url = %url, status, "HTTP response");
        trace!(target: targets::API, method = %method, url = %url, body = %text, "HTTP response body");

        Ok(ApiResponse { status, body: text })
    }
}

impl ApiClient for HttpApiClient {
    fn send<'a>(&'a self, request: ApiRequest) -> ApiFuture<'a> {
        Box::pin(async move { HttpApiClient::send(self, request).await })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Respond {
        status: u16,
        body: String,
        delay: Duration,
    },
    Fail {
        details: String,
        delay: Duration,
    },
}

impl MockReply {
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        MockReply::Respond {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn ok(body: &serde_json::Value) -> Self {
        Self::json(200, body)
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        MockReply::Respond {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn transport(details: impl Into<String>) -> Self {
        MockReply::Fail {
            details: details.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        match self {
            MockReply::Respond { status, body, .. } => MockReply::Respond {
                status,
                body,
                delay,
            },
            MockReply::Fail { details, .. } => MockReply::Fail { details, delay },
        }
    }

    fn delay(&self) -> Duration {
        match self {
            MockReply::Respond { delay, .. } | MockReply::Fail { delay, .. } => *delay,
        }
    }
}

type RouteKey = (Method, String);

#[derive(Debug, Default)]
struct MockState {
    queued: HashMap<RouteKey, VecDeque<MockReply>>,
    fallback: HashMap<RouteKey, MockReply>,
    requests: Vec<ApiRequest>,
}

/// Scripted [`ApiClient`]: per-route reply queues with an optional sticky
/// fallback, plus a log of every request it saw.
#[derive(Debug, Clone, Default)]
pub struct MockApiClient {
    state: Arc<Mutex<MockState>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, method: Method, path: impl Into<String>, reply: MockReply) {
        if let Ok(mut state) = self.state.lock() {
            state
                .queued
                .entry((method, path.into()))
                .or_default()
                .push_back(reply);
        }
    }

    pub fn set_fallback(&self, method: Method, path: impl Into<String>, reply: MockReply) {
        if let Ok(mut state) = self.state.lock() {
            state.fallback.insert((method, path.into()), reply);
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        if let Ok(state) = self.state.lock() {
            return state.requests.clone();
        }
        Vec::new()
    }

    pub fn request_count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    fn next_reply(&self, request: &ApiRequest) -> Option<MockReply> {
        let mut state = self.state.lock().ok()?;
        state.requests.push(request.clone());
        let key = (request.method, request.path.clone());
        if let Some(reply) = state.queued.get_mut(&key).and_then(VecDeque::pop_front) {
            return Some(reply);
        }
        state.fallback.get(&key).cloned()
    }
}

impl ApiClient for MockApiClient {
    fn send<'a>(&'a self, request: ApiRequest) -> ApiFuture<'a> {
        Box::pin(async move {
            let method = request.method.to_string();
            let path = request.path.clone();
            let Some(reply) = self.next_reply(&request) else {
                return Err(Error::Transport {
                    method,
                    path,
                    details: "MockApiClient has no reply for this route".to_string(),
                });
            };

            let delay = reply.delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match reply {
                MockReply::Respond { status, body, .. } => Ok(ApiResponse { status, body }),
                MockReply::Fail { details, .. } => Err(Error::Transport {
                    method,
                    path,
                    details,
                }),
            }
        })
    }
}
