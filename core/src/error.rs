use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Transport failure for {method} {path}")]
    Transport {
        method: String,
        path: String,
        details: String,
    },
    #[error("HTTP {status} for {method} {path}")]
    HttpStatus {
        method: String,
        path: String,
        status: u16,
        detail: Option<String>,
    },
    #[error("Malformed response from {path}")]
    Decode { path: String, details: String },
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("RON {action} error")]
    Ron {
        action: StorageAction,
        path: Option<String>,
        #[source]
        source: ron::Error,
    },
    #[error("Storage {action} error")]
    StorageIo {
        action: StorageAction,
        path: Option<String>,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageAction {
    Load,
    Save,
}

impl fmt::Display for StorageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageAction::Load => f.write_str("load"),
            StorageAction::Save => f.write_str("save"),
        }
    }
}

impl Error {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    pub fn user_summary(&self) -> String {
        match self {
            Error::Transport { details, .. } => {
                format!("Could not reach the controller API: {details}")
            }
            Error::HttpStatus { status, detail, .. } => match detail {
                Some(detail) => format!("Server rejected the request ({status}): {detail}"),
                None => format!("Server rejected the request ({status})."),
            },
            Error::Decode { details, .. } => {
                format!("The server sent an unreadable response: {details}")
            }
            Error::Validation { field, reason } => format!("{field}: {reason}"),
            Error::Ron { action, .. } => format!("Failed to {action} panel configuration."),
            Error::StorageIo { action, .. } => {
                format!("Failed to {action} panel configuration file.")
            }
        }
    }

    pub fn technical_detail(&self) -> String {
        match self {
            Error::Transport {
                method,
                path,
                details,
            } => format!("{method} {path} transport error: {details}"),
            Error::HttpStatus {
                method,
                path,
                status,
                detail,
            } => {
                let detail = detail
                    .as_ref()
                    .map(|text| format!(": {text}"))
                    .unwrap_or_default();
                format!("{method} {path} returned HTTP {status}{detail}")
            }
            Error::Decode { path, details } => format!("Decoding {path} failed: {details}"),
            Error::Validation { field, reason } => {
                format!("Validation failed for {field}: {reason}")
            }
            Error::Ron {
                action,
                path,
                source,
            } => {
                let path = path
                    .as_ref()
                    .map(|value| format!(" path={value}."))
                    .unwrap_or_default();
                format!("RON {action} error.{path} {source}")
            }
            Error::StorageIo {
                action,
                path,
                source,
            } => {
                let path = path
                    .as_ref()
                    .map(|value| format!(" path={value}."))
                    .unwrap_or_default();
                format!("Storage {action} error.{path} {source}")
            }
        }
    }
}
