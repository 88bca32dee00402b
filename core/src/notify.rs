use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::targets;

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Success => f.write_str("success"),
            Severity::Danger => f.write_str("danger"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub created_at: Instant,
}

/// Display region for transient messages.
///
/// Every raised notification owns its own expiry timer and is removed by id,
/// so two identical messages expire independently.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    entries: Arc<Mutex<Vec<Notification>>>,
    next_id: Arc<AtomicU64>,
    ttl: Duration,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Must be called from within a tokio runtime.
    pub fn raise(&self, message: impl Into<String>, severity: Severity) -> NotificationId {
        let id = NotificationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let created_at = Instant::now();
        let message = message.into();

        debug!(target: targets::NOTIFY, id = id.0, %severity, message = %message, "Notification raised");

        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Notification {
                id,
                message,
                severity,
                created_at,
            });
        }

        let deadline = created_at + self.ttl;
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if queue.remove(id) {
                debug!(target: targets::NOTIFY, id = id.0, "Notification expired");
            }
        });

        id
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.raise(message, Severity::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.raise(message, Severity::Success)
    }

    pub fn danger(&self, message: impl Into<String>) -> NotificationId {
        self.raise(message, Severity::Danger)
    }

    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.remove(id)
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        if let Ok(entries) = self.entries.lock() {
            return entries.clone();
        }
        Vec::new()
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.snapshot().iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: NotificationId) -> bool {
        if let Ok(mut entries) = self.entries.lock() {
            if let Some(position) = entries.iter().position(|entry| entry.id == id) {
                entries.remove(position);
                return true;
            }
        }
        false
    }
}
