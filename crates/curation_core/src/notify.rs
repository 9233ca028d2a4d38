//! Notification port.
//!
//! # Responsibility
//! - Carry transient user-facing messages (save success/failure) out of core.
//! - Fan out to subscribed sinks without holding global state.
//!
//! # Invariants
//! - Publishing never fails and never blocks on a missing subscriber.

use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Info,
    Error,
}

/// One toast/snackbar message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Receiver of published notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Subscriber list injected at the service boundary.
#[derive(Clone, Default)]
pub struct NotificationHub {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: Arc<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn publish(&self, notification: Notification) {
        for sink in &self.sinks {
            sink.notify(&notification);
        }
    }
}

/// Buffering sink for callers that poll (UI frame loop, tests).
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: Mutex<Vec<Notification>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every buffered notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map_or(0, |pending| pending.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for NotificationQueue {
    fn notify(&self, notification: &Notification) {
        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        pending.push(notification.clone());
    }
}
