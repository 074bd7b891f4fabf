//! User-facing notifications.
//!
//! The core only emits notifications; how they are shown (toast, terminal
//! line, desktop popup) is up to the [`Notifier`] implementation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    /// How long the message should stay visible.
    pub duration_ms: u64,
}

/// Fire-and-forget sink for notifications.
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Logs notifications through `tracing` and otherwise drops them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, n: Notification) {
        match n.severity {
            Severity::Error => tracing::warn!(title = %n.title, "{}", n.message),
            Severity::Info | Severity::Success => {
                tracing::info!(title = %n.title, "{}", n.message)
            }
        }
    }
}

/// Keeps every notification in memory, newest last.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    pub sent: Vec<Notification>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.sent.last()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.sent.iter().map(|n| n.title.as_str()).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&mut self, notification: Notification) {
        self.sent.push(notification);
    }
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn notify(&mut self, notification: Notification) {
        (**self).notify(notification);
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Drops notifications when disabled in configuration.
#[derive(Debug, Clone)]
pub struct Gated<N> {
    inner: N,
    enabled: bool,
}

impl<N: Notifier> Gated<N> {
    pub fn new(inner: N, enabled: bool) -> Self {
        Self { inner, enabled }
    }

    pub fn into_inner(self) -> N {
        self.inner
    }
}

impl<N: Notifier> Notifier for Gated<N> {
    fn notify(&mut self, notification: Notification) {
        if self.enabled {
            self.inner.notify(notification);
        } else {
            tracing::debug!(title = %notification.title, "notification suppressed");
        }
    }
}
