//! User-visible notifications.
//!
//! Managers never render anything themselves. When an operation succeeds or
//! fails in a way the user should see, they publish a [`Notice`] over an
//! unbounded channel and the presentation layer drains and renders it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Severity of a notice, mirrored into the presentation layer's styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A single user-visible notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
    /// RFC 3339 timestamp of when the notice was created.
    pub timestamp: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, message)
    }
}

/// Sending half of the notice channel, cloned into every manager.
#[derive(Debug, Clone)]
pub struct NoticeSender {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSender {
    /// Creates a new channel and returns the sender along with the receiver
    /// the presentation layer should drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publishes a notice. A closed receiver means the application is
    /// shutting down, so send failures are logged and dropped.
    pub fn send(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            tracing::debug!("notice receiver dropped, discarding notice");
        }
    }
}
