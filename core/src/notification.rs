//! User-facing notifications.
//!
//! View models describe toasts as [`Notification`] values inside
//! [`Effect::Notify`](crate::effect::Effect::Notify); delivery belongs to a
//! [`Notifier`](crate::environment::Notifier) collaborator.

use serde::{Deserialize, Serialize};

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Operation completed
    Success,
    /// Neutral information
    Info,
    /// Something needs attention
    Warn,
    /// Operation failed
    Error,
}

/// A toast-style message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Presentation level
    pub severity: Severity,
    /// Short headline
    pub summary: Option<String>,
    /// Longer explanation
    pub detail: Option<String>,
}

impl Notification {
    /// A notification with only a summary.
    #[must_use]
    pub fn new(severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            severity,
            summary: Some(summary.into()),
            detail: None,
        }
    }

    /// Success notification.
    #[must_use]
    pub fn success(summary: impl Into<String>) -> Self {
        Self::new(Severity::Success, summary)
    }

    /// Error notification.
    #[must_use]
    pub fn error(summary: impl Into<String>) -> Self {
        Self::new(Severity::Error, summary)
    }

    /// Attach a detail line.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
