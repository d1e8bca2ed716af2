//! Notification log: user-facing success/error messages, kept until the
//! user dismisses them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Oldest entries are dropped beyond this many.
const MAX_RETAINED: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A message surfaced to the user once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Bounded notification log owned by a single wizard session.
#[derive(Debug, Default)]
pub struct Notifications {
    entries: Vec<Notification>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a notification, dropping the oldest beyond the retention cap.
    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) -> Notification {
        let notification = Notification::new(level, message);
        info!(
            notification_id = %notification.id,
            level = %notification.level,
            message = %notification.message,
            "Notification recorded"
        );

        self.entries.push(notification.clone());
        if self.entries.len() > MAX_RETAINED {
            let excess = self.entries.len() - MAX_RETAINED;
            self.entries.drain(..excess);
            debug!(dropped = excess, "Pruned old notifications");
        }

        notification
    }

    pub fn success(&mut self, message: impl Into<String>) -> Notification {
        self.push(NotificationLevel::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> Notification {
        self.push(NotificationLevel::Error, message)
    }

    /// Remove a notification once the user has seen it.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        self.entries.len() != before
    }

    pub fn all(&self) -> &[Notification] {
        &self.entries
    }

    pub fn count_level(&self, level: NotificationLevel) -> usize {
        self.entries.iter().filter(|n| n.level == level).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
