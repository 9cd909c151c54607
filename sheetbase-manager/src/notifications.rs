//! Operator-facing notifications.

use chrono::{DateTime, Utc};
use sheetbase_cache::CacheObserver;
use sheetbase_core::{CacheEvent, EndpointError};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Notifications kept before the oldest are dropped.
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// How loudly to present a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStyle {
    /// Transient, non-blocking.
    Toast,
    /// Must be acknowledged.
    Alert,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub style: NotificationStyle,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn toast(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            style: NotificationStyle::Toast,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn alert(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            style: NotificationStyle::Alert,
            ..Self::toast(level, message)
        }
    }

    /// Notification for a cache event. Failed loads are alerts; save
    /// outcomes are toasts.
    pub fn from_event(event: &CacheEvent) -> Self {
        match event {
            CacheEvent::FetchFailed { partition, error } => Self::alert(
                NotificationLevel::Error,
                format!(
                    "Could not load project '{}': {}. Some features may not work correctly.",
                    partition,
                    describe(error)
                ),
            ),
            CacheEvent::SaveSucceeded { .. } => {
                Self::toast(NotificationLevel::Success, "Data saved to your spreadsheet.")
            }
            CacheEvent::SaveFailed { error, .. } => Self::toast(
                NotificationLevel::Error,
                format!(
                    "Could not save data: {}. Your changes might not persist.",
                    describe(error)
                ),
            ),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            NotificationStyle::Toast => write!(f, "[{}] {}", self.level.as_str(), self.message),
            NotificationStyle::Alert => {
                write!(f, "[{}] ALERT: {}", self.level.as_str(), self.message)
            }
        }
    }
}

/// Short human text for an endpoint failure. Remote errors show the remote's
/// own message.
pub fn describe(error: &EndpointError) -> String {
    match error {
        EndpointError::Remote { message } => message.clone(),
        other => other.to_string(),
    }
}

/// Bounded, shared log of recent notifications.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    entries: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn push(&self, notification: Notification) {
        let mut entries = self.entries();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
    }

    pub fn toast(&self, level: NotificationLevel, message: impl Into<String>) {
        self.push(Notification::toast(level, message));
    }

    pub fn alert(&self, level: NotificationLevel, message: impl Into<String>) {
        self.push(Notification::alert(level, message));
    }

    /// Snapshot, oldest first.
    pub fn recent(&self) -> Vec<Notification> {
        self.entries().iter().cloned().collect()
    }

    /// Remove and return everything, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.entries().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheObserver for NotificationCenter {
    fn on_event(&self, event: &CacheEvent) {
        self.push(Notification::from_event(event));
    }
}
