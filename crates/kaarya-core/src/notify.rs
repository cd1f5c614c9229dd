use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

pub const SHORT: Duration = Duration::from_millis(4000);
pub const LONG: Duration = Duration::from_millis(8000);
pub const EXTRA_LONG: Duration = Duration::from_millis(10000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Info,
}

/// A transient message for the user. Nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
    pub duration: Duration,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
            duration: SHORT,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            duration: SHORT,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
            duration: SHORT,
        }
    }

    pub fn lasting(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

pub trait NotificationSink: Send + Sync {
    fn push(&self, notice: Notice);
}

/// Collects notices until the front-end drains and displays them.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }
}

impl NotificationSink for NoticeLog {
    fn push(&self, notice: Notice) {
        debug!(level = ?notice.level, duration_ms = notice.duration.as_millis() as u64, "notice queued");
        self.notices.lock().push(notice);
    }
}
