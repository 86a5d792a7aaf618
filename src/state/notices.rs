//! Transient user-visible notices (the dashboard's toasts)

use std::{collections::VecDeque, sync::Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// How many notices the board remembers
pub const NOTICE_HISTORY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NoticeBoard {
    recent: Mutex<VecDeque<Notice>>,
    tx: broadcast::Sender<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            recent: Mutex::new(VecDeque::with_capacity(NOTICE_HISTORY)),
            tx,
        }
    }

    pub fn post(&self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            level,
            message: message.into(),
            at: Utc::now(),
        };
        debug!(level = ?notice.level, "Notice: {}", notice.message);

        if let Ok(mut recent) = self.recent.lock() {
            if recent.len() == NOTICE_HISTORY {
                recent.pop_front();
            }
            recent.push_back(notice.clone());
        }

        // No subscribers is fine
        let _ = self.tx.send(notice);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.post(NoticeLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.post(NoticeLevel::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.post(NoticeLevel::Error, message);
    }

    /// Most recent notices, newest last
    pub fn recent(&self) -> Vec<Notice> {
        self.recent
            .lock()
            .map(|recent| recent.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}
