// Short-lived messages shown in the header bar (the app's "toasts").
//
// Each notice expires on its own. Callers pass `now` explicitly so the
// expiry logic can be tested without sleeping.

use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_LIFETIME_MS: i64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
    pub level: NoticeLevel,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Notices {
    next_id: u64,
    items: Vec<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        Notices::default()
    }

    pub fn push(&mut self, message: impl Into<String>, level: NoticeLevel) -> u64 {
        self.push_at(message, level, Utc::now(), Duration::milliseconds(DEFAULT_LIFETIME_MS))
    }

    pub fn push_at(
        &mut self,
        message: impl Into<String>,
        level: NoticeLevel,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.items.push(Notice {
            id,
            message: message.into(),
            level,
            expires_at: now + lifetime,
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|notice| notice.id != id);
    }

    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.items.retain(|notice| notice.expires_at > now);
    }

    pub fn active(&self) -> &[Notice] {
        &self.items
    }

    /// Most recent live notice, the one the header shows.
    pub fn latest(&self) -> Option<&Notice> {
        self.items.last()
    }
}
