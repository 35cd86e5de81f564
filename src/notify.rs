use std::fmt::Display;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Notices older than this are pruned.
pub const NOTICE_TTL_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at < Duration::seconds(NOTICE_TTL_SECS)
    }
}

/// Transient notifications raised by a screen.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    notices: Vec<Notice>,
}

impl Notifications {
    fn push(&mut self, kind: NoticeKind, content: String) -> Uuid {
        let notice = Notice {
            id: Uuid::new_v4(),
            kind,
            content,
            created_at: Utc::now(),
        };
        let id = notice.id;
        self.notices.push(notice);
        id
    }

    pub fn success(&mut self, msg: &str) -> Uuid {
        self.push(NoticeKind::Success, msg.to_string())
    }

    pub fn warning(&mut self, msg: &str) -> Uuid {
        self.push(NoticeKind::Warning, msg.to_string())
    }

    pub fn error(&mut self, msg: &str, e: impl Display) -> Uuid {
        tracing::warn!(error = %e, "{}", msg);
        self.push(NoticeKind::Error, format!("{} {}", msg, e))
    }

    pub fn dismiss(&mut self, id: Uuid) {
        self.notices.retain(|notice| notice.id != id);
    }

    pub fn prune(&mut self, now: DateTime<Utc>) {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.is_live(now));
        if self.notices.len() < before {
            tracing::debug!(expired = before - self.notices.len(), "Pruned notices");
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Notices still within their display window at `now`.
    pub fn active(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(move |notice| notice.is_live(now))
    }

    pub fn last(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.kind == NoticeKind::Error)
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_notice_carries_cause() {
        let mut notices = Notifications::default();
        notices.error("Failed to load fees:", "HTTP 500");
        let last = notices.last().unwrap();
        assert_eq!(last.kind, NoticeKind::Error);
        assert_eq!(last.content, "Failed to load fees: HTTP 500");
    }

    #[test]
    fn dismiss_and_prune() {
        let mut notices = Notifications::default();
        let saved = notices.success("Saved");
        notices.warning("Slow network");
        notices.dismiss(saved);
        assert_eq!(notices.len(), 1);

        let later = Utc::now() + Duration::seconds(NOTICE_TTL_SECS + 1);
        assert_eq!(notices.active(Utc::now()).count(), 1);
        assert_eq!(notices.active(later).count(), 0);
        notices.prune(later);
        assert!(notices.is_empty());
    }
}
