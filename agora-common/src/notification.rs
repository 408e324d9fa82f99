//! Outcome notices for submissions and the timed queue that displays them.
//!
//! Business logic only emits a [`Notice`]; how long it stays visible is decided
//! by whoever owns the [`NotificationQueue`].

use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    ValidationFailure,
    SignInRequired,
}

impl NoticeKind {
    #[must_use]
    pub fn display_duration(self) -> Duration {
        match self {
            NoticeKind::Success => Duration::from_millis(2000),
            NoticeKind::Error | NoticeKind::ValidationFailure => Duration::from_millis(3000),
            NoticeKind::SignInRequired => Duration::from_millis(1500),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    pub fn validation_failure(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::ValidationFailure, message)
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
struct QueuedNotice {
    notice: Notice,
    expires_at: Instant,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct NotificationQueue {
    queued: VecDeque<QueuedNotice>,
}

impl NotificationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `notice` to be shown from `now` for its kind's display duration.
    ///
    /// A notice identical to one still on screen replaces it and restarts its timer.
    pub fn push(&mut self, notice: Notice, now: Instant) {
        self.queued.retain(|queued| queued.notice != notice);
        let expires_at = now + notice.kind.display_duration();
        self.queued.push_back(QueuedNotice { notice, expires_at });
    }

    /// Notices still visible at `now`, oldest first.
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Notice> {
        self.queued
            .iter()
            .filter(move |queued| queued.expires_at > now)
            .map(|queued| &queued.notice)
    }

    /// Drops every notice that has expired by `now` and returns how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.queued.len();
        self.queued.retain(|queued| queued.expires_at > now);
        before - self.queued.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::notification::{Notice, NoticeKind, NotificationQueue};
    use std::time::{Duration, Instant};

    #[test]
    fn notices_expire_per_kind() {
        let start = Instant::now();
        let mut queue = NotificationQueue::new();

        queue.push(Notice::success("Post created successfully!"), start);
        queue.push(
            Notice::validation_failure("Please select an image before submitting."),
            start,
        );
        assert_eq!(queue.active(start).count(), 2);
        assert_eq!(
            queue
                .active(start + Duration::from_millis(1999))
                .map(|notice| notice.kind)
                .collect::<Vec<_>>(),
            [NoticeKind::Success, NoticeKind::ValidationFailure]
        );

        let later = start + Duration::from_millis(2500);
        assert_eq!(
            queue.active(later).map(|notice| notice.kind).collect::<Vec<_>>(),
            [NoticeKind::ValidationFailure]
        );
        assert_eq!(queue.expire(later), 1);
        assert!(!queue.is_empty());

        assert_eq!(queue.expire(start + Duration::from_millis(3000)), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn repeated_notice_restarts_timer() {
        let start = Instant::now();
        let mut queue = NotificationQueue::new();
        let notice = Notice::error("Error creating post. Please try again.");

        queue.push(notice.clone(), start);
        queue.push(notice.clone(), start + Duration::from_millis(2000));

        assert_eq!(queue.expire(start + Duration::from_millis(2000)), 0);
        let still_visible = start + Duration::from_millis(4000);
        assert_eq!(queue.active(still_visible).collect::<Vec<_>>(), [&notice]);
    }

    #[test]
    fn sign_in_notice_is_brief() {
        assert_eq!(
            NoticeKind::SignInRequired.display_duration(),
            Duration::from_millis(1500)
        );
        assert_eq!(
            serde_json::to_string(&Notice::validation_failure("x")).unwrap(),
            r#"{"kind":"validation_failure","message":"x"}"#
        );
    }
}
