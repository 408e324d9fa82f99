use agora_common::{
    model::{Id, user::UserMarker},
    notification::{Notice, NotificationQueue},
};
use dashmap::DashMap;
use std::time::Instant;

/// Submission outcome notices per user, each shown for its kind's display duration.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    queues: DashMap<Id<UserMarker>, NotificationQueue>,
}

impl NoticeBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, user: Id<UserMarker>, notice: Notice) {
        self.post_at(user, notice, Instant::now());
    }

    fn post_at(&self, user: Id<UserMarker>, notice: Notice, now: Instant) {
        let mut queue = self.queues.entry(user).or_default();
        queue.expire(now);
        queue.push(notice, now);
    }

    /// Notices still visible for `user`, oldest first.
    pub fn active(&self, user: Id<UserMarker>) -> Vec<Notice> {
        self.active_at(user, Instant::now())
    }

    fn active_at(&self, user: Id<UserMarker>, now: Instant) -> Vec<Notice> {
        let Some(mut queue) = self.queues.get_mut(&user) else {
            return Vec::new();
        };
        queue.expire(now);
        let active = queue.active(now).cloned().collect();
        drop(queue);

        self.queues.remove_if(&user, |_, queue| queue.is_empty());
        active
    }
}
