use crate::model::{
    Id,
    user::{Author, UserMarker},
};
use time::OffsetDateTime;

/// A sign-in session issued by the identity provider.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Session {
    pub user: Id<UserMarker>,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub expires_at: Option<OffsetDateTime>,
}

impl Session {
    #[must_use]
    pub fn author(&self) -> Author {
        Author {
            id: self.user,
            avatar_url: self.avatar_url.clone(),
        }
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, session::Session};
    use time::macros::datetime;

    #[test]
    fn session_expiry() {
        let mut session = Session {
            user: Id::new(1),
            avatar_url: None,
            created_at: datetime!(2025-01-01 00:00 UTC),
            expires_at: None,
        };
        assert!(!session.is_expired_at(datetime!(2030-01-01 00:00 UTC)));

        session.expires_at = Some(datetime!(2025-01-02 00:00 UTC));
        assert!(!session.is_expired_at(datetime!(2025-01-01 12:00 UTC)));
        assert!(session.is_expired_at(datetime!(2025-01-02 00:00 UTC)));
    }
}
