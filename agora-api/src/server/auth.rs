use crate::server::ServerError;
use agora_common::model::user::Author;
use agora_db::client::DbClient;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use time::OffsetDateTime;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The signed-in user a request acts for.
///
/// Requests without a live session are turned away before the handler runs.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct AuthenticatedUser {
    author: Author,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn author(&self) -> &Author {
        &self.author
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            AuthorizationHeader::from_request_parts(parts, state)
                .await
                .map_err(ServerError::InvalidAuthorizationHeader)?;

        let session = Arc::<DbClient>::from_ref(state)
            .fetch_session(bearer.token())
            .await?
            .ok_or(ServerError::InvalidToken)?;

        if session.is_expired_at(OffsetDateTime::now_utc()) {
            return Err(ServerError::ExpiredSession);
        }

        Ok(Self {
            author: session.author(),
        })
    }
}
