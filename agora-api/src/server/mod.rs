use agora_common::{
    model::{Id, post::PostMarker},
    notification::{Notice, NoticeKind},
};
use agora_db::{client::DbClient, composer::ViewComposer, submit::SubmitError, submit::Submitter};
use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use extract::Json;
use notices::NoticeBoard;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

mod auth;
mod extract;
pub mod notices;
mod routes;
mod view;

pub const SIGN_IN_REQUIRED: &str = "Please sign in to access this page.";

pub type ServerRouter = Router<ServerState>;
pub type Composer = ViewComposer<DbClient>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub composer: Arc<Composer>,
    pub submitter: Arc<Submitter<DbClient>>,
    pub notices: Arc<NoticeBoard>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("Provided token was invalid")]
    InvalidToken,
    #[error("Session has expired")]
    ExpiredSession,
    #[error("Image data is not valid base64: {0}")]
    InvalidImage(#[from] base64::DecodeError),
    #[error(transparent)]
    Database(#[from] agora_db::client::DbError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::InvalidToken | ServerError::ExpiredSession => StatusCode::UNAUTHORIZED,
            ServerError::QueryRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            ServerError::Submit(SubmitError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Submit(SubmitError::DuplicateCommunity) => StatusCode::CONFLICT,
            ServerError::Submit(SubmitError::Store { .. }) => StatusCode::BAD_GATEWAY,
            ServerError::JsonResponse(_) | ServerError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The notice shown to the user for this error.
    pub fn notice(&self) -> Notice {
        match self {
            ServerError::Submit(err) => err.notice(),
            ServerError::InvalidToken | ServerError::ExpiredSession => {
                Notice::new(NoticeKind::SignInRequired, SIGN_IN_REQUIRED)
            }
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                Notice::new(NoticeKind::SignInRequired, SIGN_IN_REQUIRED)
            }
            ServerError::JsonResponse(_) | ServerError::Database(_) => {
                Notice::error("Something went wrong. Please try again.")
            }
            _ => Notice::error(self.to_string()),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct ErrorResponse {
    status: u16,
    notice: Notice,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            notice: self.notice(),
        };
        (status, Json(error_response)).into_response()
    }
}
