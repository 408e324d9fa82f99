use crate::server::{ServerRouter, extract::Json, notices::NoticeBoard};
use agora_common::{
    model::{Id, user::UserMarker},
    notification::Notice,
};
use agora_db::{composer::ReadMode, submit::SubmitError};
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

mod communities;
mod notices;
mod posts;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(posts::routes())
        .merge(communities::routes())
        .merge(notices::routes())
}

fn read_mode(refresh: bool) -> ReadMode {
    if refresh {
        ReadMode::Refresh
    } else {
        ReadMode::Cached
    }
}

/// Reply to a successful submission.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct Submitted<I> {
    id: I,
    notice: Notice,
}

impl<I> Submitted<I> {
    fn new(id: I, message: &str) -> Self {
        Self {
            id,
            notice: Notice::success(message),
        }
    }
}

/// Leaves the submission's outcome on the author's notice board.
fn post_notice<I>(
    notices: &NoticeBoard,
    author: Id<UserMarker>,
    submitted: Result<Submitted<I>, SubmitError>,
) -> Result<Submitted<I>, SubmitError> {
    let notice = match &submitted {
        Ok(submitted) => submitted.notice.clone(),
        Err(err) => err.notice(),
    };
    notices.post(author, notice);
    submitted
}

impl<I: Serialize> IntoResponse for Submitted<I> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}
