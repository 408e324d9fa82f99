use crate::server::{
    ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json, notices::NoticeBoard,
};
use agora_common::notification::Notice;
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(list_notices)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/notices", rejection(ServerError))]
struct ListNoticesPath();

async fn list_notices(
    ListNoticesPath(): ListNoticesPath,
    State(notices): State<Arc<NoticeBoard>>,
    user: AuthenticatedUser,
) -> Json<Vec<Notice>> {
    Json(notices.active(user.author().id))
}

#[cfg(test)]
mod tests {
    use crate::server::routes::notices::ListNoticesPath;

    #[test]
    fn paths() {
        assert_eq!(ListNoticesPath().to_string(), "/notices");
    }
}
