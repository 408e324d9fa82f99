use crate::server::extract::Json;
use agora_common::compose::view::ViewStatus;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

/// A composed view as a response.
///
/// Failed fetches become `502 Bad Gateway`, carrying the record source's message.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct View<T>(pub ViewStatus<T>);

impl<T> View<T> {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ViewStatus::Ready { .. } => StatusCode::OK,
            ViewStatus::Loading => StatusCode::ACCEPTED,
            ViewStatus::Error { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl<T: Serialize> IntoResponse for View<T> {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ViewStatus::Error { message } = &self.0 {
            warn!(error = %message, %status, "Replying with failed view");
        }

        (status, Json(self.0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::server::view::View;
    use agora_common::compose::view::ViewStatus;
    use axum::{http::StatusCode, response::IntoResponse};

    #[test]
    fn statuses() {
        assert_eq!(View(ViewStatus::Ready { data: 1 }).status(), StatusCode::OK);
        assert_eq!(View::<u8>(ViewStatus::Loading).status(), StatusCode::ACCEPTED);
        assert_eq!(
            View::<u8>(ViewStatus::Error {
                message: "network error".to_owned()
            })
            .into_response()
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
