use crate::error::{ErrorKind, PokeError};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Error returned by HTTP handlers.
///
/// Only the kind reaches the caller; the underlying error is logged here.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
}

impl ApiError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.kind.public_message(),
            "kind": self.kind,
        }));
        (self.status(), body).into_response()
    }
}

impl From<PokeError> for ApiError {
    fn from(err: PokeError) -> Self {
        let kind = err.kind();
        match kind {
            ErrorKind::NotFound | ErrorKind::InvalidInput => {
                warn!(error = %err, kind = %kind, "Request rejected")
            }
            _ => error!(error = %err, kind = %kind, "Request failed"),
        }
        Self::new(kind)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Malformed request body");
        Self::new(ErrorKind::InvalidInput)
    }
}
