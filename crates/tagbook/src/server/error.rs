use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use tagbook_core::{CoreError, ErrorKind};

// ==============================================================================
// Error Type
// ==============================================================================

pub(crate) enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Core(CoreError),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

fn kind_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidArgument | ErrorKind::NothingToUpdate => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NameAlreadyExists | ErrorKind::InUseCannotDelete => StatusCode::CONFLICT,
        ErrorKind::Busy => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::OperationFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorKind::InvalidArgument.to_string(),
                msg,
            ),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized".to_string(), msg),
            Self::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorKind::NotFound.to_string(),
                msg,
            ),
            Self::Core(err) => {
                let kind = err.kind();
                let message = if kind == ErrorKind::OperationFailed {
                    tracing::error!(error = %err, "request failed in storage");
                    "operation failed".to_string()
                } else {
                    err.to_string()
                };
                (kind_status(kind), kind.to_string(), message)
            }
        };

        (
            status,
            Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_status_family() {
        assert_eq!(kind_status(ErrorKind::InvalidArgument), StatusCode::BAD_REQUEST);
        assert_eq!(kind_status(ErrorKind::NothingToUpdate), StatusCode::BAD_REQUEST);
        assert_eq!(kind_status(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(kind_status(ErrorKind::NameAlreadyExists), StatusCode::CONFLICT);
        assert_eq!(kind_status(ErrorKind::InUseCannotDelete), StatusCode::CONFLICT);
        assert_eq!(kind_status(ErrorKind::Busy), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            kind_status(ErrorKind::OperationFailed),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_failures_hide_their_details() {
        let err = CoreError::from(std::io::Error::other("disk on fire"));
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
