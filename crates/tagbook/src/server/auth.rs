use axum::http::HeaderMap;

use super::error::AppError;

/// Check the session token and resolve the caller's user id.
pub(super) fn check_auth(expected_token: &str, headers: &HeaderMap) -> Result<i64, AppError> {
    let token = headers
        .get("x-api-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if token != expected_token {
        return Err(AppError::Unauthorized(
            "invalid or missing X-API-Token".to_string(),
        ));
    }

    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|uid| *uid > 0)
        .ok_or_else(|| AppError::Unauthorized("invalid or missing X-User-Id".to_string()))
}
