pub mod bookings;
pub mod conversation;
pub mod health;
pub mod hotels;
pub mod voice;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Serialize)]
struct Success<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

/// `{success: true, ...body}`.
pub(crate) fn ok<T: Serialize>(body: T) -> Response {
    Json(Success { success: true, body }).into_response()
}

/// `{success: true, data}`.
pub(crate) fn data<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(serde_json::json!({ "success": true, "data": value }))).into_response()
}

/// `{success: true, count, data}`.
pub(crate) fn list<T: Serialize>(items: Vec<T>) -> Response {
    Json(serde_json::json!({
        "success": true,
        "count": items.len(),
        "data": items,
    }))
    .into_response()
}

pub(crate) fn fail(state: &AppState, err: AppError) -> Response {
    err.into_response_with(state.config.diagnostics)
}

pub(crate) fn origin(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::ORIGIN).and_then(|v| v.to_str().ok())
}

#[allow(clippy::result_large_err)]
pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if expected_token.is_empty() || token != expected_token {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "success": false, "message": "Unauthorized" })),
        )
            .into_response());
    }
    Ok(())
}
