use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub const GENERIC_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Missing required booking information")]
    MissingInformation(Vec<&'static str>),

    #[error("upstream service error: {0:#}")]
    Upstream(anyhow::Error),

    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Storage(e)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Storage(e.into())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::MissingInformation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the detail of this error is safe to show to the caller.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, AppError::Upstream(_) | AppError::Storage(_))
    }

    /// Renders the error, attaching raw detail for internal failures only when
    /// `diagnostics` is set.
    pub fn into_response_with(self, diagnostics: bool) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::MissingInformation(fields) => serde_json::json!({
                "success": false,
                "message": self.to_string(),
                "missing": fields,
            }),
            e if e.is_user_facing() => serde_json::json!({
                "success": false,
                "message": e.to_string(),
            }),
            e => {
                tracing::error!(error = %e, "request failed");
                let mut body = serde_json::json!({
                    "success": false,
                    "message": GENERIC_ERROR_MESSAGE,
                });
                if diagnostics {
                    body["error"] = serde_json::Value::String(e.to_string());
                }
                body
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}
