//! HTTP error adapter — every failure leaves as a JSON `{ "error": ... }`
//! body with the status the core taxonomy dictates.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use costwatch_agent::ChatError;
use costwatch_core::CostwatchError;

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }
}

impl From<CostwatchError> for AppError {
    fn from(err: CostwatchError) -> Self {
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            // Cause already logged at the executor; this marks the boundary.
            tracing::error!(error = %err, "request failed");
        } else if err.is_security_denial() {
            tracing::warn!(error = %err, "security-relevant denial");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        let status = match err {
            ChatError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            ChatError::Llm(_) | ChatError::Malformed(_) => StatusCode::BAD_GATEWAY,
        };
        tracing::error!(error = %err, "chat pipeline failed");
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
