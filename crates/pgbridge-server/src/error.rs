//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pgbridge::BridgeError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body that is not valid JSON or does not match the request shape.
    #[error("Invalid request body: {0}")]
    Body(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::Bridge(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Bridge(BridgeError::Query(_)) => StatusCode::BAD_REQUEST,
            ApiError::Bridge(e) if e.is_constraint_violation() => StatusCode::CONFLICT,
            ApiError::Bridge(BridgeError::Pool(_) | BridgeError::Connection(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Bridge(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        ApiError::Bridge(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorResponse {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
