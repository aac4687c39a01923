use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] mws_core::Error),
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn status(&self) -> StatusCode {
        use mws_core::Error;

        match self {
            Self::BadRequest(_) | Self::Engine(Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Engine(Error::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Engine(Error::NetworkUnavailable(_) | Error::Replay { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Engine(Error::InvalidTransition { .. }) => StatusCode::CONFLICT,
            Self::Engine(Error::Api { .. }) => StatusCode::BAD_GATEWAY,
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, "Request failed: {self}");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
