//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relaybot_core::error::{ChannelError, Error};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// An error rendered as `{"error": code, "message": text}`.
#[derive(Debug)]
pub struct GatewayError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl GatewayError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_payload", message)
    }

    pub fn rate_limited() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "Too many requests, slow down",
        )
    }
}

impl From<Error> for GatewayError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::Channel(ChannelError::InvalidPayload(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_payload")
            }
            Error::Channel(ChannelError::Unauthorized { .. }) => {
                (StatusCode::FORBIDDEN, "unauthorized")
            }
            Error::Channel(ChannelError::InvalidSignature(_)) => {
                (StatusCode::FORBIDDEN, "invalid_signature")
            }
            Error::Channel(ChannelError::Disabled(_)) => (StatusCode::FORBIDDEN, "channel_disabled"),
            Error::Channel(ChannelError::Speech(_)) | Error::Speech(_) => {
                (StatusCode::BAD_GATEWAY, "speech_error")
            }
            Error::Provider(_) => (StatusCode::BAD_GATEWAY, "provider_error"),
            Error::Query(_) => (StatusCode::INTERNAL_SERVER_ERROR, "query_error"),
            Error::Memory(_) => (StatusCode::INTERNAL_SERVER_ERROR, "memory_error"),
            Error::Config { .. } | Error::Serialization(_) | Error::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };
        if status.is_server_error() {
            error!(error = %err, code, "Request failed");
        }
        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.code,
                message: self.message,
            }),
        )
            .into_response()
    }
}
