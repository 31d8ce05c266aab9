// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`MembridgeError`] to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use membridge_core::MembridgeError;
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error wrapper so `?` works inside handlers.
#[derive(Debug)]
pub struct ApiError(pub MembridgeError);

impl From<MembridgeError> for ApiError {
    fn from(e: MembridgeError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MembridgeError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MembridgeError::NotFound { .. } => StatusCode::NOT_FOUND,
            e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = %status, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn status_mapping() {
        let cases = [
            (MembridgeError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (MembridgeError::NotFound { id: "a".into() }, StatusCode::NOT_FOUND),
            (MembridgeError::transport("down", None), StatusCode::SERVICE_UNAVAILABLE),
            (
                MembridgeError::Timeout { duration: Duration::from_secs(1) },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (MembridgeError::Internal("bug".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (MembridgeError::Config("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }
}
