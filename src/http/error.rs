//! API Error Envelope
//!
//! Every failing request is rendered as `{"error":{"code","message"}}`.
//! Rate-limited responses additionally carry a `retryAfter` field and the
//! `Retry-After`, `X-RateLimit-Remaining`, and `X-RateLimit-Reset` headers,
//! the last as epoch milliseconds.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::gate::GateError;
use crate::rate_limit::RateLimitDecision;
use crate::validate::ValidationError;

/// A request failure with its wire representation
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    rate_limit: Option<RateLimitDecision>,
}

impl ApiError {
    /// Create an error with an explicit status, code, and message
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            rate_limit: None,
        }
    }

    /// 401 with the uniform message. Missing, malformed, and unknown
    /// credentials all read identically to the caller.
    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Invalid or missing API key",
        )
    }

    /// 429 carrying the denying window's advice
    pub fn rate_limited(decision: RateLimitDecision) -> Self {
        let mut error = Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Too many requests. Please wait before trying again.",
        );
        error.rate_limit = Some(decision);
        error
    }

    /// 400 for a body that is not valid JSON
    pub fn invalid_body() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_BODY", "Invalid JSON body")
    }

    /// 409 for a registration against an existing name
    pub fn name_taken() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "NAME_TAKEN",
            "An agent with this name already exists",
        )
    }

    /// 404 for an unknown room name
    pub fn room_not_found(name: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "ROOM_NOT_FOUND",
            format!("Room '{name}' not found"),
        )
    }

    /// 500 with a caller-chosen message
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    /// Log a failure and hide it behind a generic 500
    pub fn unexpected<E: std::fmt::Display>(err: E) -> Self {
        tracing::error!(error = %err, "request failed");
        Self::internal("An unexpected error occurred")
    }

    /// Status this error renders with
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.code(), err.to_string())
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Unauthorized => Self::unauthorized(),
            GateError::RateLimited(decision) => Self::rate_limited(decision),
            GateError::Store(err) => Self::unexpected(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut payload = json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });

        if let Some(decision) = &self.rate_limit {
            if let Some(retry_after) = decision.retry_after_secs {
                payload["error"]["retryAfter"] = json!(retry_after);
            }
        }

        let mut response = (self.status, Json(payload)).into_response();

        if let Some(decision) = self.rate_limit {
            let headers = response.headers_mut();
            headers.insert(
                header::RETRY_AFTER,
                HeaderValue::from(decision.retry_after_secs.unwrap_or(10)),
            );
            headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
            headers.insert("x-ratelimit-reset", HeaderValue::from(decision.resets_at_ms));
        }

        response
    }
}
