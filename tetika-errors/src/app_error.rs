use crate::FetchError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {id} cannot move from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error("Too many requests: {0}")]
    RateLimited(String),

    #[error("Daily AI budget exhausted: {0}")]
    BudgetExceeded(String),

    #[error("AI advisor is not configured")]
    AiUnavailable,

    #[error("Failed to reach AI gateway: {0}")]
    OpenRouterError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn user_message(&self) -> &str {
        match self {
            Self::InvalidUrl(_) => "The URL you entered is not valid.",
            Self::UnsupportedScheme(_) => "Only http and https URLs can be scraped.",
            Self::Fetch(e) => e.user_message(),
            Self::InvalidRequest(_) => "The request body is not valid.",
            Self::SessionNotFound(_) => "This scraping session does not exist or has expired.",
            Self::InvalidTransition { .. } => "The session is not in a state that allows this action.",
            Self::RateLimited(msg) => msg,
            Self::BudgetExceeded(msg) => msg,
            Self::AiUnavailable => "The AI advisor is not available on this server.",
            Self::OpenRouterError(_) => "The AI advisor is busy. Try again later.",
            Self::Internal(_) => "Something went wrong on the server. Try again later.",
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::UnsupportedScheme(_) => "unsupported_scheme",
            Self::Fetch(e) => e.code(),
            Self::InvalidRequest(_) => "invalid_request",
            Self::SessionNotFound(_) => "session_not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::RateLimited(_) => "too_many_requests",
            Self::BudgetExceeded(_) => "budget_exceeded",
            Self::AiUnavailable => "ai_unavailable",
            Self::OpenRouterError(_) => "ai_error",
            Self::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidUrl(_) | Self::UnsupportedScheme(_) | Self::InvalidRequest(_) => 400,
            Self::Fetch(e) if e.is_validation() => 400,
            Self::Fetch(_) => 500,
            Self::SessionNotFound(_) => 404,
            Self::InvalidTransition { .. } => 409,
            Self::RateLimited(_) | Self::BudgetExceeded(_) => 429,
            Self::AiUnavailable => 503,
            Self::OpenRouterError(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    pub fn to_body(&self, url: Option<&str>, include_details: bool) -> ErrorBody {
        ErrorBody {
            error: self.error_code().to_string(),
            message: self.user_message().to_string(),
            url: url.map(str::to_string),
            details: include_details.then(|| self.to_string()),
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(feature = "axum")]
mod axum_impl {
    use super::AppError;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;

    impl AppError {
        pub fn into_response_with(self, url: Option<&str>, include_details: bool) -> Response {
            let status =
                StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(self.to_body(url, include_details))).into_response()
        }
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            self.into_response_with(None, false)
        }
    }
}
