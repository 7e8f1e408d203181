use serde::{Deserialize, Serialize};

/// Why a page could not be retrieved. Callers branch on the variant, never
/// on raw status codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Host could not be resolved")]
    NotFound,

    #[error("Request timed out")]
    Timeout,

    #[error("Access forbidden (403)")]
    Forbidden,

    #[error("Page not found (404)")]
    PageNotFound,

    #[error("Rate limited by the remote site (429)")]
    RateLimited,

    #[error("Remote server error ({0})")]
    ServerError(u16),

    #[error("Fetch failed: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            0..=399 => None,
            403 => Some(Self::Forbidden),
            404 => Some(Self::PageNotFound),
            429 => Some(Self::RateLimited),
            500..=599 => Some(Self::ServerError(status)),
            other => Some(Self::Unknown(format!("HTTP {}", other))),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "The URL is not valid.",
            Self::UnsupportedScheme(_) => "Only http and https URLs can be scraped.",
            Self::NotFound => "The website could not be found. Check the domain name.",
            Self::Timeout => "The website took too long to respond.",
            Self::Forbidden => "The website refused access to this page.",
            Self::PageNotFound => "The page does not exist on this website.",
            Self::RateLimited => "The website is rate limiting requests. Wait before retrying.",
            Self::ServerError(_) => "The website is experiencing server problems.",
            Self::Unknown(_) => "The website could not be scraped.",
        }
    }

    /// Transport failures and 5xx may be retried by the caller; 4xx may not,
    /// except 429 after backing off.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotFound | Self::Timeout | Self::RateLimited | Self::ServerError(_) => true,
            Self::Unknown(detail) => !detail.starts_with("HTTP "),
            Self::InvalidUrl(_) | Self::UnsupportedScheme(_) | Self::Forbidden | Self::PageNotFound => {
                false
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidUrl(_) | Self::UnsupportedScheme(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::UnsupportedScheme(_) => "unsupported_scheme",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::Forbidden => "forbidden",
            Self::PageNotFound => "page_not_found",
            Self::RateLimited => "rate_limited",
            Self::ServerError(_) => "server_error",
            Self::Unknown(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(FetchError::from_status(200), None);
        assert_eq!(FetchError::from_status(301), None);
        assert_eq!(FetchError::from_status(403), Some(FetchError::Forbidden));
        assert_eq!(FetchError::from_status(404), Some(FetchError::PageNotFound));
        assert_eq!(FetchError::from_status(429), Some(FetchError::RateLimited));
        assert_eq!(FetchError::from_status(503), Some(FetchError::ServerError(503)));
        assert_eq!(
            FetchError::from_status(410),
            Some(FetchError::Unknown("HTTP 410".to_string()))
        );
    }

    #[test]
    fn test_retry_policy() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::NotFound.is_retryable());
        assert!(FetchError::RateLimited.is_retryable());
        assert!(FetchError::ServerError(502).is_retryable());
        assert!(!FetchError::Forbidden.is_retryable());
        assert!(!FetchError::PageNotFound.is_retryable());
        assert!(!FetchError::Unknown("HTTP 410".to_string()).is_retryable());
        assert!(FetchError::Unknown("connection refused".to_string()).is_retryable());
    }

    #[test]
    fn test_messages_are_distinct() {
        let all = [
            FetchError::NotFound,
            FetchError::Timeout,
            FetchError::Forbidden,
            FetchError::PageNotFound,
            FetchError::RateLimited,
            FetchError::ServerError(500),
            FetchError::Unknown(String::new()),
        ];
        let mut messages: Vec<_> = all.iter().map(|e| e.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), all.len());
    }
}
