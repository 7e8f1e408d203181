use std::net::{Ipv4Addr, Ipv6Addr};
use tetika_errors::AppError;
use url::{Host, Url};

const MAX_URL_LENGTH: usize = 2048;
const MAX_INSTRUCTIONS_CHARS: usize = 1000;
const BLOCKED_KEYWORDS: &[&str] = &[
    "ignore previous",
    "ignore all",
    "disregard",
    "forget your",
    "new instructions",
    "system prompt",
    "you are now",
    "pretend to be",
    "jailbreak",
    "dan mode",
    "developer mode",
];

const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSanitizer {
    allow_private_hosts: bool,
}

impl InputSanitizer {
    pub fn new(allow_private_hosts: bool) -> Self {
        Self {
            allow_private_hosts,
        }
    }

    /// Checks a user-supplied target URL before any network work happens.
    pub fn validate_url(&self, url: &str) -> Result<String, AppError> {
        let url = url.trim();

        if url.is_empty() {
            return Err(AppError::InvalidUrl("URL must not be empty".to_string()));
        }

        if url.len() > MAX_URL_LENGTH {
            return Err(AppError::InvalidUrl("URL is too long".to_string()));
        }

        if contains_injection_attempt(url) {
            tracing::warn!("Potential prompt injection detected in URL: {}", url);
            return Err(AppError::InvalidUrl("URL contains invalid content".to_string()));
        }

        let parsed = Url::parse(url).map_err(|e| AppError::InvalidUrl(e.to_string()))?;

        let scheme = parsed.scheme().to_lowercase();
        if !ALLOWED_SCHEMES.contains(&scheme.as_str()) {
            return Err(AppError::UnsupportedScheme(scheme));
        }

        let Some(host) = parsed.host() else {
            return Err(AppError::InvalidUrl("URL must have a host".to_string()));
        };

        if !self.allow_private_hosts && is_private_host(&host) {
            return Err(AppError::InvalidUrl("Local and private addresses are not allowed".to_string()));
        }

        Ok(parsed.to_string())
    }

    /// Free-text operator instructions: control characters removed, prompt
    /// injection phrases masked, length capped.
    pub fn sanitize_instructions(&self, instructions: &str) -> String {
        let mut sanitized = instructions.to_string();

        for keyword in BLOCKED_KEYWORDS {
            if let Ok(re) = regex_lite::Regex::new(&format!("(?i){}", regex_lite::escape(keyword))) {
                sanitized = re.replace_all(&sanitized, "[FILTERED]").to_string();
            }
        }

        sanitized
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .take(MAX_INSTRUCTIONS_CHARS)
            .collect::<String>()
            .trim()
            .to_string()
    }
}

fn contains_injection_attempt(input: &str) -> bool {
    let lower = input.to_lowercase();
    BLOCKED_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Loopback, private-range, link-local and `.local` hosts.
pub fn is_private_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.to_lowercase();
            domain == "localhost" || domain.ends_with(".localhost") || domain.ends_with(".local")
        }
        Host::Ipv4(ip) => is_private_ipv4(ip),
        Host::Ipv6(ip) => is_private_ipv6(ip),
    }
}

fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_private() || ip.is_loopback() || ip.is_link_local() || ip.is_unspecified()
}

fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_private_ipv4(&mapped);
    }
    ip.is_loopback() || ip.is_unspecified() || (ip.segments()[0] & 0xfe00) == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_url() {
        let sanitizer = InputSanitizer::default();
        assert!(sanitizer.validate_url("https://vivatechnology.com/partners").is_ok());
        assert!(sanitizer.validate_url("http://example.com/path").is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let sanitizer = InputSanitizer::default();
        assert!(sanitizer.validate_url("").is_err());
        assert!(sanitizer.validate_url("not-a-url").is_err());
        assert!(sanitizer.validate_url("http://localhost").is_err());
        assert!(sanitizer.validate_url("http://10.0.0.8/admin").is_err());
        assert!(sanitizer.validate_url("http://[::1]:8080/").is_err());
        assert!(matches!(
            sanitizer.validate_url("ftp://example.com"),
            Err(AppError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_private_hosts_can_be_allowed() {
        let sanitizer = InputSanitizer::new(true);
        assert!(sanitizer.validate_url("http://127.0.0.1:4000/fixture").is_ok());
    }

    #[test]
    fn test_injection_detection() {
        let sanitizer = InputSanitizer::default();
        assert!(sanitizer.validate_url("https://example.com/ignore previous").is_err());
        assert!(sanitizer.validate_url("https://example.com?q=system prompt").is_err());
    }

    #[test]
    fn test_sanitize_instructions() {
        let sanitizer = InputSanitizer::default();
        let cleaned = sanitizer.sanitize_instructions("  focus on pharma\u{0007}. Ignore previous rules  ");
        assert_eq!(cleaned, "focus on pharma. [FILTERED] rules");
        assert_eq!(sanitizer.sanitize_instructions(&"x".repeat(5000)).len(), 1000);
    }
}
