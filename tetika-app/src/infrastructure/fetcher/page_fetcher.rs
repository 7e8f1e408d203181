use crate::infrastructure::security::is_private_host;
use reqwest::redirect::Policy;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tetika_errors::FetchError;
use url::Url;

const PRIVATE_REDIRECT: &str = "redirect to a private address blocked";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
];

const DNS_FAILURE_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
    "no address associated",
];

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub max_body_bytes: usize,
    /// Return pages with a 4xx/5xx final status instead of failing.
    pub allow_error_status: bool,
    /// Follow redirects into loopback and private networks. The requested
    /// URL itself is checked by the input sanitizer, not here.
    pub allow_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 5,
            max_body_bytes: 5 * 1024 * 1024,
            allow_error_status: false,
            allow_private_hosts: false,
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_private_hosts(mut self, allow: bool) -> Self {
        self.allow_private_hosts = allow;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    pub final_url: String,
    pub status_code: u16,
    pub truncated: bool,
}

pub struct PageFetcher {
    http_client: reqwest::Client,
    config: FetchConfig,
}

impl PageFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .redirect(redirect_policy(config.max_redirects, config.allow_private_hosts))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::Unknown(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed_url = parse_target(url)?;

        let mut response = self
            .http_client
            .get(parsed_url.as_str())
            .header("User-Agent", pick_user_agent())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9,fr;q=0.8")
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("DNT", "1")
            .header("Connection", "keep-alive")
            .header("Upgrade-Insecure-Requests", "1")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Cache-Control", "max-age=0")
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let redirected = response.url() != &parsed_url;
        if redirected && !self.config.allow_private_hosts && is_private_url(response.url()) {
            tracing::warn!("Fetching {} ended on private address {}", parsed_url, final_url);
            return Err(FetchError::InvalidUrl(PRIVATE_REDIRECT.to_string()));
        }

        if let Some(error) = FetchError::from_status(status) {
            if !self.config.allow_error_status {
                tracing::warn!("Fetching {} ended with HTTP {}", final_url, status);
                return Err(error);
            }
        }

        let limit = self.config.max_body_bytes;
        let mut body: Vec<u8> = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| classify_transport_error(&e))?
        {
            let room = limit - body.len();
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }
        let html = decode_body(&body, truncated);

        tracing::info!(
            "Fetched {} ({} bytes, HTTP {}){}",
            final_url,
            html.len(),
            status,
            if truncated { " [truncated]" } else { "" }
        );

        Ok(FetchedPage {
            html,
            final_url,
            status_code: status,
            truncated,
        })
    }
}

pub fn parse_target(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(FetchError::UnsupportedScheme(other.to_string())),
    }

    if parsed.host_str().is_none() {
        return Err(FetchError::InvalidUrl("URL has no host".to_string()));
    }

    Ok(parsed)
}

fn is_private_url(url: &Url) -> bool {
    url.host().is_some_and(|host| is_private_host(&host))
}

// Same hop limit as `Policy::limited`, plus the private-address check on
// every hop when private hosts are not allowed.
fn redirect_policy(max_redirects: usize, allow_private_hosts: bool) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            attempt.error("too many redirects")
        } else if !allow_private_hosts && is_private_url(attempt.url()) {
            tracing::warn!("Refusing redirect to {}", attempt.url());
            attempt.error(PRIVATE_REDIRECT)
        } else {
            attempt.follow()
        }
    })
}

// A body cut at the size limit may end inside a multi-byte character; that
// partial tail is dropped rather than decoded as U+FFFD.
fn decode_body(bytes: &[u8], truncated: bool) -> String {
    let end = match std::str::from_utf8(bytes) {
        Err(e) if truncated && e.error_len().is_none() => e.valid_up_to(),
        _ => bytes.len(),
    };
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn pick_user_agent() -> &'static str {
    let index = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        % USER_AGENTS.len() as u64;
    USER_AGENTS[index as usize]
}

fn classify_transport_error(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::Timeout;
    }

    let chain = error_chain(error).to_lowercase();

    if error.is_redirect() {
        if chain.contains(PRIVATE_REDIRECT) {
            return FetchError::InvalidUrl(PRIVATE_REDIRECT.to_string());
        }
        return FetchError::Unknown("too many redirects".to_string());
    }

    if DNS_FAILURE_MARKERS.iter().any(|marker| chain.contains(marker)) {
        return FetchError::NotFound;
    }

    if error.is_connect() {
        return FetchError::Unknown(format!("connection failed: {}", chain));
    }

    FetchError::Unknown(chain)
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}
