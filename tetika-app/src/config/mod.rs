mod heuristics;

pub use heuristics::{
    AnalyzerConfig, ContentConfig, ExtractorConfig, HeuristicsConfig, HeuristicsError, LinkConfig,
    SeedEntry, TagRule,
};

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_OPENROUTER_MODEL: &str = "deepseek/deepseek-chat";

/// Process configuration, read from the environment (after `.env` has been
/// loaded by the binary).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub scrape_timeout: Duration,
    pub session_timeout: Duration,
    pub session_max_age_hours: u64,
    pub cleanup_interval: Duration,
    pub settle_delay: Duration,
    pub allow_private_hosts: bool,
    pub development: bool,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub ai_daily_request_limit: u32,
    pub heuristics_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            scrape_timeout: Duration::from_secs(30),
            session_timeout: Duration::from_secs(60),
            session_max_age_hours: 24,
            cleanup_interval: Duration::from_secs(3600),
            settle_delay: Duration::from_millis(500),
            allow_private_hosts: false,
            development: false,
            openrouter_api_key: None,
            openrouter_model: DEFAULT_OPENROUTER_MODEL.to_string(),
            ai_daily_request_limit: 100,
            heuristics_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            scrape_timeout: Duration::from_secs(env_or(
                "SCRAPE_TIMEOUT_SECS",
                defaults.scrape_timeout.as_secs(),
            )),
            session_timeout: Duration::from_secs(env_or(
                "SESSION_TIMEOUT_SECS",
                defaults.session_timeout.as_secs(),
            )),
            session_max_age_hours: env_or("SESSION_MAX_AGE_HOURS", defaults.session_max_age_hours),
            cleanup_interval: Duration::from_secs(env_or(
                "SESSION_CLEANUP_INTERVAL_SECS",
                defaults.cleanup_interval.as_secs(),
            )),
            settle_delay: Duration::from_millis(env_or(
                "SETTLE_DELAY_MS",
                defaults.settle_delay.as_millis() as u64,
            )),
            allow_private_hosts: env_or("ALLOW_PRIVATE_HOSTS", defaults.allow_private_hosts),
            development: std::env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("development"))
                .unwrap_or(false),
            openrouter_api_key: std::env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            openrouter_model: std::env::var("OPENROUTER_MODEL").unwrap_or(defaults.openrouter_model),
            ai_daily_request_limit: env_or("AI_DAILY_REQUEST_LIMIT", defaults.ai_daily_request_limit),
            heuristics_path: std::env::var("HEURISTICS_CONFIG").ok().map(PathBuf::from),
        }
    }

    /// Loads the heuristics file if one is configured. A broken file is
    /// logged and replaced by the defaults.
    pub fn load_heuristics(&self) -> HeuristicsConfig {
        match &self.heuristics_path {
            Some(path) => match HeuristicsConfig::from_json_file(path) {
                Ok(config) => {
                    tracing::info!("Loaded heuristics from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("{}, using default heuristics", e);
                    HeuristicsConfig::default()
                }
            },
            None => HeuristicsConfig::default(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
