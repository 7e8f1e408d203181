use crate::application::{InstructionAdvisor, InteractiveScraper, ScrapePage};
use crate::config::AppConfig;
use crate::infrastructure::fetcher::{FetchConfig, PageFetcher};
use crate::infrastructure::security::{InputSanitizer, RateLimiter};
use crate::infrastructure::session::SessionManager;
use std::sync::Arc;
use tetika_errors::AppError;

/// Everything a request handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub sessions: SessionManager,
    pub scrape_page: Arc<ScrapePage>,
    pub interactive: Arc<InteractiveScraper>,
    pub rate_limiter: RateLimiter,
}

impl AppContext {
    pub fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let heuristics = config.load_heuristics();
        let sanitizer = InputSanitizer::new(config.allow_private_hosts);
        if config.allow_private_hosts {
            tracing::warn!("ALLOW_PRIVATE_HOSTS is set, private network targets are reachable");
        }

        let scrape_page = ScrapePage::new(
            PageFetcher::new(
                FetchConfig::default()
                    .with_timeout(config.scrape_timeout)
                    .with_private_hosts(config.allow_private_hosts),
            )?,
            sanitizer,
            heuristics.content.clone(),
        );

        let session_fetch = FetchConfig {
            allow_error_status: true,
            ..FetchConfig::default()
                .with_timeout(config.session_timeout)
                .with_private_hosts(config.allow_private_hosts)
        };
        let sessions = SessionManager::in_memory();
        let interactive = InteractiveScraper::new(
            sessions.clone(),
            PageFetcher::new(session_fetch)?,
            sanitizer,
            heuristics,
            InstructionAdvisor::from_config(&config)?,
        )
        .with_settle_delay(config.settle_delay);

        Ok(Self {
            config: Arc::new(config),
            sessions,
            scrape_page: Arc::new(scrape_page),
            interactive: Arc::new(interactive),
            rate_limiter: RateLimiter::new(),
        })
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::from_config(AppConfig::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CreateSessionOptions;

    #[test]
    fn test_sessions_are_shared_with_the_scraper() {
        let context = AppContext::from_config(AppConfig::default()).unwrap();
        let started = context
            .interactive
            .start("https://site.com", CreateSessionOptions::default())
            .unwrap();
        assert!(context.sessions.get_session(&started.session_id).is_some());
        assert_eq!(context.sessions.session_count(), 1);
    }
}
