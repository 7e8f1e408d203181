use crate::config::AppConfig;
use crate::infrastructure::openrouter::{AdviceContext, OpenRouterClient};
use crate::infrastructure::security::CostTracker;
use std::sync::Arc;
use tetika_errors::AppError;

/// Optional AI advisor that proposes the next instructions for a session.
/// Every call is charged against the daily budget before the request goes
/// out.
pub struct InstructionAdvisor {
    client: Option<OpenRouterClient>,
    cost_tracker: Arc<CostTracker>,
}

impl InstructionAdvisor {
    pub fn new(client: Option<OpenRouterClient>, cost_tracker: Arc<CostTracker>) -> Self {
        Self {
            client,
            cost_tracker,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, Arc::new(CostTracker::default()))
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let cost_tracker = Arc::new(CostTracker::new(config.ai_daily_request_limit));
        let client = match &config.openrouter_api_key {
            Some(key) => {
                tracing::info!("AI advisor enabled with model {}", config.openrouter_model);
                Some(OpenRouterClient::new(key.clone(), config.openrouter_model.clone())?)
            }
            None => {
                tracing::info!("OPENROUTER_API_KEY not set, AI advisor disabled");
                None
            }
        };
        Ok(Self::new(client, cost_tracker))
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    pub fn remaining_requests(&self) -> u32 {
        self.cost_tracker.remaining_requests()
    }

    pub async fn advise(&self, context: &AdviceContext<'_>) -> Result<String, AppError> {
        let client = self.client.as_ref().ok_or(AppError::AiUnavailable)?;
        self.cost_tracker.check_and_increment()?;
        client.suggest_instructions(context).await
    }
}
