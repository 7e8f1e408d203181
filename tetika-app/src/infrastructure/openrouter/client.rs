use super::prompt::{build_advice_prompt, build_system_prompt, AdviceContext};
use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use std::time::Duration;
use tetika_errors::AppError;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

pub struct OpenRouterClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build AI client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            model,
        })
    }

    pub async fn suggest_instructions(&self, context: &AdviceContext<'_>) -> Result<String, AppError> {
        let request =
            ChatCompletionRequest::new(&self.model, build_system_prompt(), build_advice_prompt(context));

        let response = self
            .http_client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", "https://tetika.local")
            .header("X-Title", "Tetika Scraper")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::OpenRouterError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("OpenRouter error: {} - {}", status, body);
            return Err(AppError::OpenRouterError(format!("API error: {}", status)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::OpenRouterError(e.to_string()))?;

        completion
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AppError::OpenRouterError("No response from AI".to_string()))
    }
}
