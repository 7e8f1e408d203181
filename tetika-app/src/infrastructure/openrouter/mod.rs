mod client;
mod prompt;
mod types;

pub use client::OpenRouterClient;
pub use prompt::{build_advice_prompt, AdviceContext};
