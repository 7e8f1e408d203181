pub mod analysis;
pub mod content;
pub mod extraction;
pub mod fetcher;
pub mod openrouter;
pub mod security;
pub mod session;
