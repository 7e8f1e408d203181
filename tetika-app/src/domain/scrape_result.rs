use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedLink {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedImage {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
    pub final_url: String,
    pub status_code: u16,
    pub content_length: usize,
    pub truncated: bool,
    pub scraped_at: Option<DateTime<Utc>>,
}

/// Output of a one-shot scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub url: String,
    pub title: String,
    pub content: String,
    pub links: Vec<ScrapedLink>,
    pub images: Vec<ScrapedImage>,
    pub metadata: PageMetadata,
}
