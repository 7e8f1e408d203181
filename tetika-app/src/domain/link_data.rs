use serde::{Deserialize, Serialize};

pub const MAX_LINK_TEXT_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Company,
    Detail,
    Navigation,
    External,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkData {
    pub url: String,
    pub text: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub priority: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl LinkData {
    pub fn new(url: String, text: &str, link_type: LinkType, priority: u8) -> Self {
        Self {
            url,
            text: text.chars().take(MAX_LINK_TEXT_CHARS).collect(),
            link_type,
            priority,
            description: None,
            metadata: None,
        }
    }
}
