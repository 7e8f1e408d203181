use serde::{Deserialize, Serialize};

/// Structural summary of one loaded page. Derived, never mutated after
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub total_elements: usize,
    pub total_links: usize,
    pub has_company_indicators: bool,
    pub has_list_structure: bool,
    pub has_pagination: bool,
    pub anti_bot_detection: bool,
    pub loading_indicators: bool,
    pub estimated_company_count: usize,
    pub recommended_next_steps: Vec<String>,
}
