use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub companies_found: usize,
    pub links_found: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// One recorded extraction attempt. Never modified once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStep {
    pub step_number: usize,
    pub action: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub result: StepResult,
}

/// A step as submitted by the caller; numbering and timestamp are assigned
/// by the session manager.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExtractionStep {
    pub action: String,
    pub url: String,
    pub result: StepResult,
}

impl NewExtractionStep {
    pub fn new(action: impl Into<String>, url: impl Into<String>, result: StepResult) -> Self {
        Self {
            action: action.into(),
            url: url.into(),
            result,
        }
    }

    pub(crate) fn into_step(self, step_number: usize, timestamp: DateTime<Utc>) -> ExtractionStep {
        ExtractionStep {
            step_number,
            action: self.action,
            url: self.url,
            timestamp,
            result: self.result,
        }
    }
}
