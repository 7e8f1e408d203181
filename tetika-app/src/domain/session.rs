use super::{CompanyData, ExtractionStep, LinkData, PageAnalysis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MAX_RESULTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initialized,
    Analyzing,
    Paused,
    AwaitingInstructions,
    Continuing,
    Completed,
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Analyzing => "analyzing",
            Self::Paused => "paused",
            Self::AwaitingInstructions => "awaiting_instructions",
            Self::Continuing => "continuing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;

        if *self == next {
            return true;
        }

        match self {
            Initialized => matches!(next, Analyzing | Error),
            Analyzing => matches!(next, Paused | AwaitingInstructions | Error),
            Paused => matches!(next, Continuing | AwaitingInstructions | Analyzing | Error),
            AwaitingInstructions => matches!(next, Continuing | Analyzing | Paused | Error),
            Continuing => matches!(next, Completed | AwaitingInstructions | Paused | Error),
            Completed => matches!(next, Continuing | Analyzing),
            Error => matches!(next, Analyzing | Continuing),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    #[default]
    Surface,
    Deep,
    Hybrid,
}

/// The last analyzed page of a session. Replaced wholesale on re-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub links: Vec<LinkData>,
    pub companies: Vec<CompanyData>,
    pub analysis: PageAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingSession {
    pub id: String,
    pub url: String,
    pub status: SessionStatus,
    pub current_page: Option<PageSnapshot>,
    pub extraction_history: Vec<ExtractionStep>,
    pub instructions: Option<String>,
    /// Most recent failure; cleared when the session leaves the error state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub extraction_mode: ExtractionMode,
    pub max_results: usize,
}

impl ScrapingSession {
    pub fn new(id: String, url: String, options: CreateSessionOptions) -> Self {
        let now = Utc::now();
        Self {
            id,
            url,
            status: SessionStatus::Initialized,
            current_page: None,
            extraction_history: Vec::new(),
            instructions: options.instructions,
            last_error: None,
            created_at: now,
            last_updated: now,
            extraction_mode: options.extraction_mode,
            max_results: options.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        }
    }

    pub fn total_companies_found(&self) -> usize {
        self.extraction_history
            .iter()
            .map(|step| step.result.companies_found)
            .sum()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionOptions {
    #[serde(default)]
    pub extraction_mode: ExtractionMode,
    pub max_results: Option<usize>,
    pub instructions: Option<String>,
}

/// Fields a caller may change on an existing session. `None` leaves the
/// field as it is.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub status: Option<SessionStatus>,
    pub current_page: Option<PageSnapshot>,
    pub instructions: Option<String>,
    pub extraction_mode: Option<ExtractionMode>,
    pub max_results: Option<usize>,
    pub last_error: Option<String>,
}

impl SessionUpdate {
    pub fn status(status: SessionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_current_page(mut self, page: PageSnapshot) -> Self {
        self.current_page = Some(page);
        self
    }

    pub fn with_instructions(mut self, instructions: String) -> Self {
        self.instructions = Some(instructions);
        self
    }

    pub fn failed(error: String) -> Self {
        Self {
            status: Some(SessionStatus::Error),
            last_error: Some(error),
            ..Default::default()
        }
    }
}

/// Lightweight projection of a session for polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusView {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_url: Option<String>,
    pub steps: usize,
    pub total_companies_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl SessionStatusView {
    pub fn missing() -> Self {
        Self {
            exists: false,
            status: None,
            current_url: None,
            steps: 0,
            total_companies_found: 0,
            last_updated: None,
        }
    }
}

impl From<&ScrapingSession> for SessionStatusView {
    fn from(session: &ScrapingSession) -> Self {
        Self {
            exists: true,
            status: Some(session.status),
            current_url: session.current_page.as_ref().map(|page| page.url.clone()),
            steps: session.extraction_history.len(),
            total_companies_found: session.total_companies_found(),
            last_updated: Some(session.last_updated),
        }
    }
}
