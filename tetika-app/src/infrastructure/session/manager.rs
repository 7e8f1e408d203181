use super::store::{MemorySessionStore, SessionStore};
use crate::domain::{
    CreateSessionOptions, NewExtractionStep, ScrapingSession, SessionStatus, SessionStatusView,
    SessionUpdate,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tetika_errors::AppError;

const SESSION_ID_SUFFIX_CHARS: usize = 9;

/// Owns the lifecycle of scraping sessions. Missing sessions are logged and
/// reported with a sentinel value, never as a panic.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub fn create_session(&self, url: &str, options: CreateSessionOptions) -> ScrapingSession {
        loop {
            let session = ScrapingSession::new(generate_session_id(), url.to_string(), options.clone());
            if self.store.insert(session.clone()) {
                tracing::info!("Created scraping session {} for {}", session.id, url);
                return session;
            }
        }
    }

    pub fn get_session(&self, id: &str) -> Option<ScrapingSession> {
        self.store.get(id)
    }

    /// Applies the provided fields and refreshes `last_updated`. Unknown ids
    /// and disallowed status changes leave the table untouched.
    pub fn update_session(&self, id: &str, update: SessionUpdate) -> Option<ScrapingSession> {
        match self.try_update_session(id, update) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Session update ignored: {}", e);
                None
            }
        }
    }

    pub fn try_update_session(
        &self,
        id: &str,
        update: SessionUpdate,
    ) -> Result<ScrapingSession, AppError> {
        let mut update = update;
        let mut outcome = None;

        let found = self.store.modify(id, &mut |session: &mut ScrapingSession| {
            if let Some(next) = update.status {
                if !session.status.can_transition_to(next) {
                    outcome = Some(Err(AppError::InvalidTransition {
                        id: session.id.clone(),
                        from: session.status.to_string(),
                        to: next.to_string(),
                    }));
                    return;
                }
                session.status = next;
                if next != SessionStatus::Error {
                    session.last_error = None;
                }
            }
            if let Some(error) = update.last_error.take() {
                session.last_error = Some(error);
            }
            if let Some(page) = update.current_page.take() {
                session.current_page = Some(page);
            }
            if let Some(instructions) = update.instructions.take() {
                session.instructions = Some(instructions);
            }
            if let Some(mode) = update.extraction_mode {
                session.extraction_mode = mode;
            }
            if let Some(max_results) = update.max_results {
                session.max_results = max_results;
            }
            session.last_updated = Utc::now();
            outcome = Some(Ok(session.clone()));
        });

        if !found {
            return Err(AppError::SessionNotFound(id.to_string()));
        }
        outcome.unwrap_or_else(|| Err(AppError::Internal(format!("session {} was not updated", id))))
    }

    /// Appends a step numbered `len + 1` and returns that number. Numbering
    /// happens under the store's per-session lock, so concurrent appends
    /// never share a number.
    pub fn record_step(&self, id: &str, step: NewExtractionStep) -> Option<usize> {
        let mut step = Some(step);
        let mut assigned = None;

        let found = self.store.modify(id, &mut |session: &mut ScrapingSession| {
            if let Some(step) = step.take() {
                let now = Utc::now();
                let number = session.extraction_history.len() + 1;
                session.extraction_history.push(step.into_step(number, now));
                session.last_updated = now;
                assigned = Some(number);
            }
        });

        if !found {
            tracing::warn!("Cannot add extraction step: session {} not found", id);
        }
        assigned
    }

    pub fn add_extraction_step(&self, id: &str, step: NewExtractionStep) -> bool {
        self.record_step(id, step).is_some()
    }

    pub fn delete_session(&self, id: &str) -> bool {
        let removed = self.store.remove(id).is_some();
        if removed {
            tracing::info!("Deleted scraping session {}", id);
        } else {
            tracing::warn!("Cannot delete session {}: not found", id);
        }
        removed
    }

    /// Every stored session, oldest first.
    pub fn get_all_active_sessions(&self) -> Vec<ScrapingSession> {
        let mut sessions = self.store.list();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }

    /// Removes sessions whose `last_updated` is older than `max_age_hours`.
    pub fn cleanup_old_sessions(&self, max_age_hours: u64) -> usize {
        let hours = i64::try_from(max_age_hours).unwrap_or(i64::MAX);
        let cutoff = Duration::try_hours(hours)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

        let removed = self
            .store
            .retain(&mut |session: &ScrapingSession| session.last_updated >= cutoff);
        if removed > 0 {
            tracing::info!("Cleaned up {} old scraping sessions", removed);
        }
        removed
    }

    pub fn get_session_status(&self, id: &str) -> SessionStatusView {
        match self.store.get(id) {
            Some(session) => SessionStatusView::from(&session),
            None => SessionStatusView::missing(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.store.len()
    }
}

fn generate_session_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "session_{}_{}",
        Utc::now().timestamp_millis(),
        &suffix[..SESSION_ID_SUFFIX_CHARS]
    )
}
