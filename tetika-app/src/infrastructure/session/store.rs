use crate::domain::ScrapingSession;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Backing table for scraping sessions. Implementations must apply
/// `modify` closures while holding exclusive access to that one session.
pub trait SessionStore: Send + Sync {
    /// Adds the session unless its id is already taken.
    fn insert(&self, session: ScrapingSession) -> bool;

    fn get(&self, id: &str) -> Option<ScrapingSession>;

    /// Runs `apply` on the stored session. Returns false when the id is
    /// unknown.
    fn modify(&self, id: &str, apply: &mut dyn FnMut(&mut ScrapingSession)) -> bool;

    fn remove(&self, id: &str) -> Option<ScrapingSession>;

    fn list(&self) -> Vec<ScrapingSession>;

    /// Drops every session for which `keep` is false and returns how many
    /// were dropped.
    fn retain(&self, keep: &mut dyn FnMut(&ScrapingSession) -> bool) -> usize;

    fn contains(&self, id: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, ScrapingSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: ScrapingSession) -> bool {
        match self.sessions.entry(session.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(session);
                true
            }
        }
    }

    fn get(&self, id: &str) -> Option<ScrapingSession> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    fn modify(&self, id: &str, apply: &mut dyn FnMut(&mut ScrapingSession)) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut entry) => {
                apply(entry.value_mut());
                true
            }
            None => false,
        }
    }

    fn remove(&self, id: &str) -> Option<ScrapingSession> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    fn list(&self) -> Vec<ScrapingSession> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }

    fn retain(&self, keep: &mut dyn FnMut(&ScrapingSession) -> bool) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let kept = keep(session);
            if !kept {
                removed += 1;
            }
            kept
        });
        removed
    }

    fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    fn clear(&self) {
        self.sessions.clear();
    }
}
