mod manager;
mod store;

pub use manager::SessionManager;
pub use store::{MemorySessionStore, SessionStore};
