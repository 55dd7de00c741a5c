//! Session persistence across application runs

mod session;

use log::warn;
use std::sync::Arc;

use crate::error::Result;
use crate::storage::Storage;

pub use session::*;

/// Storage key holding the serialized session
pub const AUTH_KEY: &str = "auth";

/// Persists the session under a fixed key
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Persist the session
    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.storage.set(AUTH_KEY, &json)
    }

    /// Load the persisted session.
    ///
    /// Missing, unreadable or malformed data yields `None`.
    pub fn load(&self) -> Option<Session> {
        let raw = match self.storage.get(AUTH_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read persisted session: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Option<Session>>(&raw) {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding malformed persisted session: {}", e);
                None
            }
        }
    }

    /// Token of the persisted session, if any
    pub fn token(&self) -> Option<String> {
        self.load().filter(Session::has_token).map(|s| s.token)
    }

    /// Remove the persisted session
    pub fn clear(&self) -> Result<()> {
        self.storage.remove(AUTH_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> (Arc<MemoryStorage>, TokenStore) {
        let storage = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::new(storage.clone());
        (storage, tokens)
    }

    #[test]
    fn save_then_load() {
        let (_, tokens) = store();
        let mut session = Session::new("abc");
        session.display_name = Some("Jane".to_string());
        tokens.save(&session).unwrap();

        assert_eq!(tokens.load(), Some(session));
        assert_eq!(tokens.token().as_deref(), Some("abc"));
    }

    #[test]
    fn malformed_data_loads_as_none() {
        let (storage, tokens) = store();
        storage.set(AUTH_KEY, "{not json").unwrap();
        assert_eq!(tokens.load(), None);

        storage.set(AUTH_KEY, "null").unwrap();
        assert_eq!(tokens.load(), None);
    }

    #[test]
    fn clear_removes_session() {
        let (_, tokens) = store();
        tokens.save(&Session::new("abc")).unwrap();
        tokens.clear().unwrap();
        assert_eq!(tokens.load(), None);
        assert_eq!(tokens.token(), None);
    }
}
