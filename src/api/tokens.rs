//! Access/refresh token pair, mirrored into storage under two keys.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::storage::{self, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, Storage};

#[derive(Default)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
}

/// Thread-safe token holder shared by request tasks.
pub struct TokenStore {
    inner: Mutex<Tokens>,
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    /// Restore whatever tokens storage holds. Unreadable storage means no tokens.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let tokens = Tokens {
            access: storage::load_raw(storage.as_ref(), ACCESS_TOKEN_KEY),
            refresh: storage::load_raw(storage.as_ref(), REFRESH_TOKEN_KEY),
        };
        Self {
            inner: Mutex::new(tokens),
            storage,
        }
    }

    fn tokens(&self) -> MutexGuard<'_, Tokens> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn access(&self) -> Option<String> {
        self.tokens().access.clone()
    }

    pub fn refresh(&self) -> Option<String> {
        self.tokens().refresh.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens().access.is_some()
    }

    pub fn save(&self, access: &str, refresh: &str) {
        {
            let mut tokens = self.tokens();
            tokens.access = Some(access.to_string());
            tokens.refresh = Some(refresh.to_string());
        }
        storage::save_raw(self.storage.as_ref(), ACCESS_TOKEN_KEY, access);
        storage::save_raw(self.storage.as_ref(), REFRESH_TOKEN_KEY, refresh);
    }

    pub fn set_access(&self, access: &str) {
        self.tokens().access = Some(access.to_string());
        storage::save_raw(self.storage.as_ref(), ACCESS_TOKEN_KEY, access);
    }

    pub fn clear(&self) {
        *self.tokens() = Tokens::default();
        storage::remove_key(self.storage.as_ref(), ACCESS_TOKEN_KEY);
        storage::remove_key(self.storage.as_ref(), REFRESH_TOKEN_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::{DisabledStorage, MemoryStorage};

    #[test]
    fn test_tokens_persist_and_reload() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::load(storage.clone());
        assert!(!tokens.is_authenticated());

        tokens.save("a1", "r1");
        tokens.set_access("a2");

        let reloaded = TokenStore::load(storage);
        assert_eq!(reloaded.access().as_deref(), Some("a2"));
        assert_eq!(reloaded.refresh().as_deref(), Some("r1"));
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::load(storage.clone());
        tokens.save("a", "r");
        tokens.clear();

        assert!(!tokens.is_authenticated());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_tokens_work_in_memory_without_storage() {
        let tokens = TokenStore::load(Arc::new(DisabledStorage));
        tokens.save("a", "r");
        assert_eq!(tokens.access().as_deref(), Some("a"));
    }
}
