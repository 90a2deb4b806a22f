//! The session store: maps a [`Session`] onto two storage slots.
//!
//! The store is the only code that knows the slot names. It upholds the
//! token/role pairing on the way IN (an anonymous session removes both
//! slots, never writes `"null"`) and on the way OUT (half a pair, or a role
//! tag we don't recognize, reads as anonymous).
//!
//! # Degraded mode
//!
//! Storage can fail: a read-only disk, a corrupt file, a browser with
//! storage disabled. None of that should stop someone from using the
//! portal, so the store never returns an error. The first failure flips it
//! into degraded mode, where the session lives only in memory until the
//! process exits.

use crate::{KeyValueStorage, Role, Session};

/// Slot holding the opaque credential.
pub const TOKEN_KEY: &str = "token";

/// Slot holding the role tag.
pub const ROLE_KEY: &str = "role";

/// Reads and writes the persisted session.
pub struct SessionStore<K: KeyValueStorage> {
    storage: K,

    /// `Some` once storage has failed. Holds the in-memory session that
    /// replaces the persisted one for the rest of the process lifetime.
    fallback: Option<Session>,
}

impl<K: KeyValueStorage> SessionStore<K> {
    pub fn new(storage: K) -> Self {
        Self {
            storage,
            fallback: None,
        }
    }

    /// `true` once a storage failure has forced memory-only operation.
    pub fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }

    /// Returns the persisted session, or [`Session::Anonymous`] if nothing
    /// (or nothing coherent) is stored.
    pub fn read(&mut self) -> Session {
        if let Some(session) = &self.fallback {
            return session.clone();
        }

        let slots = self
            .storage
            .get(TOKEN_KEY)
            .and_then(|token| Ok((token, self.storage.get(ROLE_KEY)?)));

        let (token, role) = match slots {
            Ok(slots) => slots,
            Err(e) => {
                tracing::warn!(error = %e, "session storage unreadable, keeping session in memory");
                self.fallback = Some(Session::Anonymous);
                return Session::Anonymous;
            }
        };

        match (token, role) {
            (None, None) => Session::Anonymous,
            (Some(token), Some(tag)) => {
                let parsed = tag
                    .parse::<Role>()
                    .and_then(|role| Session::authenticated(token, role));
                match parsed {
                    Ok(session) => session,
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring persisted session");
                        Session::Anonymous
                    }
                }
            }
            (token, role) => {
                tracing::warn!(
                    has_token = token.is_some(),
                    has_role = role.is_some(),
                    "persisted session is missing half of its pair, ignoring"
                );
                Session::Anonymous
            }
        }
    }

    /// Persists `session`. Absent fields are removed from storage.
    pub fn write(&mut self, session: &Session) {
        if self.fallback.is_some() {
            self.fallback = Some(session.clone());
            return;
        }

        let result = match session {
            Session::Anonymous => self
                .storage
                .remove(TOKEN_KEY)
                .and_then(|()| self.storage.remove(ROLE_KEY)),
            Session::Authenticated { token, role } => self
                .storage
                .set(TOKEN_KEY, token)
                .and_then(|()| self.storage.set(ROLE_KEY, role.as_str())),
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "session storage unwritable, keeping session in memory");
            // Don't leave a mismatched pair behind for the next process.
            let _ = self.storage.remove(TOKEN_KEY);
            let _ = self.storage.remove(ROLE_KEY);
            self.fallback = Some(session.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionStore`.
    //!
    //! "Reloading" is simulated by building a second store over a clone of
    //! the same `MemoryStorage`.

    use super::*;
    use crate::{MemoryStorage, StorageError};

    // -- Helpers ----------------------------------------------------------

    /// A backend that fails every call.
    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".into()))
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".into()))
        }
        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".into()))
        }
    }

    /// Reads fine, fails on the role write only.
    #[derive(Clone, Default)]
    struct RoleWriteFails {
        inner: MemoryStorage,
    }

    impl KeyValueStorage for RoleWriteFails {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }
        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == ROLE_KEY {
                return Err(StorageError::Unavailable("quota".into()));
            }
            self.inner.set(key, value)
        }
        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn authed(token: &str, role: Role) -> Session {
        Session::authenticated(token, role).unwrap()
    }

    // =====================================================================
    // read()
    // =====================================================================

    #[test]
    fn test_read_never_written_returns_anonymous() {
        let mut store = SessionStore::new(MemoryStorage::new());
        assert_eq!(store.read(), Session::Anonymous);
        assert!(!store.is_degraded());
    }

    #[test]
    fn test_read_half_pair_returns_anonymous() {
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "orphan").unwrap();
        let mut store = SessionStore::new(storage);

        assert_eq!(store.read(), Session::Anonymous);
    }

    #[test]
    fn test_read_unknown_role_returns_anonymous() {
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "t").unwrap();
        storage.set(ROLE_KEY, "root").unwrap();
        let mut store = SessionStore::new(storage);

        assert_eq!(store.read(), Session::Anonymous);
    }

    #[test]
    fn test_read_legacy_user_role_restores_student() {
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "t").unwrap();
        storage.set(ROLE_KEY, "user").unwrap();
        let mut store = SessionStore::new(storage);

        assert_eq!(store.read(), authed("t", Role::Student));
    }

    // =====================================================================
    // write()
    // =====================================================================

    #[test]
    fn test_write_then_read_round_trips_every_role() {
        for role in Role::ALL {
            let storage = MemoryStorage::new();
            let mut store = SessionStore::new(storage.clone());
            let session = authed("tok", role);

            store.write(&session);

            assert_eq!(store.read(), session);
            // A fresh store over the same storage sees it too (reload).
            assert_eq!(SessionStore::new(storage).read(), session);
        }
    }

    #[test]
    fn test_write_anonymous_removes_slots_instead_of_storing_null() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::new(storage.clone());
        store.write(&authed("t1", Role::Admin));

        store.write(&Session::Anonymous);

        assert!(storage.is_empty(), "both slots should be removed");
        assert_eq!(store.read(), Session::Anonymous);
    }

    #[test]
    fn test_write_stores_canonical_role_tag() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::new(storage.clone());

        store.write(&authed("t", Role::Student));

        assert_eq!(storage.get(ROLE_KEY).unwrap().as_deref(), Some("student"));
    }

    // =====================================================================
    // Degraded mode
    // =====================================================================

    #[test]
    fn test_read_failing_storage_degrades_to_anonymous() {
        let mut store = SessionStore::new(BrokenStorage);

        assert_eq!(store.read(), Session::Anonymous);
        assert!(store.is_degraded());
    }

    #[test]
    fn test_write_failing_storage_keeps_session_in_memory() {
        let mut store = SessionStore::new(BrokenStorage);
        let session = authed("t", Role::Employer);

        store.write(&session);

        assert!(store.is_degraded());
        assert_eq!(store.read(), session);

        store.write(&Session::Anonymous);
        assert_eq!(store.read(), Session::Anonymous);
    }

    #[test]
    fn test_write_partial_failure_leaves_no_mismatched_pair() {
        let storage = RoleWriteFails::default();
        let mut store = SessionStore::new(storage.clone());

        store.write(&authed("new-token", Role::Admin));

        assert!(store.is_degraded());
        // The token slot that did get written was cleaned up.
        assert_eq!(storage.inner.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.read(), authed("new-token", Role::Admin));
    }
}
