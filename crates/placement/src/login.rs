//! One login attempt, from submit to commit.
//!
//! A [`LoginFlow`] is created when the form is submitted and consumed when
//! the backend answers. In between it holds only a [`Weak`] reference to
//! the provider, so an attempt never keeps a torn-down portal alive, and a
//! response that arrives afterwards has nothing to write to.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use placement_api::Credentials;
use placement_session::{
    KeyValueStorage, LoginCompletion, LoginTicket, SessionProvider, SessionSnapshot,
};

use crate::PortalError;

/// The provider as the portal shares it.
pub(crate) type SharedProvider<K> = Arc<Mutex<SessionProvider<K>>>;

/// Locks the provider.
///
/// Every provider method leaves it consistent before returning, so a
/// poisoned lock still guards a valid provider.
pub(crate) fn lock<K: KeyValueStorage>(
    provider: &Mutex<SessionProvider<K>>,
) -> MutexGuard<'_, SessionProvider<K>> {
    provider.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-flight login attempt.
pub struct LoginFlow<K: KeyValueStorage> {
    provider: Weak<Mutex<SessionProvider<K>>>,
    ticket: LoginTicket,
}

impl<K: KeyValueStorage> LoginFlow<K> {
    /// Registers a new attempt with the provider, superseding any earlier
    /// one.
    pub fn begin(provider: &Arc<Mutex<SessionProvider<K>>>) -> Self {
        let ticket = lock(provider).begin_login();
        Self {
            provider: Arc::downgrade(provider),
            ticket,
        }
    }

    pub fn ticket(&self) -> LoginTicket {
        self.ticket
    }

    /// Commits `credentials` if this attempt is still the current one.
    ///
    /// # Errors
    /// - [`PortalError::LoginDiscarded`] if the attempt went stale or the
    ///   provider is gone. Nothing was written.
    /// - [`PortalError::Session`] if the backend sent an empty token.
    pub fn complete(self, credentials: &Credentials) -> Result<SessionSnapshot, PortalError> {
        let Some(provider) = self.provider.upgrade() else {
            tracing::debug!("login response arrived after the portal was dropped");
            return Err(PortalError::LoginDiscarded);
        };

        let outcome = lock(&provider).complete_login(
            self.ticket,
            credentials.token.clone(),
            credentials.role,
        )?;

        match outcome {
            LoginCompletion::Applied(snapshot) => Ok(snapshot),
            LoginCompletion::Discarded => Err(PortalError::LoginDiscarded),
        }
    }

    /// Ends the attempt without a result. A newer attempt is unaffected.
    pub fn cancel(self) {
        if let Some(provider) = self.provider.upgrade() {
            lock(&provider).cancel_login(self.ticket);
        }
    }
}

#[cfg(test)]
mod tests {
    use placement_session::{MemoryStorage, Role};

    use super::*;

    fn shared() -> (SharedProvider<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let provider = Arc::new(Mutex::new(SessionProvider::new(storage.clone())));
        (provider, storage)
    }

    fn creds(token: &str, role: Role) -> Credentials {
        Credentials {
            token: token.into(),
            role,
        }
    }

    #[test]
    fn test_complete_current_flow_commits_session() {
        let (provider, _) = shared();
        let flow = LoginFlow::begin(&provider);

        let snapshot = flow.complete(&creds("t1", Role::Student)).unwrap();

        assert_eq!(snapshot.token(), Some("t1"));
        assert_eq!(lock(&provider).snapshot(), snapshot);
    }

    #[test]
    fn test_complete_after_provider_dropped_is_discarded() {
        let (provider, storage) = shared();
        let flow = LoginFlow::begin(&provider);

        drop(provider);
        let result = flow.complete(&creds("late", Role::Admin));

        assert!(matches!(result, Err(PortalError::LoginDiscarded)));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_complete_superseded_flow_is_discarded() {
        let (provider, _) = shared();
        let first = LoginFlow::begin(&provider);
        let second = LoginFlow::begin(&provider);

        assert!(matches!(
            first.complete(&creds("old", Role::Employer)),
            Err(PortalError::LoginDiscarded)
        ));
        assert!(second.complete(&creds("new", Role::Admin)).is_ok());
        assert_eq!(lock(&provider).snapshot().role(), Some(Role::Admin));
    }

    #[test]
    fn test_complete_empty_token_is_session_error() {
        let (provider, _) = shared();
        let flow = LoginFlow::begin(&provider);

        let result = flow.complete(&creds("", Role::Student));

        assert!(matches!(result, Err(PortalError::Session(_))));
    }

    #[test]
    fn test_cancel_clears_only_own_attempt() {
        let (provider, _) = shared();
        let first = LoginFlow::begin(&provider);
        first.cancel();
        assert!(!lock(&provider).has_pending_login());

        let older = LoginFlow::begin(&provider);
        let _newer = LoginFlow::begin(&provider);
        older.cancel();
        assert!(lock(&provider).has_pending_login());
    }
}
