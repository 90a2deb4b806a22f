//! The session provider: single owner of the live session.
//!
//! Everything that wants to know who is logged in asks the provider for a
//! [`SessionSnapshot`] or subscribes to changes. Everything that wants to
//! CHANGE who is logged in goes through exactly two doors: [`login`] and
//! [`logout`]. The provider writes every change through to its
//! [`SessionStore`], so the store has one writer by construction.
//!
//! # Late login responses
//!
//! A login form awaits the backend before it can call `login`. While it
//! waits, the user might navigate away, press logout, or submit again. The
//! provider hands out a [`LoginTicket`] when an attempt starts and only
//! applies the result if that ticket is still the current one.
//!
//! [`login`]: SessionProvider::login
//! [`logout`]: SessionProvider::logout

use tokio::sync::watch;

use crate::{KeyValueStorage, Role, Session, SessionError, SessionSnapshot, SessionStore};

/// Identifies one in-flight login attempt.
///
/// Fields are private: the only way to get a ticket is
/// [`SessionProvider::begin_login`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTicket {
    id: u64,
    /// Session revision when the attempt started.
    revision: u64,
}

/// Outcome of [`SessionProvider::complete_login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginCompletion {
    /// The ticket was current; the session is now this snapshot.
    Applied(SessionSnapshot),

    /// The ticket was abandoned or superseded. Nothing changed.
    Discarded,
}

/// Owns the session for the lifetime of the application.
///
/// ## Lifecycle
///
/// ```text
/// new() ── store.read() ──→ [Unauthenticated] or [Authenticated]
///
///  [Unauthenticated] ──login()──→ [Authenticated]
///  [Authenticated]   ──login()──→ [Authenticated] (new token/role)
///  [Authenticated]   ──logout()─→ [Unauthenticated]
///  [Unauthenticated] ──logout()─→ [Unauthenticated] (no-op)
/// ```
pub struct SessionProvider<K: KeyValueStorage> {
    store: SessionStore<K>,

    /// Publishes every committed snapshot. The sender also holds the
    /// current value, so `snapshot()` reads from here.
    tx: watch::Sender<SessionSnapshot>,

    /// Counter for ticket IDs. Never reused.
    next_ticket: u64,

    /// The ticket whose response may still be applied, if any.
    pending: Option<u64>,
}

impl<K: KeyValueStorage> SessionProvider<K> {
    /// Creates a provider whose initial state is whatever the storage holds.
    pub fn new(storage: K) -> Self {
        Self::with_store(SessionStore::new(storage))
    }

    /// Creates a provider over an existing store.
    pub fn with_store(mut store: SessionStore<K>) -> Self {
        let initial = store.read();
        if let Some(role) = initial.role() {
            tracing::info!(%role, "restored persisted session");
        } else {
            tracing::debug!("no persisted session, starting unauthenticated");
        }

        // `send_replace` (used below) works with zero receivers, so the
        // initial receiver can be dropped right away.
        let (tx, _rx) = watch::channel(SessionSnapshot::new(initial, 0));

        Self {
            store,
            tx,
            next_ticket: 0,
            pending: None,
        }
    }

    /// The current session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Returns a receiver that observes every committed change.
    ///
    /// Consumers call `changed().await` on it to re-render. The receiver
    /// starts out having "seen" the current value.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// `true` when storage failed and the session is memory-only.
    pub fn is_degraded(&self) -> bool {
        self.store.is_degraded()
    }

    /// Establishes a session.
    ///
    /// The new snapshot is persisted and published before this returns.
    ///
    /// # Errors
    /// Returns [`SessionError::EmptyToken`] for an empty token. The current
    /// session is left untouched in that case.
    pub fn login(
        &mut self,
        token: impl Into<String>,
        role: Role,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = Session::authenticated(token, role)?;
        let snapshot = self.commit(session);
        tracing::info!(%role, revision = snapshot.revision(), "session established");
        Ok(snapshot)
    }

    /// Clears the session. Safe to call when already logged out.
    ///
    /// Also abandons any pending login so a response that arrives after
    /// the user logged out can't log them back in.
    pub fn logout(&mut self) -> SessionSnapshot {
        self.pending = None;

        let current = self.snapshot();
        if !current.is_authenticated() {
            return current;
        }

        let snapshot = self.commit(Session::Anonymous);
        tracing::info!(revision = snapshot.revision(), "session cleared");
        snapshot
    }

    // -----------------------------------------------------------------
    // Login attempt tracking
    // -----------------------------------------------------------------

    /// Starts a login attempt. Any earlier pending attempt is superseded.
    pub fn begin_login(&mut self) -> LoginTicket {
        self.next_ticket += 1;
        if self.pending.replace(self.next_ticket).is_some() {
            tracing::debug!(ticket = self.next_ticket, "superseding pending login");
        }
        LoginTicket {
            id: self.next_ticket,
            revision: self.snapshot().revision(),
        }
    }

    /// Abandons the pending login attempt, if any.
    pub fn abandon_login(&mut self) {
        if let Some(id) = self.pending.take() {
            tracing::debug!(ticket = id, "pending login abandoned");
        }
    }

    /// Ends one specific attempt that failed before it had a result (e.g.
    /// the backend rejected the credentials). Unlike [`abandon_login`],
    /// a newer attempt that superseded `ticket` stays pending.
    ///
    /// [`abandon_login`]: Self::abandon_login
    pub fn cancel_login(&mut self, ticket: LoginTicket) {
        if self.pending == Some(ticket.id) {
            self.pending = None;
            tracing::debug!(ticket = ticket.id, "login attempt cancelled");
        }
    }

    /// `true` while a login attempt may still be applied.
    pub fn has_pending_login(&self) -> bool {
        self.pending.is_some()
    }

    /// Applies the result of a login attempt if its ticket is still current.
    ///
    /// A ticket is stale when a newer attempt started, the attempt was
    /// abandoned, or any login/logout was committed after it was issued.
    ///
    /// # Errors
    /// Returns [`SessionError::EmptyToken`] if the ticket is current but the
    /// token is empty. The ticket is consumed either way.
    pub fn complete_login(
        &mut self,
        ticket: LoginTicket,
        token: impl Into<String>,
        role: Role,
    ) -> Result<LoginCompletion, SessionError> {
        if self.pending != Some(ticket.id) {
            tracing::debug!(ticket = ticket.id, "discarding stale login response");
            return Ok(LoginCompletion::Discarded);
        }
        self.pending = None;

        if self.snapshot().revision() != ticket.revision {
            tracing::debug!(
                ticket = ticket.id,
                "session changed while login was in flight, discarding"
            );
            return Ok(LoginCompletion::Discarded);
        }

        self.login(token, role).map(LoginCompletion::Applied)
    }

    /// Persists, bumps the revision, and publishes.
    fn commit(&mut self, session: Session) -> SessionSnapshot {
        self.store.write(&session);
        let snapshot = SessionSnapshot::new(session, self.snapshot().revision() + 1);
        self.tx.send_replace(snapshot.clone());
        snapshot
    }
}

// =========================================================================
// Tests
// =========================================================================
