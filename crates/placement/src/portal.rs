//! The [`Portal`] facade: what a host UI holds.
//!
//! A portal owns the session provider, the route table, and the API
//! client, and keeps track of where the user currently is. Hosts render
//! whatever [`Navigation`] comes back and re-render when the session
//! subscription fires.
//!
//! ```text
//! navigate(path) ──guard──→ Render ─────────────→ Navigation
//!                    │
//!                    └──→ Redirect(to) ──guard──→ ... (bounded)
//!
//! login(email, pw) ── LoginFlow::begin ── await gateway ── complete ── go home
//! authorized(call) ── await gateway ── 401? ── logout ── navigate(login)
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use placement_api::{ApiClient, ApiError, RegisterRequest, RegisteredUser};
use placement_routes::{
    MenuItem, Params, RedirectReason, RouteDecision, RouteTable, View, guard, home_view, menu,
};
use placement_session::{KeyValueStorage, SessionProvider, SessionSnapshot};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::login::{LoginFlow, SharedProvider, lock};
use crate::{PortalConfig, PortalError};

/// Redirects followed before a navigation is declared a loop.
///
/// The built-in table never needs more than one hop (a redirect always
/// lands on login, a role home, or the landing page).
pub const MAX_REDIRECTS: usize = 4;

/// Where a navigation ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// The path actually shown. Differs from the requested one after a
    /// redirect.
    pub path: String,
    pub view: View,
    pub params: Params,
    /// Why the first redirect happened, if any.
    pub redirected: Option<RedirectReason>,
}

impl Navigation {
    fn landing() -> Self {
        Self {
            path: View::Landing.path().to_string(),
            view: View::Landing,
            params: Params::new(),
            redirected: None,
        }
    }

    pub fn was_redirected(&self) -> bool {
        self.redirected.is_some()
    }
}

/// Session, routing, and API access for one user of the portal.
///
/// All methods take `&self`: a login can be in flight while the user
/// navigates or logs out from another task. The provider lock is never
/// held across an `.await`.
pub struct Portal<K: KeyValueStorage> {
    provider: SharedProvider<K>,
    routes: RouteTable,
    api: ApiClient,
    location: Mutex<Navigation>,
}

impl<K: KeyValueStorage> Portal<K> {
    /// Creates a portal with the built-in route table. The session is
    /// restored from `storage`.
    ///
    /// # Errors
    /// Returns [`PortalError::Api`] if `config.api_url` is unusable.
    pub fn new(config: &PortalConfig, storage: K) -> Result<Self, PortalError> {
        Self::with_routes(config, storage, RouteTable::portal())
    }

    /// Creates a portal with a custom route table.
    pub fn with_routes(
        config: &PortalConfig,
        storage: K,
        routes: RouteTable,
    ) -> Result<Self, PortalError> {
        let api = ApiClient::new(&config.api_url, config.timeout)?;
        let provider = SessionProvider::new(storage);
        if provider.is_degraded() {
            tracing::warn!("session storage unavailable, session will not survive a restart");
        }

        Ok(Self {
            provider: Arc::new(Mutex::new(provider)),
            routes,
            api,
            location: Mutex::new(Navigation::landing()),
        })
    }

    fn provider(&self) -> MutexGuard<'_, SessionProvider<K>> {
        lock(&self.provider)
    }

    // Only ever replaced wholesale, so poisoning can't leave it torn.
    fn location_mut(&self) -> MutexGuard<'_, Navigation> {
        self.location.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------

    /// The current session.
    pub fn session(&self) -> SessionSnapshot {
        self.provider().snapshot()
    }

    /// Observes every committed session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.provider().subscribe()
    }

    /// `true` when the session is memory-only because storage failed.
    pub fn is_degraded(&self) -> bool {
        self.provider().is_degraded()
    }

    /// The API client, for calls that don't need a session.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    // -----------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------

    /// Where the user currently is.
    pub fn location(&self) -> Navigation {
        self.location_mut().clone()
    }

    /// Goes to `path`, following guard redirects.
    ///
    /// Leaving the current view abandons any pending login, so a late
    /// response can't yank the user somewhere else.
    ///
    /// # Errors
    /// Returns [`PortalError::RedirectLoop`] if redirects don't settle
    /// within [`MAX_REDIRECTS`] hops. The location is unchanged then.
    pub fn navigate(&self, path: &str) -> Result<Navigation, PortalError> {
        let snapshot = {
            let mut provider = self.provider();
            provider.abandon_login();
            provider.snapshot()
        };
        self.resolve(path, &snapshot)
    }

    /// Runs the guard until it renders, then records the result.
    fn resolve(&self, path: &str, session: &SessionSnapshot) -> Result<Navigation, PortalError> {
        let mut target = path.to_string();
        let mut first_reason = None;

        for _ in 0..=MAX_REDIRECTS {
            match guard(&self.routes, session, &target) {
                RouteDecision::Render { view, params } => {
                    let navigation = Navigation {
                        path: target,
                        view,
                        params,
                        redirected: first_reason,
                    };
                    *self.location_mut() = navigation.clone();
                    return Ok(navigation);
                }
                RouteDecision::Redirect { to, reason } => {
                    tracing::debug!(from = %target, %to, ?reason, "following redirect");
                    first_reason.get_or_insert(reason);
                    target = to.path().to_string();
                }
            }
        }

        tracing::warn!(path, "redirect loop");
        Err(PortalError::RedirectLoop(path.to_string()))
    }

    /// The navigation bar for the current session.
    pub fn menu(&self) -> Vec<MenuItem> {
        menu(&self.session())
    }

    // -----------------------------------------------------------------
    // Login / logout
    // -----------------------------------------------------------------

    /// Exchanges email and password for a session, then goes to the
    /// role's home view.
    ///
    /// # Errors
    /// - `Api(InvalidCredentials)`: wrong email or password. The session
    ///   and location are untouched.
    /// - [`PortalError::LoginDiscarded`]: the user navigated away, logged
    ///   out, or submitted again while this request was in flight.
    /// - other `Api` errors: the gateway couldn't be reached.
    pub async fn login(&self, email: &str, password: &str) -> Result<Navigation, PortalError> {
        let flow = LoginFlow::begin(&self.provider);

        let credentials = match self.api.login(email, password).await {
            Ok(credentials) => credentials,
            Err(e) => {
                flow.cancel();
                return Err(e.into());
            }
        };

        let snapshot = flow.complete(&credentials)?;
        self.resolve(home_view(credentials.role).path(), &snapshot)
    }

    /// Abandons a login that is still waiting on the gateway.
    pub fn abandon_login(&self) {
        self.provider().abandon_login();
    }

    /// Clears the session and goes to the login view.
    pub fn logout(&self) -> Result<Navigation, PortalError> {
        let snapshot = self.provider().logout();
        self.resolve(View::Login.path(), &snapshot)
    }

    // -----------------------------------------------------------------
    // Authenticated API calls
    // -----------------------------------------------------------------

    /// Runs `call` with the current token.
    ///
    /// `call` gets a clone of the API client and the token:
    ///
    /// ```rust,ignore
    /// let jobs: Vec<Job> = portal
    ///     .authorized(|api, token| async move { api.get(&token, "jobs").await })
    ///     .await?;
    /// ```
    ///
    /// A 401 is handled here for every caller: the session is cleared,
    /// the portal moves to the login view, and
    /// [`PortalError::SessionExpired`] is returned. If the session changed
    /// while the call was in flight, the 401 belongs to a session that no
    /// longer exists and the current one is kept.
    ///
    /// # Errors
    /// - [`PortalError::NotAuthenticated`] with no session (no request sent)
    /// - [`PortalError::SessionExpired`] on 401
    /// - `Api(..)` for any other failure
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, PortalError>
    where
        F: FnOnce(ApiClient, String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let session = self.session();
        let Some(token) = session.token() else {
            return Err(PortalError::NotAuthenticated);
        };

        match call(self.api.clone(), token.to_string()).await {
            Ok(value) => Ok(value),
            Err(ApiError::Unauthorized) => {
                self.expire(session.revision())?;
                Err(PortalError::SessionExpired)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Logs out after a 401, unless the session has moved on since
    /// `revision`.
    fn expire(&self, revision: u64) -> Result<(), PortalError> {
        let snapshot = {
            let mut provider = self.provider();
            if provider.snapshot().revision() != revision {
                tracing::debug!(revision, "ignoring 401 for a replaced session");
                return Ok(());
            }
            tracing::info!("session rejected by gateway, logging out");
            provider.logout()
        };
        self.resolve(View::Login.path(), &snapshot)?;
        Ok(())
    }

    /// `GET path` with the current session.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PortalError> {
        self.authorized(|api, token| async move { api.get(&token, path).await })
            .await
    }

    /// `POST path` with a JSON body and the current session.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, PortalError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.authorized(|api, token| async move { api.post(&token, path, body).await })
            .await
    }

    /// `PUT path` with a JSON body and the current session.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, PortalError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.authorized(|api, token| async move { api.put(&token, path, body).await })
            .await
    }

    /// `DELETE path` with the current session.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, PortalError> {
        self.authorized(|api, token| async move { api.delete(&token, path).await })
            .await
    }

    // -----------------------------------------------------------------
    // Account management (no session needed)
    // -----------------------------------------------------------------

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisteredUser, PortalError> {
        let user = self.api.register(request).await?;
        tracing::info!(role = %user.role, "account registered");
        Ok(user)
    }

    /// Asks the backend to email a reset link. Returns its message.
    pub async fn forgot_password(&self, email: &str) -> Result<String, PortalError> {
        Ok(self.api.forgot_password(email).await?)
    }

    /// Sets a new password using the token from the reset link.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<String, PortalError> {
        Ok(self.api.reset_password(reset_token, new_password).await?)
    }
}
