//! An in-process fake of the backend, served with `axum`.
//!
//! [`StubGateway`] binds `127.0.0.1:0`, so every test gets its own server
//! on a free port. It keeps users and issued tokens in memory and answers
//! the endpoints the portal uses with the same JSON shapes and status
//! codes as the real backend:
//!
//! | Method | Path                  | Access        |
//! |--------|-----------------------|---------------|
//! | POST   | `/api/login`          | public        |
//! | POST   | `/api/register`       | public        |
//! | POST   | `/api/forgot-password`| public        |
//! | POST   | `/api/reset-password` | public        |
//! | GET    | `/api/user/profile`   | any session   |
//! | PUT    | `/api/user/profile`   | any session   |
//! | GET    | `/api/jobs`           | any session   |
//! | POST   | `/api/jobs`           | employer      |
//! | DELETE | `/api/jobs/{job_id}`  | employer, admin |
//! | GET    | `/api/admin/alumni`   | admin         |
//!
//! Test knobs: [`revoke_all`](StubGateway::revoke_all) invalidates every
//! issued token (the next authenticated call gets 401), and
//! [`set_login_delay`](StubGateway::set_login_delay) holds login responses
//! back so a test can race them against logout or a second login.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use placement_session::Role;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::{ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest};

// =========================================================================
// State
// =========================================================================

#[derive(Debug, Clone)]
struct StubUser {
    id: String,
    name: String,
    email: String,
    password: String,
    role: Role,
}

/// A job posting as the stub stores and returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubJob {
    pub id: u64,
    pub title: String,
    pub company: String,
    pub posted_by: String,
}

#[derive(Debug, Default)]
struct Inner {
    /// email → user
    users: HashMap<String, StubUser>,
    /// session token → email
    sessions: HashMap<String, String>,
    /// reset token → email
    resets: HashMap<String, String>,
    jobs: Vec<StubJob>,
    next_id: u64,
    login_delay: Duration,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
struct StubState {
    inner: Mutex<Inner>,
}

impl StubState {
    // Handlers never panic while holding the lock, and every mutation is
    // a single map operation, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type Shared = Arc<StubState>;

// =========================================================================
// StubGateway
// =========================================================================

/// A running fake backend. The server task is aborted on drop.
pub struct StubGateway {
    addr: SocketAddr,
    state: Shared,
    task: JoinHandle<()>,
}

impl StubGateway {
    /// Binds a free local port and starts serving.
    pub async fn start() -> std::io::Result<Self> {
        let state: Shared = Arc::new(StubState::default());
        let app = router(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tracing::debug!(%addr, "stub gateway listening");

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(error = %e, "stub gateway stopped");
            }
        });

        Ok(Self { addr, state, task })
    }

    /// The address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL to hand to [`ApiClient::new`](crate::ApiClient::new).
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Seeds an account that can log in right away.
    pub fn add_user(&self, email: &str, password: &str, role: Role) {
        let mut inner = self.state.lock();
        let id = inner.next_id().to_string();
        inner.users.insert(
            email.to_string(),
            StubUser {
                id,
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role,
            },
        );
    }

    /// Seeds a job posting and returns its id.
    pub fn add_job(&self, title: &str, company: &str) -> u64 {
        let mut inner = self.state.lock();
        let id = inner.next_id();
        inner.jobs.push(StubJob {
            id,
            title: title.to_string(),
            company: company.to_string(),
            posted_by: String::new(),
        });
        id
    }

    /// Invalidates every issued session token, as if they all expired.
    pub fn revoke_all(&self) {
        let mut inner = self.state.lock();
        let revoked = inner.sessions.len();
        inner.sessions.clear();
        tracing::debug!(revoked, "stub gateway revoked all tokens");
    }

    /// Holds every subsequent login response back for `delay`.
    pub fn set_login_delay(&self, delay: Duration) {
        self.state.lock().login_delay = delay;
    }

    /// The reset token most recently issued for `email`, i.e. what the
    /// user would find in the emailed link.
    pub fn last_reset_token(&self, email: &str) -> Option<String> {
        self.state
            .lock()
            .resets
            .iter()
            .find(|(_, owner)| owner.as_str() == email)
            .map(|(token, _)| token.clone())
    }

    /// Number of session tokens currently accepted.
    pub fn active_sessions(&self) -> usize {
        self.state.lock().sessions.len()
    }
}

impl Drop for StubGateway {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =========================================================================
// Routing
// =========================================================================

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/forgot-password", post(forgot_password))
        .route("/api/reset-password", post(reset_password))
        .route("/api/user/profile", get(profile).put(update_profile))
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/{job_id}", delete(delete_job))
        .route("/api/admin/alumni", get(alumni))
        .with_state(state)
}

/// FastAPI-style error body.
fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

/// Resolves the bearer token to its user, or answers 401.
fn authenticate(state: &StubState, headers: &HeaderMap) -> Result<StubUser, Response> {
    let unauthorized = || detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;

    let inner = state.lock();
    inner
        .sessions
        .get(token)
        .and_then(|email| inner.users.get(email))
        .cloned()
        .ok_or_else(unauthorized)
}

fn profile_body(user: &StubUser) -> serde_json::Value {
    json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
    })
}

// =========================================================================
// Handlers
// =========================================================================

async fn login(State(state): State<Shared>, Json(body): Json<LoginRequest>) -> Response {
    let delay = state.lock().login_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mut inner = state.lock();
    let role = match inner.users.get(&body.email) {
        Some(user) if user.password == body.password => user.role,
        _ => return detail(StatusCode::BAD_REQUEST, "Invalid credentials"),
    };

    let token = generate_token();
    inner.sessions.insert(token.clone(), body.email);

    Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "role": role,
    }))
    .into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<RegisterRequest>) -> Response {
    let mut inner = state.lock();
    if inner.users.contains_key(&body.email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }

    let user = StubUser {
        id: inner.next_id().to_string(),
        name: body.name,
        email: body.email.clone(),
        password: body.password,
        role: body.role,
    };
    let response = profile_body(&user);
    inner.users.insert(body.email, user);

    (StatusCode::CREATED, Json(response)).into_response()
}

async fn forgot_password(
    State(state): State<Shared>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Response {
    let mut inner = state.lock();
    // Same answer whether or not the account exists.
    if inner.users.contains_key(&body.email) {
        inner.resets.retain(|_, owner| *owner != body.email);
        inner.resets.insert(generate_token(), body.email);
    }

    Json(json!({ "message": "If the email exists, a reset link has been sent" })).into_response()
}

async fn reset_password(
    State(state): State<Shared>,
    Json(body): Json<ResetPasswordRequest>,
) -> Response {
    let mut inner = state.lock();
    let Some(email) = inner.resets.remove(&body.token) else {
        return detail(StatusCode::BAD_REQUEST, "Invalid or expired token");
    };

    match inner.users.get_mut(&email) {
        Some(user) => {
            user.password = body.new_password;
            Json(json!({ "message": "Password reset successful" })).into_response()
        }
        None => detail(StatusCode::BAD_REQUEST, "Invalid or expired token"),
    }
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    match authenticate(&state, &headers) {
        Ok(user) => Json(profile_body(&user)).into_response(),
        Err(response) => response,
    }
}

#[derive(Deserialize)]
struct ProfileUpdate {
    name: String,
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ProfileUpdate>,
) -> Response {
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let mut inner = state.lock();
    match inner.users.get_mut(&user.email) {
        Some(stored) => {
            stored.name = body.name;
            Json(profile_body(stored)).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn list_jobs(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = authenticate(&state, &headers) {
        return response;
    }
    Json(state.lock().jobs.clone()).into_response()
}

#[derive(Deserialize)]
struct NewJob {
    title: String,
    company: String,
}

async fn create_job(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewJob>,
) -> Response {
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if user.role != Role::Employer {
        return detail(StatusCode::FORBIDDEN, "Not authorized");
    }

    let mut inner = state.lock();
    let job = StubJob {
        id: inner.next_id(),
        title: body.title,
        company: body.company,
        posted_by: user.email,
    };
    inner.jobs.push(job.clone());

    (StatusCode::CREATED, Json(job)).into_response()
}

async fn delete_job(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
) -> Response {
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if user.role == Role::Student {
        return detail(StatusCode::FORBIDDEN, "Not authorized");
    }

    let mut inner = state.lock();
    let before = inner.jobs.len();
    inner.jobs.retain(|job| job.id != job_id);
    if inner.jobs.len() == before {
        return detail(StatusCode::NOT_FOUND, "Job not found");
    }

    StatusCode::NO_CONTENT.into_response()
}

async fn alumni(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if user.role != Role::Admin {
        return detail(StatusCode::FORBIDDEN, "Not authorized");
    }

    let inner = state.lock();
    let alumni: Vec<_> = inner
        .users
        .values()
        .filter(|u| u.role == Role::Student)
        .map(profile_body)
        .collect();
    Json(alumni).into_response()
}

/// Generates a random 32-character hex token (128 bits).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
