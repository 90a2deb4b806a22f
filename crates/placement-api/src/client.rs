//! The API gateway client.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    ApiError, Credentials, ForgotPasswordRequest, LoginRequest, MessageResponse,
    RegisterRequest, RegisteredUser, ResetPasswordRequest,
};

/// Where the backend listens in a default local setup.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Talks to the API gateway.
///
/// Cheap to clone: `reqwest::Client` is an `Arc` around a connection pool.
/// No request is ever retried here; retrying is the caller's decision.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    /// Always ends with `/` so `Url::join` appends instead of replacing
    /// the last segment.
    base: Url,
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `http://host:8000/api`).
    ///
    /// # Errors
    /// - [`ApiError::InvalidConfig`] if `base_url` isn't an absolute http(s) URL
    /// - [`ApiError::Transport`] if the HTTP client can't be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidConfig(format!("{base_url:?}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidConfig(format!(
                "{base_url:?}: scheme must be http or https"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    /// The base URL every endpoint path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Joins `path` onto the base URL.
    ///
    /// The result must stay under the base: same origin and a path that
    /// starts with the base path. An absolute URL or a `..` that climbs
    /// out would otherwise receive the bearer token.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidConfig(format!("bad endpoint path {path:?}: {e}")))?;

        if url.origin() != self.base.origin() || !url.path().starts_with(self.base.path()) {
            tracing::warn!(path, "endpoint path escapes the gateway base URL");
            return Err(ApiError::InvalidConfig(format!(
                "endpoint path {path:?} leaves {}",
                self.base
            )));
        }
        Ok(url)
    }

    // -----------------------------------------------------------------
    // Public endpoints
    // -----------------------------------------------------------------

    /// `POST /login`. Any non-2xx answer is a credential rejection.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credentials, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .http
            .post(self.url("login")?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "login rejected");
            return Err(ApiError::InvalidCredentials);
        }

        let creds: Credentials = decode(response).await?;
        tracing::debug!(role = %creds.role, "login accepted");
        Ok(creds)
    }

    /// `POST /register`.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisteredUser, ApiError> {
        let response = self
            .http
            .post(self.url("register")?)
            .json(request)
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// `POST /forgot-password`. Returns the backend's confirmation message.
    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        let response = self
            .http
            .post(self.url("forgot-password")?)
            .json(&body)
            .send()
            .await?;
        let ack: MessageResponse = decode(check(response).await?).await?;
        Ok(ack.message)
    }

    /// `POST /reset-password` with the one-time token from the reset link.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<String, ApiError> {
        let body = ResetPasswordRequest {
            token: reset_token.to_string(),
            new_password: new_password.to_string(),
        };
        let response = self
            .http
            .post(self.url("reset-password")?)
            .json(&body)
            .send()
            .await?;
        let ack: MessageResponse = decode(check(response).await?).await?;
        Ok(ack.message)
    }

    // -----------------------------------------------------------------
    // Authenticated endpoints
    // -----------------------------------------------------------------

    /// `GET path` with `Authorization: Bearer <token>`.
    pub async fn get<T: DeserializeOwned>(&self, token: &str, path: &str) -> Result<T, ApiError> {
        let request = self.http.request(Method::GET, self.url(path)?);
        self.authorized(request, token, path).await
    }

    /// `POST path` with a JSON body and `Authorization: Bearer <token>`.
    pub async fn post<B, T>(&self, token: &str, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.request(Method::POST, self.url(path)?).json(body);
        self.authorized(request, token, path).await
    }

    /// `PUT path` with a JSON body and `Authorization: Bearer <token>`.
    pub async fn put<B, T>(&self, token: &str, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.request(Method::PUT, self.url(path)?).json(body);
        self.authorized(request, token, path).await
    }

    /// `DELETE path` with `Authorization: Bearer <token>`.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
    ) -> Result<T, ApiError> {
        let request = self.http.request(Method::DELETE, self.url(path)?);
        self.authorized(request, token, path).await
    }

    /// Attaches the bearer token, sends, maps 401 to `Unauthorized`.
    async fn authorized<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &str,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = request.bearer_auth(token).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!(path, "token rejected by gateway");
            return Err(ApiError::Unauthorized);
        }
        decode(check(response).await?).await
    }
}

/// Passes 2xx responses through; turns anything else into `Rejected`.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = extract_detail(&body);
    tracing::debug!(status = status.as_u16(), %detail, "request rejected");
    Err(ApiError::Rejected {
        status: status.as_u16(),
        detail,
    })
}

/// Decodes a JSON body. An empty body decodes as JSON `null`, so
/// endpoints that answer 204 can be called with `T = ()`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };
    serde_json::from_slice(bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Pulls a human-readable reason out of an error body.
///
/// FastAPI sends `{"detail": "..."}` for `HTTPException` and
/// `{"detail": [...]}` for validation errors; anything else is returned
/// as-is.
fn extract_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(mut map)) => match map.remove("detail") {
            Some(serde_json::Value::String(detail)) => detail,
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        _ => body.trim().to_string(),
    }
}
