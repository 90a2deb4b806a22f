//! HTTP client for the placement portal's API gateway.
//!
//! This crate knows how to talk to the backend and nothing else:
//!
//! - **Types** ([`Credentials`], [`LoginRequest`], [`RegisterRequest`], ...)
//!   hold the JSON bodies that travel over HTTP.
//! - **Client** ([`ApiClient`]): login, registration, password reset, and
//!   generic bearer-authenticated JSON requests.
//! - **Errors** ([`ApiError`]): a rejected credential, an expired
//!   session, a backend that said no, or a network failure.
//!
//! It never touches the session. Turning `ApiError::Unauthorized` into a
//! logout is the portal facade's job, done in one place for every request.
//!
//! # Feature Flags
//!
//! - `stub`: [`stub::StubGateway`], an in-process fake backend served with
//!   `axum` on a random local port.

mod client;
mod error;
#[cfg(feature = "stub")]
pub mod stub;
mod types;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use types::{
    Credentials, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    RegisteredUser, ResetPasswordRequest,
};
