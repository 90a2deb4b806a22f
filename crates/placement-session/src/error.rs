//! Error types for the session layer.

/// Errors that can occur when mutating or decoding a session.
///
/// These are caller mistakes (an empty credential) or data the client
/// cannot interpret (a role tag outside the closed set). Storage failures
/// are a separate type because the store absorbs them instead of
/// propagating.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// `login` was called with an empty or whitespace-only token.
    /// A session without a credential would break the token/role pairing.
    #[error("login requires a non-empty token")]
    EmptyToken,

    /// A role tag that isn't `admin`, `employer`, or `student`.
    /// Can come from the backend's login response or from a tampered
    /// storage slot.
    #[error("unknown role tag: {0:?}")]
    UnknownRole(String),
}

/// Errors raised by a [`KeyValueStorage`](crate::KeyValueStorage) backend.
///
/// The [`SessionStore`](crate::SessionStore) never lets these escape: a
/// failing backend flips the store into degraded (memory-only) mode.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but isn't a JSON object of strings.
    #[error("storage contents are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The backend refuses all access (disabled storage, quota, etc.).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
