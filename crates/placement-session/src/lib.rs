//! Client-side session model for the placement portal.
//!
//! This crate owns the answer to one question: "who is using the portal
//! right now, and as what?" It handles:
//!
//! 1. **Identity types**: the closed [`Role`] set and the [`Session`]
//!    pair (credential + role)
//! 2. **Persistence**: the [`KeyValueStorage`] trait for durable client
//!    storage and the [`SessionStore`] that reads/writes the two slots
//! 3. **Ownership**: the [`SessionProvider`], the only component allowed
//!    to change the session, which publishes snapshots to every consumer
//!
//! # How it fits in the stack
//!
//! ```text
//! Portal facade (above)  ← routes, API calls, login flow
//!     ↕
//! Session Layer (this crate)  ← who is logged in, persisted across reloads
//!     ↕
//! Durable storage (below)  ← a JSON file, an in-memory map, browser storage
//! ```

mod error;
mod provider;
mod session;
mod storage;
mod store;

pub use error::{SessionError, StorageError};
pub use provider::{LoginCompletion, LoginTicket, SessionProvider};
pub use session::{Role, Session, SessionSnapshot};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{ROLE_KEY, SessionStore, TOKEN_KEY};
