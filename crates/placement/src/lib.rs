//! # Placement
//!
//! Client-side core of the placement portal: who is logged in, which views
//! they may open, and how the UI talks to the API gateway.
//!
//! The work is split across three crates, re-exported here:
//!
//! - [`placement_session`]: the session, its persistence, and the provider
//!   that owns it
//! - [`placement_routes`]: the route table, the guard, and the menu
//! - [`placement_api`]: the HTTP client for the API gateway
//!
//! [`Portal`] ties them together and is what a host UI holds.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use placement::prelude::*;
//!
//! # async fn run() -> Result<(), PortalError> {
//! placement::init_logging();
//!
//! let config = PortalConfig::from_env()?;
//! let portal = Portal::new(&config, FileStorage::new("session.json"))?;
//!
//! let nav = portal.login("ana@uni.edu", "secret").await?;
//! assert_eq!(nav.view, View::StudentHome);
//!
//! for item in portal.menu() {
//!     println!("{item:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod logging;
mod login;
mod portal;

pub use config::{ENV_API_URL, ENV_SESSION_FILE, ENV_TIMEOUT_SECS, PortalConfig};
pub use error::PortalError;
pub use logging::init_logging;
pub use login::LoginFlow;
pub use portal::{MAX_REDIRECTS, Navigation, Portal};

pub use placement_api;
pub use placement_routes;
pub use placement_session;

/// Convenient re-exports for hosts.
///
/// ```rust
/// use placement::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Navigation, Portal, PortalConfig, PortalError};

    pub use placement_api::{ApiClient, ApiError, Credentials, RegisterRequest, RegisteredUser};
    pub use placement_routes::{
        MenuItem, RedirectReason, RouteDecision, RouteRequirement, RouteTable, View, guard,
        home_view, menu,
    };
    pub use placement_session::{
        FileStorage, KeyValueStorage, MemoryStorage, Role, Session, SessionProvider,
        SessionSnapshot,
    };
}
