//! Routing for the placement portal: which view to show, and to whom.
//!
//! Each navigable view declares a [`RouteRequirement`] in a
//! [`RouteTable`]. One function, [`guard`], turns a session snapshot and a
//! requested path into a [`RouteDecision`] (render or redirect). The
//! navigation menu is derived the same way, from the snapshot alone.
//!
//! # Key types
//!
//! - [`View`]: the closed set of portal screens
//! - [`RouteTable`]: ordered route declarations, built with [`RouteTableBuilder`]
//! - [`guard`]: the single place access rules are enforced
//! - [`menu`]: role-appropriate navigation links
//!
//! Nothing here touches the network or storage. Every function is a pure
//! function of its arguments, so a router can call them synchronously on
//! every navigation.

mod error;
mod guard;
mod menu;
mod table;
mod view;

pub use error::RouteError;
pub use guard::{RedirectReason, RouteDecision, guard};
pub use menu::{MenuItem, menu};
pub use table::{Params, Route, RouteRequirement, RouteTable, RouteTableBuilder};
pub use view::{View, home_view};
