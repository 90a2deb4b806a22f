//! Error types for the routing layer.

/// Errors that can occur while building a route table.
///
/// Evaluating routes never fails; only declaring them can.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The pattern isn't of the form `/literal/:param/...`.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Two routes declare the same pattern. The second would never match.
    #[error("route pattern {0:?} declared twice")]
    DuplicatePattern(String),
}
