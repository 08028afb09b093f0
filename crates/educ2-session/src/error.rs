//! Error types for the session layer.

use crate::SessionId;

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The username/password pair matched no stored user.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No live session is registered under this ID.
    #[error("session not found: {0}")]
    NotFound(SessionId),

    /// The operation needs an authenticated session.
    #[error("session is not authenticated")]
    NotAuthenticated,

    /// Login input arrived after the session had already authenticated.
    #[error("session is already authenticated")]
    AlreadyAuthenticated,

    /// The session already owns a running attack simulation.
    #[error("an attack simulation is already running ({progress}% complete)")]
    AttackInProgress {
        /// Progress of the running simulation.
        progress: u8,
    },
}
