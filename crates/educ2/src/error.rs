//! Unified error type for the EDU-C2 server.

use educ2_session::SessionError;
use educ2_transport::TransportError;

use crate::config::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// Nothing here is fatal to the process once the server is running: a
/// `Transport` or `Session` error ends only the connection it came from.
#[derive(Debug, thiserror::Error)]
pub enum Educ2Error {
    /// A transport-level error (bind, accept, read, write).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A session-level error (registry, state machine misuse).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Bad command line or config file.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
