//! Error types for the protocol layer.
//!
//! Both variants are recoverable: the dispatcher renders them to the
//! client and the session carries on.

/// Errors produced while parsing an authenticated command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The command token is not one the server knows.
    ///
    /// Carries the token as the client typed it (original case).
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// `attack` was given fewer than three arguments.
    #[error("invalid attack arguments: {0}")]
    InvalidAttackArguments(String),
}
