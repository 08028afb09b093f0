//! Session management for EDU-C2.
//!
//! This crate holds everything that has state per client:
//!
//! 1. **Credentials**: who may log in ([`CredentialStore`] trait,
//!    [`StaticCredentialStore`])
//! 2. **Session**: one connection's login progress, identity, and its
//!    at-most-one attack simulation ([`Session`])
//! 3. **Registry**: who is connected right now, for statistics only
//!    ([`SessionRegistry`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Server / dispatcher (above)  ← drives sessions line by line
//!     ↕
//! Session layer (this crate)   ← identity, auth state, task ownership
//!     ↕
//! Simulation layer (below)     ← AttackHandle
//! ```

mod error;
mod registry;
mod session;
mod user;

pub use error::SessionError;
pub use registry::{SessionEntry, SessionRegistry};
pub use session::{AuthStage, AuthState, LoginStep, Session, SessionId};
pub use user::{CredentialStore, StaticCredentialStore, UserRecord, default_users};
