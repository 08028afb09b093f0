//! Text protocol for EDU-C2.
//!
//! This crate defines what the client types and what the server answers:
//!
//! - **Commands** ([`Command`], [`AttackRequest`]): parsing an
//!   authenticated input line into a typed request.
//! - **Texts** ([`text`]): the banner, prompts, help and method listings,
//!   and the views rendered for `myinfo` and `stats`.
//! - **Errors** ([`ProtocolError`]): unknown commands and bad `attack`
//!   arguments.
//!
//! It knows nothing about sockets or sessions.
//!
//! ```text
//! Transport (lines) → Protocol (Command) → Session / dispatcher
//! ```

mod command;
mod error;
pub mod text;

pub use command::{AttackRequest, Command, DEFAULT_DURATION};
pub use error::ProtocolError;
pub use text::{StatsView, UserInfoView};
