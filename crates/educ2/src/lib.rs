//! # EDU-C2
//!
//! An educational command-and-control *simulator*: a TCP service that
//! looks like the operator console of a botnet, for classroom and lab
//! use. It authenticates terminal clients, offers a handful of text
//! commands, and can run a scripted "attack" that only prints progress.
//! No traffic is ever sent anywhere.
//!
//! The layers, leaf to root:
//!
//! ```text
//! educ2-transport  TCP lines, per-connection writer
//! educ2-protocol   command parsing, static texts
//! educ2-tick       fixed-period clock
//! educ2-sim        attack simulation task
//! educ2-session    session state, credentials, registry
//! educ2 (here)     server loop, login state machine, dispatcher
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use educ2::prelude::*;
//!
//! # async fn run() -> Result<(), Educ2Error> {
//! let server = Educ2Server::builder()
//!     .bind("127.0.0.1:2323")
//!     .build(StaticCredentialStore::default())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod dispatch;
mod error;
mod handler;
mod server;

pub use config::{CliArgs, Config, ConfigError, TomlConfig};
pub use error::Educ2Error;
pub use server::{Educ2Server, Educ2ServerBuilder};

pub mod prelude {
    pub use crate::{Config, Educ2Error, Educ2Server, Educ2ServerBuilder};
    pub use educ2_session::{CredentialStore, SessionError, StaticCredentialStore, UserRecord};
    pub use educ2_sim::SimConfig;
}
