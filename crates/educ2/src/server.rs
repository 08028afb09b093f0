//! `Educ2Server` builder and server loop.
//!
//! This is the entry point for running the simulator. It ties together
//! all the layers: transport → session → simulation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use educ2_session::{CredentialStore, SessionRegistry, StaticCredentialStore};
use educ2_sim::SimConfig;
use educ2_transport::{TcpLineTransport, Transport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{Config, Educ2Error};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<S: CredentialStore> {
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) credentials: S,
    pub(crate) sim: SimConfig,
    pub(crate) started: Instant,
}

impl<S: CredentialStore> ServerState<S> {
    pub(crate) fn new(credentials: S, sim: SimConfig) -> Self {
        Self {
            registry: Mutex::new(SessionRegistry::new()),
            credentials,
            sim,
            started: Instant::now(),
        }
    }
}

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,no_run
/// use educ2::prelude::*;
///
/// # async fn run() -> Result<(), Educ2Error> {
/// let server = Educ2Server::builder()
///     .bind("0.0.0.0:2323")
///     .build(StaticCredentialStore::default())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct Educ2ServerBuilder {
    bind_addr: String,
    sim_config: SimConfig,
}

impl Educ2ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: crate::config::DEFAULT_LISTEN.to_string(),
            sim_config: SimConfig::default(),
        }
    }

    /// Takes the listen address and simulation settings from `config`.
    pub fn config(self, config: &Config) -> Self {
        self.bind(&config.listen).sim_config(config.sim_config())
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the simulation configuration.
    pub fn sim_config(mut self, config: SimConfig) -> Self {
        self.sim_config = config;
        self
    }

    /// Binds the listener. Connections are accepted once
    /// [`Educ2Server::run`] is called.
    pub async fn build<S: CredentialStore>(
        self,
        credentials: S,
    ) -> Result<Educ2Server<S>, Educ2Error> {
        let transport = TcpLineTransport::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState::new(credentials, self.sim_config));

        Ok(Educ2Server { transport, state })
    }
}

impl Default for Educ2ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound EDU-C2 server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Educ2Server<S: CredentialStore> {
    transport: TcpLineTransport,
    state: Arc<ServerState<S>>,
}

impl Educ2Server<StaticCredentialStore> {
    /// Creates a new builder.
    ///
    /// The builder is not tied to a credential store type; any
    /// [`CredentialStore`] can be passed to
    /// [`build`](Educ2ServerBuilder::build).
    pub fn builder() -> Educ2ServerBuilder {
        Educ2ServerBuilder::new()
    }
}

impl<S: CredentialStore> Educ2Server<S> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), Educ2Error> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Each accepted connection gets its own task. Stopping the loop
    /// does not end connections that are already being served.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Educ2Error> {
        tracing::info!(addr = ?self.local_addr().ok(), "EDU-C2 simulator listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }
    }
}
