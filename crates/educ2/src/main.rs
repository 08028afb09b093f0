//! educ2: educational C2 simulator
//!
//! Serves a botnet-style operator console over plain TCP for classroom
//! use. Attacks are simulated: they print progress and send nothing.
//! Connect with `telnet <host> <port>`.

use educ2::{Config, Educ2Error, Educ2Server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Educ2Error> {
    let config = Config::load()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        tick_interval_ms = config.tick_interval.as_millis() as u64,
        users = config.users.len(),
        "Starting EDU-C2 simulator"
    );

    let server = Educ2Server::builder()
        .config(&config)
        .build(config.credential_store())
        .await?;

    if let Ok(addr) = server.local_addr() {
        info!(%addr, "connect using: telnet {} {}", addr.ip(), addr.port());
    }

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
