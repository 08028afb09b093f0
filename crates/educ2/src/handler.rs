//! Per-connection handler: banner, login handshake, and command routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register the session and start the connection's writer task
//!   2. Send the banner and the first `login: ` prompt
//!   3. Loop: receive lines → login state machine, or the dispatcher once
//!      the session has authenticated
//!   4. On any exit: cancel the session's attack, remove the session from
//!      the registry, then flush and close the socket

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use educ2_protocol::text;
use educ2_session::{CredentialStore, LoginStep, Session, SessionId};
use educ2_transport::{
    LineConnection, LineReader, LineWriter, Outbound, TransportError, spawn_writer,
};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::Educ2Error;
use crate::dispatch::{Flow, dispatch};
use crate::server::ServerState;

/// Drop guard that removes a session from the registry when the handler
/// exits.
///
/// The normal exit path calls [`release`](Self::release). If the handler
/// panics instead, `Drop` spawns a fire-and-forget task for the async lock.
struct RegistryGuard<S: CredentialStore> {
    session_id: Option<SessionId>,
    state: Arc<ServerState<S>>,
}

impl<S: CredentialStore> RegistryGuard<S> {
    async fn release(mut self) {
        if let Some(id) = self.session_id.take() {
            let _ = self.state.registry.lock().await.remove(&id);
        }
    }
}

impl<S: CredentialStore> Drop for RegistryGuard<S> {
    fn drop(&mut self) {
        if let Some(id) = self.session_id.take() {
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let _ = state.registry.lock().await.remove(&id);
            });
        }
    }
}

/// How long teardown waits for queued output to reach a client before
/// dropping the connection.
const WRITER_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles a single accepted TCP connection from accept to close.
pub(crate) async fn handle_connection<S: CredentialStore>(
    conn: LineConnection,
    state: Arc<ServerState<S>>,
) -> Result<(), Educ2Error> {
    let peer = conn.peer_addr();
    let (reader, writer) = conn.into_split();
    run_session(reader, writer, peer, state).await
}

/// Runs one session over any line reader and writer.
///
/// Whatever ends the session, its simulation is cancelled before the
/// socket is closed, and it is removed from the registry.
pub(crate) async fn run_session<S, R, W>(
    mut reader: LineReader<R>,
    writer: LineWriter<W>,
    peer: SocketAddr,
    state: Arc<ServerState<S>>,
) -> Result<(), Educ2Error>
where
    S: CredentialStore,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let conn_id = writer.id();
    let session_id = state.registry.lock().await.register(peer);
    let guard = RegistryGuard {
        session_id: Some(session_id.clone()),
        state: Arc::clone(&state),
    };
    tracing::debug!(%conn_id, %session_id, %peer, "handling new connection");

    let (outbound, mut writer_task) = spawn_writer(writer);
    let mut session = Session::new(session_id, peer);

    let result = serve(&mut session, &mut reader, &outbound, &state).await;

    // Stop the simulation first so nothing is queued behind the close.
    session.teardown();
    guard.release().await;

    let closing = async {
        outbound.close().await;
        (&mut writer_task).await
    };
    match tokio::time::timeout(WRITER_CLOSE_TIMEOUT, closing).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::debug!(%conn_id, error = %e, "writer ended with error"),
        Ok(Err(e)) => tracing::debug!(%conn_id, error = %e, "writer task failed"),
        Err(_) => {
            tracing::warn!(%conn_id, "client not reading, dropping unsent output");
            writer_task.abort();
        }
    }

    result
}

/// Runs the session until the client leaves, asks to leave, or the
/// connection fails.
async fn serve<S, R>(
    session: &mut Session,
    reader: &mut LineReader<R>,
    outbound: &Outbound,
    state: &ServerState<S>,
) -> Result<(), Educ2Error>
where
    S: CredentialStore,
    R: AsyncRead + Unpin,
{
    outbound.send(text::BANNER).await?;
    outbound.send(text::BANNER_GAP).await?;
    outbound.send(text::LOGIN_PROMPT).await?;

    loop {
        let line = tokio::select! {
            line = reader.recv_line() => line?,
            () = outbound.closed() => {
                return Err(TransportError::ConnectionClosed("writer stopped".into()).into());
            }
        };

        let Some(line) = line else {
            tracing::info!(session_id = %session.id(), "client disconnected");
            return Ok(());
        };

        if on_line(session, &line, outbound, state).await? == Flow::Close {
            return Ok(());
        }
    }
}

/// Feeds one received line through the login handshake or, once the
/// session is authenticated, to the dispatcher.
pub(crate) async fn on_line<S: CredentialStore>(
    session: &mut Session,
    line: &str,
    outbound: &Outbound,
    state: &ServerState<S>,
) -> Result<Flow, Educ2Error> {
    let line = line.trim();

    if session.is_authenticated() {
        return dispatch(session, line, outbound, state).await;
    }

    match session.submit_login_line(line)? {
        LoginStep::PromptPassword => outbound.send(text::PASSWORD_PROMPT).await?,
        LoginStep::Verify { username, password } => {
            match state.credentials.lookup(&username, &password).await {
                Ok(user) => {
                    state
                        .registry
                        .lock()
                        .await
                        .mark_authenticated(session.id(), &user.username)?;
                    outbound.send(text::welcome(&user.username)).await?;
                    session.authenticate(user);
                    outbound.send(text::COMMAND_PROMPT).await?;
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session.id(),
                        peer = %session.remote_addr(),
                        user = %username,
                        reason = %e,
                        "login failed"
                    );
                    session.login_failed();
                    outbound.send(text::AUTH_FAILED).await?;
                    outbound.send(text::LOGIN_PROMPT).await?;
                }
            }
        }
    }
    Ok(Flow::Continue)
}
