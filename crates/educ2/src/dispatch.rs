//! Command dispatcher for authenticated sessions.

use educ2_protocol::{AttackRequest, Command, ProtocolError, StatsView, UserInfoView, text};
use educ2_session::{CredentialStore, Session, SessionError};
use educ2_sim::spawn_attack;
use educ2_transport::Outbound;
use rand::Rng;

use crate::Educ2Error;
use crate::server::ServerState;

/// What the connection handler does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    /// Flush what is queued and close the connection.
    Close,
}

/// Executes one command line for an authenticated session.
///
/// Every reply is followed by the command prompt, except for `exit`
/// and `quit`. A blank line gets the prompt alone.
pub(crate) async fn dispatch<S: CredentialStore>(
    session: &mut Session,
    line: &str,
    outbound: &Outbound,
    state: &ServerState<S>,
) -> Result<Flow, Educ2Error> {
    let username = session
        .user()
        .ok_or(SessionError::NotAuthenticated)?
        .username
        .clone();

    if let Some(token) = line.split_whitespace().next() {
        tracing::info!(session_id = %session.id(), user = %username, command = token, "command executed");
    }

    let command = match Command::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return prompt(outbound).await,
        Err(ProtocolError::UnknownCommand(token)) => {
            outbound.send(text::unknown_command(&token)).await?;
            return prompt(outbound).await;
        }
        Err(e @ ProtocolError::InvalidAttackArguments(_)) => {
            tracing::debug!(session_id = %session.id(), error = %e, "rejected attack");
            outbound.send(text::ATTACK_USAGE).await?;
            return prompt(outbound).await;
        }
    };

    let closes = command.terminates_session();
    execute(command, session, outbound, state).await?;
    if closes {
        return Ok(Flow::Close);
    }
    prompt(outbound).await
}

async fn prompt(outbound: &Outbound) -> Result<Flow, Educ2Error> {
    outbound.send(text::COMMAND_PROMPT).await?;
    Ok(Flow::Continue)
}

async fn execute<S: CredentialStore>(
    command: Command,
    session: &mut Session,
    outbound: &Outbound,
    state: &ServerState<S>,
) -> Result<(), Educ2Error> {
    match command {
        Command::Help => outbound.send(text::HELP).await?,
        Command::Methods => outbound.send(text::METHODS).await?,
        Command::MyInfo => outbound.send(my_info(session)?).await?,
        Command::Attack(request) => start_attack(session, request, outbound, state).await?,
        Command::Stats => {
            let active_sessions = state.registry.lock().await.len();
            let view = StatsView {
                active_sessions,
                total_users: state.credentials.user_count(),
                simulated_attacks: rand::rng().random_range(0..100),
                uptime_secs: state.started.elapsed().as_secs(),
            };
            outbound.send(view.to_string()).await?;
        }
        Command::Clear => outbound.send(text::CLEAR_SCREEN).await?,
        Command::Exit => {
            session.teardown();
            outbound.send(text::GOODBYE).await?;
        }
    }
    Ok(())
}

fn my_info(session: &Session) -> Result<String, SessionError> {
    let user = session.user().ok_or(SessionError::NotAuthenticated)?;
    let remote_address = session.remote_addr().ip().to_string();
    Ok(UserInfoView {
        username: &user.username,
        role: &user.role,
        remote_address: &remote_address,
        authenticated: session.is_authenticated(),
    }
    .to_string())
}

async fn start_attack<S: CredentialStore>(
    session: &mut Session,
    request: AttackRequest,
    outbound: &Outbound,
    state: &ServerState<S>,
) -> Result<(), Educ2Error> {
    match session.ensure_attack_slot_free() {
        Ok(()) => {}
        Err(SessionError::AttackInProgress { progress }) => {
            tracing::debug!(session_id = %session.id(), progress, "attack already running");
            outbound.send(educ2_sim::text::already_running(progress)).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let handle = spawn_attack(request, outbound.clone(), &state.sim).await?;
    session.attach_attack(handle)?;
    Ok(())
}
