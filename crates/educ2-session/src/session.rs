//! Session types: one connected client, from accept to disconnect.
//!
//! A session tracks:
//! - WHO is connected (`SessionId`, remote address, and once logged in,
//!   the `UserRecord`)
//! - HOW FAR the login has got (`AuthState`)
//! - WHAT is running on its behalf (at most one `AttackHandle`)
//!
//! A session is owned and mutated by its connection's handler task only.

use std::fmt;
use std::net::SocketAddr;

use educ2_sim::AttackHandle;
use rand::Rng;

use crate::{SessionError, UserRecord};

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Opaque, random identifier of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a random 16-character hex ID (64 bits of entropy).
    pub fn generate() -> Self {
        let bytes: [u8; 8] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// The ID as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// Where an unauthenticated session is in the two-prompt login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStage {
    /// `login: ` has been shown; the next line is a username.
    AwaitingUsername,
    /// `password: ` has been shown; the next line completes the attempt.
    AwaitingPassword {
        /// The candidate username from the previous line.
        username: String,
    },
}

/// The session's authentication state.
///
/// ```text
///   Unauthenticated(AwaitingUsername) ──line──→ Unauthenticated(AwaitingPassword)
///            ↑                                            │
///            └──────────────── lookup failed ─────────────┤
///                                                         │ lookup ok
///                                                         ▼
///                                                Authenticated(user)
/// ```
///
/// The user record lives inside the `Authenticated` variant, so "a user
/// is attached iff the session is authenticated" holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated(AuthStage),
    Authenticated(UserRecord),
}

/// What the handler must do after a login line was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStep {
    /// Show the password prompt.
    PromptPassword,
    /// Look these credentials up, then call [`Session::authenticate`]
    /// or [`Session::login_failed`].
    Verify { username: String, password: String },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single client's session.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    remote_addr: SocketAddr,
    state: AuthState,
    /// At most one simulation per session; finished ones are reaped lazily.
    active_attack: Option<AttackHandle>,
}

impl Session {
    /// A new session waiting for a username.
    pub fn new(id: SessionId, remote_addr: SocketAddr) -> Self {
        Self {
            id,
            remote_addr,
            state: AuthState::Unauthenticated(AuthStage::AwaitingUsername),
            active_attack: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&UserRecord> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            AuthState::Unauthenticated(_) => None,
        }
    }

    /// Feeds one (already trimmed) line to the login handshake.
    ///
    /// A username line advances to the password stage. A password line
    /// hands both candidates back for lookup and returns the session to
    /// the username stage, so the candidates are gone whatever the
    /// lookup says.
    ///
    /// # Errors
    /// [`SessionError::AlreadyAuthenticated`] if the session is logged in.
    pub fn submit_login_line(&mut self, line: &str) -> Result<LoginStep, SessionError> {
        let AuthState::Unauthenticated(stage) = &mut self.state else {
            return Err(SessionError::AlreadyAuthenticated);
        };

        match std::mem::replace(stage, AuthStage::AwaitingUsername) {
            AuthStage::AwaitingUsername => {
                *stage = AuthStage::AwaitingPassword {
                    username: line.to_string(),
                };
                Ok(LoginStep::PromptPassword)
            }
            AuthStage::AwaitingPassword { username } => Ok(LoginStep::Verify {
                username,
                password: line.to_string(),
            }),
        }
    }

    /// Attaches the verified user. Terminal until disconnect.
    pub fn authenticate(&mut self, user: UserRecord) {
        tracing::info!(
            session_id = %self.id,
            user = %user.username,
            role = %user.role,
            "session authenticated"
        );
        self.state = AuthState::Authenticated(user);
    }

    /// Resets the handshake after a failed lookup.
    ///
    /// Has no effect on an authenticated session.
    pub fn login_failed(&mut self) {
        if let AuthState::Unauthenticated(stage) = &mut self.state {
            *stage = AuthStage::AwaitingUsername;
        }
    }

    /// The running simulation, if any. A simulation that has finished is
    /// dropped here, freeing the slot.
    pub fn active_attack(&mut self) -> Option<&AttackHandle> {
        if self.active_attack.as_ref().is_some_and(AttackHandle::is_finished) {
            self.active_attack = None;
        }
        self.active_attack.as_ref()
    }

    /// Checks that a new simulation may start.
    ///
    /// # Errors
    /// - [`SessionError::NotAuthenticated`] before login
    /// - [`SessionError::AttackInProgress`] while one is still running
    pub fn ensure_attack_slot_free(&mut self) -> Result<(), SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        match self.active_attack() {
            Some(running) => Err(SessionError::AttackInProgress {
                progress: running.progress(),
            }),
            None => Ok(()),
        }
    }

    /// Takes ownership of a freshly spawned simulation.
    ///
    /// # Errors
    /// Same as [`ensure_attack_slot_free`](Self::ensure_attack_slot_free).
    /// On error `handle` is dropped, which cancels it, so the
    /// one-simulation-per-session rule can't be broken from here.
    pub fn attach_attack(&mut self, handle: AttackHandle) -> Result<(), SessionError> {
        self.ensure_attack_slot_free()?;
        self.active_attack = Some(handle);
        Ok(())
    }

    /// Cancels whatever this session still has running. Called on every
    /// exit path of the connection handler.
    pub fn teardown(&mut self) {
        if let Some(attack) = self.active_attack.take() {
            attack.cancel();
        }
    }
}
