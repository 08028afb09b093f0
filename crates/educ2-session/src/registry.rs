//! The live session registry.
//!
//! A map from [`SessionId`] to a small read-only summary of each
//! connection. It exists for aggregate figures (`stats`) and lifecycle
//! logging; it never hands out access to another session's state.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is a plain `HashMap`, not a concurrent map. The
//! server keeps one behind a `tokio::sync::Mutex` and every connection
//! task takes the lock briefly to register, update, or remove itself.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::{SessionError, SessionId};

/// What the registry knows about one live session.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub id: SessionId,
    pub remote_addr: SocketAddr,
    pub connected_at: Instant,
    /// Set once the session has logged in.
    pub username: Option<String>,
}

impl SessionEntry {
    /// How long the session has been connected.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Tracks every session currently connected to the server.
///
/// ```text
/// register() ──→ mark_authenticated() ──→ remove()
///     │                                      ▲
///     └──────────── (never logged in) ───────┘
/// ```
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, SessionEntry>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly accepted connection and returns its fresh ID.
    pub fn register(&mut self, remote_addr: SocketAddr) -> SessionId {
        // 64 random bits; a collision is astronomically unlikely, but
        // retrying costs nothing.
        let id = loop {
            let candidate = SessionId::generate();
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        self.sessions.insert(
            id.clone(),
            SessionEntry {
                id: id.clone(),
                remote_addr,
                connected_at: Instant::now(),
                username: None,
            },
        );
        tracing::info!(session_id = %id, %remote_addr, live = self.sessions.len(), "session registered");
        id
    }

    /// Records that a session has logged in as `username`.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the session isn't registered.
    pub fn mark_authenticated(
        &mut self,
        id: &SessionId,
        username: &str,
    ) -> Result<(), SessionError> {
        let entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        entry.username = Some(username.to_string());
        tracing::debug!(
            session_id = %id,
            user = username,
            logged_in = self.authenticated_count(),
            "registry entry authenticated"
        );
        Ok(())
    }

    /// Removes a session, returning its last entry.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the session isn't registered
    /// (e.g. removed twice).
    pub fn remove(&mut self, id: &SessionId) -> Result<SessionEntry, SessionError> {
        let entry = self
            .sessions
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        tracing::info!(
            session_id = %id,
            user = entry.username.as_deref().unwrap_or("-"),
            connected_secs = entry.age().as_secs(),
            live = self.sessions.len(),
            logged_in = self.authenticated_count(),
            "session removed"
        );
        Ok(entry)
    }

    /// Number of live sessions (logged in or not).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of live sessions that have logged in.
    pub fn authenticated_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|e| e.username.is_some())
            .count()
    }
}

// =========================================================================
// Tests
// =========================================================================
