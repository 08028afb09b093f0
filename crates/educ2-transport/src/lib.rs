//! Transport layer for EDU-C2.
//!
//! Everything the server says and hears travels as newline-framed text
//! over a plain TCP socket, so any terminal client (`telnet`, `nc`) can
//! talk to it. This crate owns the byte-level concerns:
//!
//! - **Accepting** connections ([`Transport`] trait, [`TcpLineTransport`])
//! - **Reading** one line at a time ([`LineReader`])
//! - **Writing** from many producers in order ([`Outbound`], [`spawn_writer`])
//!
//! # Output ordering
//!
//! A session has two producers of output: the command loop and, at most,
//! one background attack simulation. Both hold a clone of the same
//! [`Outbound`] handle, which feeds a single writer task. Whatever is
//! queued first is written first. The queue is bounded: a client that
//! stops reading eventually makes `send` wait instead of growing memory.
//!
//! ```text
//! command loop ──┐
//!                ├──→ Outbound (mpsc) ──→ writer task ──→ socket
//! attack task ───┘
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod outbound;
mod tcp;

pub use error::TransportError;
pub use outbound::{
    DEFAULT_OUTBOUND_CAPACITY, Outbound, WriterTask, spawn_writer, spawn_writer_with_capacity,
};
pub use tcp::{LineConnection, LineReader, LineWriter, TcpLineTransport};

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Longest line, in bytes and counting a trailing `\r`, that a
/// [`LineReader`] accepts by default.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection, used to tag log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique connection ID.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Send + 'static;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The address the transport is actually bound to.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}
