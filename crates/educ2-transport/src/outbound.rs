//! The per-connection writer task and the handle that feeds it.

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{ConnectionId, LineWriter, TransportError};

/// Frames a connection's writer can have queued before senders wait.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// What travels from an [`Outbound`] handle to the writer task.
#[derive(Debug)]
enum Frame {
    Text(String),
    /// Flush everything queued so far, then shut the socket down.
    Close,
}

/// Join handle of a writer task. Resolves once the socket's write side
/// has been shut down (or a write failed).
pub type WriterTask = JoinHandle<Result<(), TransportError>>;

/// Cheap, cloneable handle for queueing text to one connection.
///
/// Text is written by the writer task in the order it was queued, across
/// all clones. The queue is bounded, so a peer that stops reading makes
/// senders wait rather than buffering without limit.
#[derive(Debug, Clone)]
pub struct Outbound {
    id: ConnectionId,
    tx: mpsc::Sender<Frame>,
}

impl Outbound {
    /// Queues `text` for writing, waiting for room if the queue is full.
    ///
    /// # Errors
    /// [`TransportError::ConnectionClosed`] if the writer task is gone,
    /// either because the session closed the connection or a previous
    /// write failed.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.tx
            .send(Frame::Text(text.into()))
            .await
            .map_err(|_| TransportError::ConnectionClosed(format!("{} writer stopped", self.id)))
    }

    /// Asks the writer to flush what is queued and close the connection.
    ///
    /// Idempotent. Sends queued after this call are discarded.
    pub async fn close(&self) {
        let _ = self.tx.send(Frame::Close).await;
    }

    /// Resolves once the writer task has stopped.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }

    /// Whether the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// The connection this handle writes to.
    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }
}

/// Spawns the writer task for a connection with room for
/// [`DEFAULT_OUTBOUND_CAPACITY`] queued frames.
///
/// The task ends when [`Outbound::close`] is called, when every clone of
/// the handle has been dropped, or when a write fails. It then drops its
/// receiver, so later sends fail fast instead of piling up.
pub fn spawn_writer<W>(writer: LineWriter<W>) -> (Outbound, WriterTask)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    spawn_writer_with_capacity(writer, DEFAULT_OUTBOUND_CAPACITY)
}

/// Like [`spawn_writer`], with an explicit queue capacity.
///
/// # Panics
/// If `capacity` is zero.
pub fn spawn_writer_with_capacity<W>(writer: LineWriter<W>, capacity: usize) -> (Outbound, WriterTask)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let id = writer.id();
    let (tx, rx) = mpsc::channel(capacity);
    let task = tokio::spawn(run_writer(writer, rx));
    (Outbound { id, tx }, task)
}

async fn run_writer<W>(
    mut writer: LineWriter<W>,
    mut rx: mpsc::Receiver<Frame>,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let id = writer.id();
    while let Some(frame) = rx.recv().await {
        match frame {
            Frame::Text(text) => {
                if let Err(e) = writer.send(&text).await {
                    tracing::debug!(%id, error = %e, "write failed, stopping writer");
                    return Err(e);
                }
            }
            Frame::Close => break,
        }
    }
    rx.close();
    tracing::trace!(%id, "writer closing connection");
    writer.shutdown().await
}
