//! TCP transport with newline framing.

use std::net::SocketAddr;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};

use crate::{ConnectionId, MAX_LINE_LENGTH, Transport, TransportError};

/// A [`Transport`] that accepts raw TCP connections.
pub struct TcpLineTransport {
    listener: TcpListener,
}

impl TcpLineTransport {
    /// Binds a new transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }
}

impl Transport for TcpLineTransport {
    type Connection = LineConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer_addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // Prompts are written without a trailing newline; don't let Nagle
        // hold them back.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer_addr, error = %e, "set_nodelay failed");
        }

        let id = ConnectionId::next();
        tracing::debug!(%id, %peer_addr, "accepted TCP connection");

        Ok(LineConnection {
            id,
            peer_addr,
            stream,
        })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A freshly accepted connection, not yet split into halves.
pub struct LineConnection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    stream: TcpStream,
}

impl LineConnection {
    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The remote address of the client.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Splits the socket so reading and writing can proceed independently.
    pub fn into_split(
        self,
    ) -> (LineReader<OwnedReadHalf>, LineWriter<OwnedWriteHalf>) {
        let (read, write) = self.stream.into_split();
        (LineReader::new(self.id, read), LineWriter::new(self.id, write))
    }
}

/// Reads newline-terminated lines from any async byte source.
///
/// A line may be at most `max_length` bytes long, so a client that never
/// sends a newline can't make the server buffer without limit.
pub struct LineReader<R> {
    id: ConnectionId,
    max_length: usize,
    frames: FramedRead<R, AnyDelimiterCodec>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Wraps a byte source, allowing lines up to [`MAX_LINE_LENGTH`].
    pub fn new(id: ConnectionId, inner: R) -> Self {
        Self::with_max_length(id, inner, MAX_LINE_LENGTH)
    }

    /// Wraps a byte source, allowing lines up to `max_length` bytes.
    pub fn with_max_length(id: ConnectionId, inner: R, max_length: usize) -> Self {
        // Byte-level framing: UTF-8 is decoded lossily afterwards, since
        // terminal clients may send option negotiation bytes.
        let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), max_length);
        Self {
            id,
            max_length,
            frames: FramedRead::new(inner, codec),
        }
    }

    /// Receives the next line, without its `\n` or `\r\n` terminator.
    ///
    /// Returns `Ok(None)` once the peer has closed its side. Bytes that
    /// are not valid UTF-8 are replaced rather than rejected.
    ///
    /// This method is cancel safe: a partially received line stays
    /// buffered for the next call, so it can be used inside `select!`.
    ///
    /// # Errors
    /// - [`TransportError::LineTooLong`] once a line exceeds the limit;
    ///   the reader is finished after that
    /// - [`TransportError::ReceiveFailed`] if the socket read fails
    pub async fn recv_line(&mut self) -> Result<Option<String>, TransportError> {
        match self.frames.next().await {
            Some(Ok(bytes)) => {
                let line = bytes.strip_suffix(b"\r").unwrap_or(&bytes[..]);
                Ok(Some(String::from_utf8_lossy(line).into_owned()))
            }
            Some(Err(AnyDelimiterCodecError::MaxChunkLengthExceeded)) => {
                tracing::debug!(id = %self.id, max = self.max_length, "line too long");
                Err(TransportError::LineTooLong {
                    max: self.max_length,
                })
            }
            Some(Err(AnyDelimiterCodecError::Io(e))) => {
                tracing::debug!(id = %self.id, error = %e, "read failed");
                Err(TransportError::ReceiveFailed(e))
            }
            None => Ok(None),
        }
    }
}

/// Writes text to any async byte sink.
pub struct LineWriter<W> {
    id: ConnectionId,
    inner: W,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    /// Wraps a byte sink.
    pub fn new(id: ConnectionId, inner: W) -> Self {
        Self { id, inner }
    }

    /// The connection this writer belongs to.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Writes `text` verbatim and flushes it.
    pub async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        self.inner
            .write_all(text.as_bytes())
            .await
            .map_err(TransportError::SendFailed)?;
        self.inner.flush().await.map_err(TransportError::SendFailed)
    }

    /// Shuts down the write side, signalling EOF to the peer.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.inner
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }
}
