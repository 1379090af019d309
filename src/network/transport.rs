//! Peer Transport
//!
//! One persistent byte stream between exactly two peers. Each frame is a
//! 4-byte big-endian length followed by that many bytes of command text.
//!
//! A spawned reader task blocks on the stream, decodes every complete frame
//! and pushes it onto a FIFO drained by the tick loop. A spawned writer task
//! drains the outbound queue. Any failure on either side is pushed onto the
//! FIFO as an error, so the tick loop sees it in order.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use super::protocol::{DuelMessage, ProtocolError};

/// Largest frame accepted by default.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// Length prefix size.
const HEADER_LEN: usize = 4;

/// Inbound FIFO depth before the reader stops pulling from the socket.
const INBOUND_QUEUE: usize = 64;

/// Transport failures. All of them end the duel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Peer closed the stream between frames.
    #[error("lost connection to peer")]
    ConnectionLost,

    /// Stream ended inside a frame.
    #[error("truncated frame: declared {declared} bytes, received {received}")]
    TruncatedFrame {
        /// Bytes promised by the header
        declared: usize,
        /// Bytes actually received
        received: usize,
    },

    /// Frame exceeds the configured maximum.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Frame length
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// Socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport tasks have stopped.
    #[error("transport closed")]
    Closed,

    /// Frame payload does not parse.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

// =============================================================================
// FRAMING
// =============================================================================

/// Read until `buf` is full or the stream ends. Returns bytes read.
async fn read_up_to<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Read one frame payload.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    match read_up_to(reader, &mut header).await? {
        0 => return Err(TransportError::ConnectionLost),
        HEADER_LEN => {}
        received => {
            return Err(TransportError::TruncatedFrame {
                declared: HEADER_LEN,
                received,
            })
        }
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > max_len {
        return Err(TransportError::FrameTooLarge { len, max: max_len });
    }

    let mut payload = vec![0u8; len];
    let received = read_up_to(reader, &mut payload).await?;
    if received < len {
        return Err(TransportError::TruncatedFrame {
            declared: len,
            received,
        });
    }
    Ok(payload)
}

/// Write one frame.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8], max_len: usize) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > max_len {
        return Err(TransportError::FrameTooLarge {
            len: payload.len(),
            max: max_len,
        });
    }
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and decode one message.
pub async fn read_message<R>(reader: &mut R, max_len: usize) -> Result<DuelMessage, TransportError>
where
    R: AsyncRead + Unpin,
{
    let payload = read_frame(reader, max_len).await?;
    let text = std::str::from_utf8(&payload).map_err(|_| ProtocolError::NonAscii)?;
    Ok(DuelMessage::decode(text)?)
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Connected peer with background reader and writer tasks.
pub struct Transport {
    peer: String,
    inbound: mpsc::Receiver<Result<DuelMessage, TransportError>>,
    outbound: mpsc::UnboundedSender<String>,
    reader: JoinHandle<()>,
}

impl Transport {
    /// Wrap any bidirectional stream.
    pub fn from_stream<S>(stream: S, peer: impl Into<String>, max_frame_len: usize) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let peer = peer.into();
        let (mut read_half, mut write_half) = tokio::io::split(stream);
        let (inbound_tx, inbound) = mpsc::channel(INBOUND_QUEUE);
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();

        // Reader: one frame at a time, in order
        let reader_tx = inbound_tx.clone();
        let reader_peer = peer.clone();
        let reader = tokio::spawn(async move {
            loop {
                let result = read_message(&mut read_half, max_frame_len).await;
                let fatal = result.is_err();
                if let Err(e) = &result {
                    error!(peer = %reader_peer, "Receive failed: {}", e);
                }
                if reader_tx.send(result).await.is_err() || fatal {
                    break;
                }
            }
        });

        // Writer: drains until the transport is dropped
        let writer_peer = peer.clone();
        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = write_frame(&mut write_half, text.as_bytes(), max_frame_len).await {
                    error!(peer = %writer_peer, "Send failed: {}", e);
                    let _ = inbound_tx.send(Err(e)).await;
                    break;
                }
            }
            let _ = write_half.shutdown().await;
        });

        Self {
            peer,
            inbound,
            outbound,
            reader,
        }
    }

    /// Accept exactly one peer on an already bound listener.
    #[instrument(skip(listener, max_frame_len))]
    pub async fn accept(listener: TcpListener, max_frame_len: usize) -> Result<Self, TransportError> {
        let (stream, addr) = listener.accept().await?;
        stream.set_nodelay(true)?;
        info!(%addr, "Peer connected");
        Ok(Self::from_stream(stream, addr.to_string(), max_frame_len))
    }

    /// Bind, then accept exactly one peer.
    #[instrument(skip(max_frame_len))]
    pub async fn listen(addr: SocketAddr, max_frame_len: usize) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Waiting for peer");
        Self::accept(listener, max_frame_len).await
    }

    /// Connect, retrying every `retry` until the listener accepts.
    #[instrument(skip(retry, max_frame_len))]
    pub async fn connect(
        addr: SocketAddr,
        retry: Duration,
        max_frame_len: usize,
    ) -> Result<Self, TransportError> {
        let stream = loop {
            match TcpStream::connect(addr).await {
                Ok(stream) => break stream,
                Err(e) => {
                    debug!(%addr, "Connect failed, retrying: {}", e);
                    tokio::time::sleep(retry).await;
                }
            }
        };
        stream.set_nodelay(true)?;
        info!(%addr, "Connected to peer");
        Ok(Self::from_stream(stream, addr.to_string(), max_frame_len))
    }

    /// Peer label for logs.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Encode and queue a message. Never blocks.
    pub fn send(&self, message: &DuelMessage) -> Result<(), TransportError> {
        let text = message.encode()?;
        debug!(peer = %self.peer, kind = %message.kind(), "Sending");
        self.outbound.send(text).map_err(|_| TransportError::Closed)
    }

    /// Pop the oldest received message without waiting.
    pub fn try_next(&mut self) -> Result<Option<DuelMessage>, TransportError> {
        match self.inbound.try_recv() {
            Ok(result) => result.map(Some),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(TransportError::Closed),
        }
    }

    /// Wait for the next received message.
    pub async fn next(&mut self) -> Result<DuelMessage, TransportError> {
        match self.inbound.recv().await {
            Some(result) => result,
            None => Err(TransportError::Closed),
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duel::action::DuelAction;
    use crate::duel::card::CardId;

    #[tokio::test]
    async fn test_frame_is_length_prefixed() {
        let (mut a, mut b) = tokio::io::duplex(256);
        write_frame(&mut a, b"COMMAND_TYPE;4;SEED;abc;", DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap();

        let mut header = [0u8; 4];
        b.read_exact(&mut header).await.unwrap();
        assert_eq!(header, [0, 0, 0, 24]);

        let mut body = vec![0u8; 24];
        b.read_exact(&mut body).await.unwrap();
        assert_eq!(&body, b"COMMAND_TYPE;4;SEED;abc;");
    }

    #[tokio::test]
    async fn test_truncated_frame_is_fatal() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        a.write_u32(500).await.unwrap();
        a.write_all(&[b'x'; 10]).await.unwrap();
        drop(a);

        match read_frame(&mut b, DEFAULT_MAX_FRAME_LEN).await {
            Err(TransportError::TruncatedFrame { declared, received }) => {
                assert_eq!(declared, 500);
                assert_eq!(received, 10);
            }
            other => panic!("expected truncated frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clean_close_is_connection_lost() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);
        assert!(matches!(
            read_frame(&mut b, DEFAULT_MAX_FRAME_LEN).await,
            Err(TransportError::ConnectionLost)
        ));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_u32(1_000_000).await.unwrap();
        assert!(matches!(
            read_frame(&mut b, 1024).await,
            Err(TransportError::FrameTooLarge { len: 1_000_000, max: 1024 })
        ));

        let (mut c, _d) = tokio::io::duplex(64);
        assert!(matches!(
            write_frame(&mut c, &[0u8; 32], 16).await,
            Err(TransportError::FrameTooLarge { len: 32, max: 16 })
        ));
    }

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let (a, b) = tokio::io::duplex(4096);
        let sender = Transport::from_stream(a, "a", DEFAULT_MAX_FRAME_LEN);
        let mut receiver = Transport::from_stream(b, "b", DEFAULT_MAX_FRAME_LEN);

        let messages = vec![
            DuelMessage::RngSeed("XY9Z".into()),
            DuelMessage::MainDeck(vec!["1001".into(), "1002".into()]),
            DuelMessage::Key { action: DuelAction::Draw, target: None },
            DuelMessage::Key {
                action: DuelAction::Flip,
                target: Some(CardId::from("aaaaaaaaaaaaaaa")),
            },
        ];
        for message in &messages {
            sender.send(message).unwrap();
        }
        for expected in messages {
            assert_eq!(receiver.next().await.unwrap(), expected);
        }
        assert!(receiver.try_next().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_stream_surfaces_as_error() {
        let (mut raw, b) = tokio::io::duplex(1024);
        let mut receiver = Transport::from_stream(b, "b", DEFAULT_MAX_FRAME_LEN);

        raw.write_u32(500).await.unwrap();
        raw.write_all(&[b'x'; 10]).await.unwrap();
        drop(raw);

        assert!(matches!(
            receiver.next().await,
            Err(TransportError::TruncatedFrame { declared: 500, received: 10 })
        ));
    }

    #[tokio::test]
    async fn test_malformed_payload_surfaces_as_error() {
        let (mut raw, b) = tokio::io::duplex(1024);
        let mut receiver = Transport::from_stream(b, "b", DEFAULT_MAX_FRAME_LEN);

        write_frame(&mut raw, b"COMMAND_TYPE;7;", DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap();

        assert!(matches!(
            receiver.next().await,
            Err(TransportError::Protocol(ProtocolError::UnknownCommandType(_)))
        ));
    }

    #[tokio::test]
    async fn test_tcp_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let host = tokio::spawn(Transport::accept(listener, DEFAULT_MAX_FRAME_LEN));
        let guest = Transport::connect(addr, Duration::from_millis(10), DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap();
        let mut host = host.await.unwrap().unwrap();

        guest.send(&DuelMessage::RngSeed("abc12345".into())).unwrap();
        assert_eq!(
            host.next().await.unwrap(),
            DuelMessage::RngSeed("abc12345".into())
        );
    }
}
