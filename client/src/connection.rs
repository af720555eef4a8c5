use std::time::Duration;

use coopsweeper_common::{PACKET_SIZE, Packet, ProtocolError, decode_batch};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{ClientError, Result};

/// One decoded reply: an entry per peer slot, in slot order.
pub type Batch = Vec<std::result::Result<Packet, ProtocolError>>;

/// Fixed-frame packet stream to the relay.
///
/// Every sent frame is answered by exactly one reply. A reply is read until it ends on a
/// frame boundary, so slot indices always count from the start of the reply.
pub struct PeerConnection<S = TcpStream> {
    stream: S,
    buffer: Vec<u8>,
    pending: Vec<u8>,
    reply_outstanding: bool,
}

impl PeerConnection<TcpStream> {
    /// Connect to the relay at `addr`.
    pub async fn connect(addr: &str, max_peers: usize) -> Result<Self> {
        info!("Connecting to relay: {}", addr);

        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        info!("Relay connected");

        Ok(Self::new(stream, max_peers))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> PeerConnection<S> {
    /// Wrap an established stream; each read takes at most `max_peers` frames.
    pub fn new(stream: S, max_peers: usize) -> Self {
        Self {
            stream,
            buffer: vec![0; max_peers.max(1) * PACKET_SIZE],
            pending: Vec::new(),
            reply_outstanding: false,
        }
    }

    /// Write exactly one frame.
    ///
    /// If the previous receive was abandoned, whatever has arrived of that late reply is
    /// discarded first so it cannot be mistaken for the answer to this frame.
    pub async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        if self.reply_outstanding {
            self.discard_late_reply().await?;
        }

        self.stream.write_all(&packet.encode()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read the reply to the last sent frame and decode it.
    ///
    /// Reads continue while the bytes received so far end inside a frame. A read of zero
    /// bytes means the relay went away. Cancelling this future (for example on a timeout)
    /// keeps the bytes read so far until the next send discards them.
    pub async fn receive_batch(&mut self) -> Result<Batch> {
        self.reply_outstanding = true;

        loop {
            let read = self.stream.read(&mut self.buffer).await?;
            if read == 0 {
                info!("Relay closed the connection");
                return Err(ClientError::ConnectionClosed);
            }
            self.pending.extend_from_slice(&self.buffer[..read]);

            if self.pending.len() % PACKET_SIZE == 0 {
                break;
            }
            debug!("Holding {} bytes of a split frame", self.pending.len() % PACKET_SIZE);
        }

        let batch = decode_batch(&self.pending);
        self.pending.clear();
        self.reply_outstanding = false;
        Ok(batch)
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    async fn discard_late_reply(&mut self) -> Result<()> {
        let mut discarded = self.pending.len();
        self.pending.clear();

        while let Ok(read) = timeout(Duration::ZERO, self.stream.read(&mut self.buffer)).await {
            match read? {
                0 => return Err(ClientError::ConnectionClosed),
                read => discarded += read,
            }
        }

        if discarded > 0 {
            warn!("Discarded {} bytes of a late reply", discarded);
        }
        self.reply_outstanding = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use coopsweeper_common::{Action, CursorPos, Phase};
    use tokio_test::io::Builder;

    use super::*;

    fn packet(seed: u32) -> Packet {
        Packet {
            cursor: CursorPos { x: 108.0, y: 216.0 },
            action: Action::Opened,
            seed,
            phase: Phase::Playing,
        }
    }

    #[tokio::test]
    async fn send_writes_one_frame() {
        let mock = Builder::new().write(&packet(1).encode()).build();
        let mut connection = PeerConnection::new(mock, 4);

        connection.send_packet(&packet(1)).await.unwrap();
    }

    #[tokio::test]
    async fn split_reply_keeps_frames_in_their_slots() {
        let mut reply = packet(1).encode().to_vec();
        reply.extend_from_slice(&packet(2).encode());
        let mut next = packet(3).encode().to_vec();
        next.extend_from_slice(&packet(4).encode());
        let mock = Builder::new()
            .read(&reply[..27])
            .read(&reply[27..])
            .read(&next)
            .build();
        let mut connection = PeerConnection::new(mock, 4);

        let first = connection.receive_batch().await.unwrap();
        let second = connection.receive_batch().await.unwrap();

        assert_eq!(first, vec![Ok(packet(1)), Ok(packet(2))]);
        assert_eq!(second, vec![Ok(packet(3)), Ok(packet(4))]);
    }

    #[tokio::test]
    async fn late_reply_is_discarded_before_the_next_send() {
        let (client, mut relay) = tokio::io::duplex(256);
        let mut connection = PeerConnection::new(client, 4);

        let abandoned = timeout(Duration::from_millis(20), connection.receive_batch()).await;
        assert!(abandoned.is_err());
        relay.write_all(&packet(1).encode()[..12]).await.unwrap();
        tokio::task::yield_now().await;

        connection.send_packet(&packet(2)).await.unwrap();
        let mut frame = [0; PACKET_SIZE];
        relay.read_exact(&mut frame).await.unwrap();
        relay.write_all(&packet(3).encode()).await.unwrap();

        assert_eq!(frame, packet(2).encode());
        assert_eq!(connection.receive_batch().await.unwrap(), vec![Ok(packet(3))]);
    }

    #[tokio::test]
    async fn closed_stream_is_reported() {
        let (client, relay) = tokio::io::duplex(64);
        drop(relay);
        let mut connection = PeerConnection::new(client, 4);

        assert!(matches!(
            connection.receive_batch().await,
            Err(ClientError::ConnectionClosed)
        ));
    }
}
