use std::io::ErrorKind;

use coopsweeper_common::{PACKET_SIZE, protocol::Frame};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{error::RelayError, relay::SharedRelay};

/// Accept peers forever, one task per connection.
pub async fn serve(listener: TcpListener, relay: SharedRelay) -> Result<(), RelayError> {
    info!("Relay listening on {}", listener.local_addr()?);

    loop {
        let (stream, addr) = listener.accept().await?;

        let Some(id) = relay.join() else {
            warn!("Dropping connection from {}: relay full", addr);
            continue;
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", addr, e);
        }
        info!("Peer {} connected from {}", id, addr);

        let relay = relay.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_peer(stream, &relay, id).await {
                error!("Peer {} failed: {}", id, e);
            }
            relay.leave(&id);
        });
    }
}

/// Store every frame the peer sends and answer it with the current snapshot of the other
/// peers. Returns once the peer hangs up.
#[instrument(level = "trace", skip(stream, relay))]
pub async fn handle_peer<S>(mut stream: S, relay: &SharedRelay, id: Uuid) -> Result<(), RelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut frame: Frame = [0; PACKET_SIZE];

    loop {
        match stream.read_exact(&mut frame).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                info!("Peer {} disconnected", id);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        relay.store(&id, frame);
        let reply = relay.reply_for(&id);
        debug!("Peer {}: relaying {} frames", id, reply.len() / PACKET_SIZE);

        stream.write_all(&reply).await?;
        stream.flush().await?;
    }
}
