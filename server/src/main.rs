use coopsweeper_server::{config::RelayConfig, error::RelayError, peer::serve, relay::Relay};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    tracing_subscriber::fmt::init();
    info!("🚀 Starting cooperative minesweeper relay");

    let config = RelayConfig::from_env();
    let relay = Relay::new(config.max_clients);
    let listener = TcpListener::bind(&config.bind_addr).await?;

    info!(
        "📡 Relaying fixed frames for up to {} peers",
        config.max_clients
    );

    serve(listener, relay).await
}
