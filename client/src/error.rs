use coopsweeper_common::GameError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport failure: {0}")]
    Transport(#[from] std::io::Error),
    #[error("Connection closed by the relay")]
    ConnectionClosed,
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
