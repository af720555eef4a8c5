use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Relay I/O failure: {0}")]
    Io(#[from] std::io::Error),
}
