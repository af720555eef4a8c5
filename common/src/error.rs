use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Coordinates ({x}, {y}) are outside the board")]
    OutOfBounds { x: usize, y: usize },
    #[error("No board matched the first cell constraint after {attempts} regenerations")]
    GenerationExhausted { attempts: u32 },
    #[error("Invalid game parameters: {reason}")]
    InvalidParams { reason: &'static str },
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown cell action discriminant {0}")]
    UnknownAction(i32),
    #[error("Unknown game phase discriminant {0}")]
    UnknownPhase(i32),
}

pub type Result<T> = core::result::Result<T, GameError>;
