//! Shared game core for cooperative minesweeper.
//!
//! The board model, mine generation, flood-fill reveal and first-cell guard live here
//! together with the fixed-size packet that peers exchange. [`GameSession`] ties them
//! together: it owns one participant's board, state and seeded random source and applies
//! both local intents and peer packets to them.

pub mod board;
pub mod error;
pub mod first_cell;
pub mod generator;
pub mod models;
pub mod protocol;
pub mod reveal;
pub mod session;

pub use board::{Board, Cell};
pub use error::{GameError, ProtocolError};
pub use models::{CellKind, FirstCell, GameParams, GameState, Mark, Phase, Pos};
pub use protocol::{Action, CursorPos, PACKET_SIZE, Packet, decode_batch};
pub use reveal::RevealOutcome;
pub use session::{AppliedPacket, GameSession, Intent, RemoteEffect};
