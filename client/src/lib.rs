//! Cooperative Minesweeper Client Library
//!
//! This library keeps one participant's board in step with every other participant
//! connected to the same relay. Peers exchange a fixed 20-byte packet once per tick: the
//! sender's cursor, at most one cell action and the seed its board was generated from.
//! Every peer replays the others' actions against its own seeded board, so all boards stay
//! identical without the relay knowing anything about the game.
//!
//! ## Usage
//!
//! ### Tick Loop (Recommended)
//!
//! `MultiplayerGame::run` drives the session at a fixed rate. Decoded input goes in through
//! an `mpsc` channel and a renderer reads snapshots from a `watch` channel:
//!
//! ```rust,no_run
//! use coopsweeper_client::{ClientConfig, Intent, MultiplayerGame, Pos};
//! use tokio::sync::{mpsc, watch};
//!
//! #[tokio::main]
//! async fn main() -> coopsweeper_client::Result<()> {
//!     let game = MultiplayerGame::connect(ClientConfig::from_env()).await?;
//!
//!     let (intents, intent_receiver) = mpsc::unbounded_channel();
//!     let (snapshots, mut snapshot_receiver) = watch::channel(game.snapshot());
//!     let tick_loop = tokio::spawn(game.run(intent_receiver, snapshots));
//!
//!     intents.send(Intent::Open { pos: Pos::new(4, 9) }).ok();
//!     snapshot_receiver.changed().await.ok();
//!     println!("Phase: {:?}", snapshot_receiver.borrow().phase);
//!
//!     drop(intents);
//!     tick_loop.await.ok();
//!     Ok(())
//! }
//! ```
//!
//! ### Single Ticks
//!
//! For more control, call `MultiplayerGame::tick` yourself:
//!
//! ```rust,no_run
//! use coopsweeper_client::{ClientConfig, Intent, MultiplayerGame, Pos};
//!
//! #[tokio::main]
//! async fn main() -> coopsweeper_client::Result<()> {
//!     let mut game = MultiplayerGame::connect(ClientConfig::default()).await?;
//!
//!     let report = game.tick(Some(Intent::ToggleMark { pos: Pos::new(0, 0) })).await?;
//!     println!("Received {} packets", report.received);
//!
//!     game.tick(None).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod connection;
mod error;
mod game;

pub use config::ClientConfig;
pub use connection::{Batch, PeerConnection};
pub use error::{ClientError, Result};
pub use game::{GameEvent, MultiplayerGame, PeerSlots, Snapshot, TickReport};

// Re-export common types for convenience
pub use coopsweeper_common::{
    Action, Board, Cell, CellKind, CursorPos, FirstCell, GameError, GameParams, GameSession,
    Intent, Mark, PACKET_SIZE, Packet, Phase, Pos,
};
