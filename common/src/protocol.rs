//! Fixed-size packet exchanged between peers.
//!
//! Every frame is [`PACKET_SIZE`] bytes, little-endian, with no length prefix and no version
//! field:
//!
//! | offset | field    | type |
//! |--------|----------|------|
//! | 0      | cursor x | f32  |
//! | 4      | cursor y | f32  |
//! | 8      | action   | i32  |
//! | 12     | seed     | u32  |
//! | 16     | phase    | i32  |

use serde::{Deserialize, Serialize};

use crate::{
    error::ProtocolError,
    models::{Mark, Phase, Pos},
};

pub const PACKET_SIZE: usize = 20;

pub type Frame = [u8; PACKET_SIZE];

/// Cursor position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CursorPos {
    pub x: f32,
    pub y: f32,
}

impl CursorPos {
    /// Top-left pixel of the cell at `pos`.
    pub fn from_grid(pos: Pos, cell_size: u32) -> Self {
        Self {
            x: (pos.x as u64 * u64::from(cell_size)) as f32,
            y: (pos.y as u64 * u64::from(cell_size)) as f32,
        }
    }

    /// Cell under the cursor, or `None` for negative or non-finite coordinates.
    pub fn to_grid(self, cell_size: u32) -> Option<Pos> {
        if cell_size == 0 {
            return None;
        }
        let axis = |value: f32| {
            let cell = (value / cell_size as f32).floor();
            (cell.is_finite() && cell >= 0.0).then_some(cell as usize)
        };
        Some(Pos::new(axis(self.x)?, axis(self.y)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    None,
    Opened,
    Cleared,
    Flagged,
    Questioned,
}

impl Action {
    pub const fn to_wire(self) -> i32 {
        match self {
            Self::None => -1,
            Self::Opened => 0,
            Self::Cleared => 1,
            Self::Flagged => 2,
            Self::Questioned => 3,
        }
    }

    pub const fn from_wire(value: i32) -> Result<Self, ProtocolError> {
        Ok(match value {
            -1 => Self::None,
            0 => Self::Opened,
            1 => Self::Cleared,
            2 => Self::Flagged,
            3 => Self::Questioned,
            other => return Err(ProtocolError::UnknownAction(other)),
        })
    }

    /// The mark this action sets, if it is a mark action.
    pub const fn mark(self) -> Option<Mark> {
        match self {
            Self::Cleared => Some(Mark::Cleared),
            Self::Flagged => Some(Mark::Flagged),
            Self::Questioned => Some(Mark::Questioned),
            Self::None | Self::Opened => None,
        }
    }
}

impl From<Mark> for Action {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::Cleared => Self::Cleared,
            Mark::Flagged => Self::Flagged,
            Mark::Questioned => Self::Questioned,
        }
    }
}

impl Phase {
    pub const fn to_wire(self) -> i32 {
        match self {
            Self::Start => 0,
            Self::Playing => 1,
            Self::Won => 2,
            Self::Lost => 3,
        }
    }

    pub const fn from_wire(value: i32) -> Result<Self, ProtocolError> {
        Ok(match value {
            0 => Self::Start,
            1 => Self::Playing,
            2 => Self::Won,
            3 => Self::Lost,
            other => return Err(ProtocolError::UnknownPhase(other)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Packet {
    pub cursor: CursorPos,
    pub action: Action,
    pub seed: u32,
    pub phase: Phase,
}

impl Packet {
    pub fn encode(&self) -> Frame {
        let mut frame = [0; PACKET_SIZE];
        frame[0..4].copy_from_slice(&self.cursor.x.to_le_bytes());
        frame[4..8].copy_from_slice(&self.cursor.y.to_le_bytes());
        frame[8..12].copy_from_slice(&self.action.to_wire().to_le_bytes());
        frame[12..16].copy_from_slice(&self.seed.to_le_bytes());
        frame[16..20].copy_from_slice(&self.phase.to_wire().to_le_bytes());
        frame
    }

    pub fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        let word = |offset: usize| {
            [
                frame[offset],
                frame[offset + 1],
                frame[offset + 2],
                frame[offset + 3],
            ]
        };

        Ok(Self {
            cursor: CursorPos {
                x: f32::from_le_bytes(word(0)),
                y: f32::from_le_bytes(word(4)),
            },
            action: Action::from_wire(i32::from_le_bytes(word(8)))?,
            seed: u32::from_le_bytes(word(12)),
            phase: Phase::from_wire(i32::from_le_bytes(word(16)))?,
        })
    }
}

/// Decodes every whole frame in `bytes`, in order. Trailing bytes that do not fill a frame
/// are dropped. Each entry corresponds to one peer slot, so undecodable frames are kept as
/// errors rather than removed.
pub fn decode_batch(bytes: &[u8]) -> Vec<Result<Packet, ProtocolError>> {
    bytes
        .chunks_exact(PACKET_SIZE)
        .map(|chunk| {
            let mut frame = [0; PACKET_SIZE];
            frame.copy_from_slice(chunk);
            Packet::decode(&frame)
        })
        .collect()
}
