use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Grid coordinate of a cell, `x` counted from the left and `y` from the top.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// What a cell holds underneath its cover.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    #[default]
    Blank,
    Numbered,
    Mine,
    DetonatedMine,
}

impl CellKind {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine | Self::DetonatedMine)
    }
}

/// Player annotation on a covered cell.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    #[default]
    Cleared,
    Flagged,
    Questioned,
}

impl Mark {
    /// Cleared -> Flagged -> Questioned -> Cleared.
    pub const fn next(self) -> Self {
        match self {
            Self::Cleared => Self::Flagged,
            Self::Flagged => Self::Questioned,
            Self::Questioned => Self::Cleared,
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Start,
    Playing,
    Won,
    Lost,
}

impl Phase {
    /// Whether a reveal request is still accepted.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Start | Self::Playing)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Constraint on the kind of the very first opened cell.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FirstCell {
    Any,
    #[default]
    Blank,
    Numbered,
    Mine,
}

impl FirstCell {
    pub const fn accepts(self, kind: CellKind) -> bool {
        match self {
            Self::Any => true,
            Self::Blank => matches!(kind, CellKind::Blank),
            Self::Numbered => matches!(kind, CellKind::Numbered),
            Self::Mine => matches!(kind, CellKind::Mine),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameParams {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
    /// Edge length of one cell in pixels; cursor positions on the wire are in pixels.
    pub cell_size: u32,
    pub first_cell: FirstCell,
    pub max_regeneration_attempts: u32,
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            width: 10,
            height: 18,
            mines: 35,
            cell_size: 108,
            first_cell: FirstCell::Blank,
            max_regeneration_attempts: 10_000,
        }
    }
}

impl GameParams {
    pub const fn total_cells(&self) -> usize {
        self.width * self.height
    }

    /// Rejects sizes that leave no board to play on or no way to map a cursor to a cell.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.width == 0 || self.height == 0 {
            "board needs at least one row and one column"
        } else if self.cell_size == 0 {
            "cell size must be at least one pixel"
        } else {
            return Ok(());
        };
        Err(GameError::InvalidParams { reason })
    }
}

/// Per-participant game state, kept consistent with peers through the shared seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub phase: Phase,
    pub first_cell: FirstCell,
    pub max_regeneration_attempts: u32,
}

impl GameState {
    pub fn new(params: &GameParams) -> Self {
        Self {
            phase: Phase::Start,
            first_cell: params.first_cell,
            max_regeneration_attempts: params.max_regeneration_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_cycles_through_all_states() {
        assert_eq!(Mark::Cleared.next(), Mark::Flagged);
        assert_eq!(Mark::Flagged.next(), Mark::Questioned);
        assert_eq!(Mark::Questioned.next(), Mark::Cleared);
    }

    #[test]
    fn any_accepts_every_kind() {
        for kind in [CellKind::Blank, CellKind::Numbered, CellKind::Mine] {
            assert!(FirstCell::Any.accepts(kind));
        }
        assert!(!FirstCell::Blank.accepts(CellKind::Numbered));
        assert!(FirstCell::Numbered.accepts(CellKind::Numbered));
    }

    #[test]
    fn degenerate_params_are_rejected() {
        assert!(GameParams::default().validate().is_ok());
        for params in [
            GameParams {
                width: 0,
                ..GameParams::default()
            },
            GameParams {
                height: 0,
                ..GameParams::default()
            },
            GameParams {
                cell_size: 0,
                ..GameParams::default()
            },
        ] {
            assert!(matches!(
                params.validate(),
                Err(GameError::InvalidParams { .. })
            ));
        }
    }

    #[test]
    fn params_fill_missing_fields_with_defaults() {
        let params: GameParams =
            serde_json::from_str(r#"{ "width": 4, "first_cell": "any" }"#).unwrap();

        assert_eq!(params.width, 4);
        assert_eq!(params.height, 18);
        assert_eq!(params.mines, 35);
        assert_eq!(params.first_cell, FirstCell::Any);
    }
}
