use tracing::{debug, info};

use crate::{
    board::Board,
    models::{CellKind, GameState, Mark, Phase, Pos},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Uncovers `pos` and floods outward through blank cells.
///
/// Out-of-bounds, already revealed and flagged cells are skipped. Numbered cells bound the
/// flood, blank cells push all eight neighbours. Uncovering a mine detonates it and loses
/// the game; the win check runs after every other uncovered cell.
pub fn reveal(board: &mut Board, pos: Pos, state: &mut GameState) -> RevealOutcome {
    let total = board.total_cells();
    let mut outcome = RevealOutcome::NoChange;
    let mut pending = vec![pos];

    while let Some(pos) = pending.pop() {
        let Ok(cell) = board.cell_mut(pos) else {
            continue;
        };
        if cell.revealed || cell.mark == Mark::Flagged {
            continue;
        }

        cell.revealed = true;
        let kind = cell.kind;
        if kind == CellKind::Mine {
            cell.kind = CellKind::DetonatedMine;
        }
        board.record_reveal();

        match kind {
            CellKind::Mine => {
                info!("Mine detonated at ({}, {})", pos.x, pos.y);
                state.phase = Phase::Lost;
                outcome = RevealOutcome::HitMine;
                continue;
            }
            CellKind::DetonatedMine => continue,
            CellKind::Blank | CellKind::Numbered => {}
        }

        if board.revealed_count() + board.mine_count() == total {
            info!("All safe cells revealed");
            state.phase = Phase::Won;
            outcome = RevealOutcome::Won;
        } else if outcome == RevealOutcome::NoChange {
            outcome = RevealOutcome::Revealed;
        }

        if kind == CellKind::Blank {
            pending.extend(board.neighbors(pos));
        }
    }

    if outcome.has_update() {
        debug!(
            "Reveal from ({}, {}) finished with {:?}, {} cells uncovered",
            pos.x,
            pos.y,
            outcome,
            board.revealed_count()
        );
    }
    outcome
}
