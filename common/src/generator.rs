use rand::Rng;
use tracing::{debug, warn};

use crate::{
    board::Board,
    models::{CellKind, Pos},
};

/// Places `mines` mines at independently drawn coordinates.
///
/// Draws may land on a cell that already holds a mine, in which case the placement is a
/// no-op and the board ends up with fewer mines than requested. Call [`derive_numbers`]
/// afterwards; it is the only place the board's mine count is established.
pub fn populate<R: Rng + ?Sized>(board: &mut Board, mines: usize, rng: &mut R) {
    if board.total_cells() == 0 {
        warn!("Cannot place mines on an empty board");
        return;
    }

    let (width, height) = (board.width(), board.height());
    for _ in 0..mines {
        let x = rng.random_range(0..width);
        let y = rng.random_range(0..height);
        if let Ok(cell) = board.cell_mut(Pos::new(x, y)) {
            cell.kind = CellKind::Mine;
        }
    }
}

/// Computes the hint of every non-mine cell and recounts the mines on the board.
pub fn derive_numbers(board: &mut Board) {
    let counts: Vec<Option<u8>> = board
        .iter()
        .map(|(pos, cell)| {
            if cell.kind.is_mine() {
                None
            } else {
                let adjacent = board
                    .neighbors(pos)
                    .filter(|&neighbor| {
                        board
                            .cell_at(neighbor)
                            .is_ok_and(|cell| cell.kind == CellKind::Mine)
                    })
                    .count();
                Some(adjacent as u8)
            }
        })
        .collect();

    let mut mine_count = 0;
    for (cell, count) in board.cells_mut().iter_mut().zip(counts) {
        match count {
            None => mine_count += 1,
            Some(0) => {
                cell.kind = CellKind::Blank;
                cell.adjacent = 0;
            }
            Some(adjacent) => {
                cell.kind = CellKind::Numbered;
                cell.adjacent = adjacent;
            }
        }
    }
    board.set_mine_count(mine_count);
}

/// Resets `board` and fills it with a fresh layout drawn from `rng`.
pub fn regenerate<R: Rng + ?Sized>(board: &mut Board, mines: usize, rng: &mut R) {
    board.reset();
    populate(board, mines, rng);
    derive_numbers(board);

    if board.mine_count() != mines {
        debug!(
            "Placement collisions reduced mines from {} to {}",
            mines,
            board.mine_count()
        );
    }
}
