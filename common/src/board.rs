use serde::{Deserialize, Serialize};

use crate::{
    error::{GameError, Result},
    models::{CellKind, Mark, Pos},
};

const DISPLACEMENTS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    /// Only meaningful when `kind` is [`CellKind::Numbered`].
    pub adjacent: u8,
    pub mark: Mark,
    pub revealed: bool,
}

/// Fixed-size grid of cells stored row-major.
///
/// `mine_count` tracks cells whose kind is a mine (detonated or not) and `revealed_count`
/// tracks uncovered cells. Both are only changed through the generator, the reveal engine
/// and [`Board::reset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    mine_count: usize,
    revealed_count: usize,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
            mine_count: 0,
            revealed_count: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn validate_pos(&self, pos: Pos) -> Result<Pos> {
        if self.contains(pos) {
            Ok(pos)
        } else {
            Err(GameError::OutOfBounds { x: pos.x, y: pos.y })
        }
    }

    pub fn cell_at(&self, pos: Pos) -> Result<&Cell> {
        let pos = self.validate_pos(pos)?;
        Ok(&self.cells[self.index(pos)])
    }

    /// Sets the mark of a single cell, revealed or not.
    pub fn set_mark(&mut self, pos: Pos, mark: Mark) -> Result<()> {
        self.cell_mut(pos)?.mark = mark;
        Ok(())
    }

    /// Returns every cell to blank, covered and unmarked, and zeroes the counters.
    pub fn reset(&mut self) {
        self.cells.fill(Cell::default());
        self.mine_count = 0;
        self.revealed_count = 0;
    }

    /// Cells in row-major order together with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, &Cell)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (Pos::new(index % width, index / width), cell))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.width.max(1))
    }

    /// In-bounds coordinates of the up to eight cells surrounding `pos`.
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + use<> {
        let (width, height) = (self.width, self.height);
        DISPLACEMENTS.into_iter().filter_map(move |(dx, dy)| {
            let x = pos.x.checked_add_signed(dx).filter(|&x| x < width)?;
            let y = pos.y.checked_add_signed(dy).filter(|&y| y < height)?;
            Some(Pos::new(x, y))
        })
    }

    pub(crate) fn cell_mut(&mut self, pos: Pos) -> Result<&mut Cell> {
        let pos = self.validate_pos(pos)?;
        let index = self.index(pos);
        Ok(&mut self.cells[index])
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub(crate) fn set_mine_count(&mut self, mine_count: usize) {
        self.mine_count = mine_count;
    }

    pub(crate) fn record_reveal(&mut self) {
        self.revealed_count += 1;
    }

    fn index(&self, pos: Pos) -> usize {
        pos.x + pos.y * self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_board_is_blank_and_covered() {
        let board = Board::new(3, 2);

        assert_eq!(board.total_cells(), 6);
        assert_eq!(board.mine_count(), 0);
        assert_eq!(board.revealed_count(), 0);
        assert!(board.iter().all(|(_, cell)| *cell == Cell::default()));
    }

    #[test]
    fn cell_at_rejects_coordinates_past_either_edge() {
        let board = Board::new(3, 2);

        assert!(board.cell_at(Pos::new(2, 1)).is_ok());
        assert_eq!(
            board.cell_at(Pos::new(3, 0)),
            Err(GameError::OutOfBounds { x: 3, y: 0 })
        );
        assert_eq!(
            board.cell_at(Pos::new(0, 2)),
            Err(GameError::OutOfBounds { x: 0, y: 2 })
        );
    }

    #[test]
    fn neighbors_are_clipped_at_corners() {
        let board = Board::new(3, 3);

        assert_eq!(board.neighbors(Pos::new(0, 0)).count(), 3);
        assert_eq!(board.neighbors(Pos::new(1, 0)).count(), 5);
        assert_eq!(board.neighbors(Pos::new(1, 1)).count(), 8);
        assert!(!board.neighbors(Pos::new(1, 1)).any(|pos| pos == Pos::new(1, 1)));
    }

    #[test]
    fn set_mark_touches_only_the_target_cell() {
        let mut board = Board::new(2, 2);

        board.set_mark(Pos::new(1, 0), Mark::Flagged).unwrap();

        assert_eq!(board.cell_at(Pos::new(1, 0)).unwrap().mark, Mark::Flagged);
        assert_eq!(
            board.iter().filter(|(_, cell)| cell.mark != Mark::Cleared).count(),
            1
        );
        assert!(board.set_mark(Pos::new(2, 0), Mark::Flagged).is_err());
    }

    #[test]
    fn reset_clears_cells_and_counters() {
        let mut board = Board::new(2, 2);
        board.cell_mut(Pos::new(0, 0)).unwrap().kind = CellKind::Mine;
        board.set_mine_count(1);
        board.cell_mut(Pos::new(1, 1)).unwrap().revealed = true;
        board.record_reveal();
        board.set_mark(Pos::new(0, 1), Mark::Questioned).unwrap();

        board.reset();

        assert_eq!(board, Board::new(2, 2));
    }
}
