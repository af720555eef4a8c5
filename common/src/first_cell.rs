use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::{
    board::Board,
    error::{GameError, Result},
    generator::regenerate,
    models::{GameState, Mark, Phase, Pos},
    reveal::{RevealOutcome, reveal},
};

/// Makes sure the first opened cell has the kind the game state asks for.
///
/// Only acts while the phase is [`Phase::Start`]: the board is rebuilt with the same mine
/// count until the cell at `pos` matches, at most `max_regeneration_attempts` times, and
/// the phase then moves to [`Phase::Playing`]. Returns the number of regenerations.
#[instrument(level = "trace", skip(board, state, rng), fields(x = pos.x, y = pos.y))]
pub fn prepare_first_cell<R: Rng + ?Sized>(
    board: &mut Board,
    state: &mut GameState,
    pos: Pos,
    mines: usize,
    rng: &mut R,
) -> Result<u32> {
    let pos = board.validate_pos(pos)?;
    if state.phase != Phase::Start {
        return Ok(0);
    }

    let mut attempts = 0;
    while !state.first_cell.accepts(board.cell_at(pos)?.kind) {
        if attempts >= state.max_regeneration_attempts {
            warn!(
                "Gave up finding a {:?} first cell at ({}, {}) after {} regenerations",
                state.first_cell, pos.x, pos.y, attempts
            );
            return Err(GameError::GenerationExhausted { attempts });
        }
        regenerate(board, mines, rng);
        attempts += 1;
    }

    if attempts > 0 {
        debug!("First cell satisfied after {} regenerations", attempts);
    }
    state.phase = Phase::Playing;
    Ok(attempts)
}

/// Handles an open request: first-cell guard, then the flood-fill reveal.
///
/// Requests arriving after the game is over, or aimed at a flagged cell, change nothing.
pub fn open_cell<R: Rng + ?Sized>(
    board: &mut Board,
    state: &mut GameState,
    pos: Pos,
    mines: usize,
    rng: &mut R,
) -> Result<RevealOutcome> {
    let pos = board.validate_pos(pos)?;
    if !state.phase.is_open() {
        return Ok(RevealOutcome::NoChange);
    }

    prepare_first_cell(board, state, pos, mines, rng)?;

    if board.cell_at(pos)?.mark == Mark::Flagged {
        return Ok(RevealOutcome::NoChange);
    }
    Ok(reveal(board, pos, state))
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::models::{CellKind, FirstCell, GameParams};

    fn state(first_cell: FirstCell, max_regeneration_attempts: u32) -> GameState {
        GameState {
            phase: Phase::Start,
            first_cell,
            max_regeneration_attempts,
        }
    }

    fn fresh_board(seed: u64) -> (Board, StdRng) {
        let params = GameParams::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::new(params.width, params.height);
        regenerate(&mut board, params.mines, &mut rng);
        (board, rng)
    }

    #[test]
    fn first_open_lands_on_required_kind() {
        for seed in 0..10 {
            let (mut board, mut rng) = fresh_board(seed);
            let mut state = state(FirstCell::Blank, 10_000);
            let pos = Pos::new(4, 9);

            let outcome = open_cell(&mut board, &mut state, pos, 35, &mut rng).unwrap();

            assert_eq!(board.cell_at(pos).unwrap().kind, CellKind::Blank);
            assert!(board.cell_at(pos).unwrap().revealed);
            assert_ne!(outcome, RevealOutcome::HitMine);
            assert!(matches!(state.phase, Phase::Playing | Phase::Won));
        }
    }

    #[test]
    fn wildcard_never_regenerates() {
        let (mut board, mut rng) = fresh_board(3);
        let before = board.clone();
        let mut state = state(FirstCell::Any, 10_000);

        let attempts =
            prepare_first_cell(&mut board, &mut state, Pos::new(0, 0), 35, &mut rng).unwrap();

        assert_eq!(attempts, 0);
        assert_eq!(board, before);
        assert_eq!(state.phase, Phase::Playing);
    }

    #[test]
    fn impossible_constraint_exhausts_the_budget() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut board = Board::new(2, 2);
        regenerate(&mut board, 0, &mut rng);
        let mut state = state(FirstCell::Mine, 5);

        let result = prepare_first_cell(&mut board, &mut state, Pos::new(0, 0), 0, &mut rng);

        assert_eq!(result, Err(GameError::GenerationExhausted { attempts: 5 }));
        assert_eq!(state.phase, Phase::Start);
    }

    #[test]
    fn guard_is_skipped_once_playing() {
        let (mut board, mut rng) = fresh_board(5);
        let mut state = state(FirstCell::Blank, 0);
        state.phase = Phase::Playing;
        let before = board.clone();

        let attempts =
            prepare_first_cell(&mut board, &mut state, Pos::new(1, 1), 35, &mut rng).unwrap();

        assert_eq!(attempts, 0);
        assert_eq!(board, before);
    }

    #[test]
    fn finished_games_ignore_open_requests() {
        let (mut board, mut rng) = fresh_board(9);
        let mut state = state(FirstCell::Any, 0);
        state.phase = Phase::Lost;

        let outcome = open_cell(&mut board, &mut state, Pos::new(0, 0), 35, &mut rng).unwrap();

        assert_eq!(outcome, RevealOutcome::NoChange);
        assert_eq!(board.revealed_count(), 0);
    }

    #[test]
    fn open_out_of_bounds_is_an_error() {
        let (mut board, mut rng) = fresh_board(1);
        let mut state = state(FirstCell::Any, 0);

        assert_eq!(
            open_cell(&mut board, &mut state, Pos::new(10, 0), 35, &mut rng),
            Err(GameError::OutOfBounds { x: 10, y: 0 })
        );
    }
}
