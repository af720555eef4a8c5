use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    board::Board,
    error::Result,
    first_cell::open_cell,
    generator::regenerate,
    models::{GameParams, GameState, Mark, Phase, Pos},
    protocol::{Action, CursorPos, Packet},
    reveal::RevealOutcome,
};

/// A decoded local user intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum Intent {
    Move { pos: Pos },
    Open { pos: Pos },
    ToggleMark { pos: Pos },
    Restart,
}

/// What an inbound packet did to the local board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteEffect {
    Heartbeat,
    Revealed(RevealOutcome),
    Marked(Mark),
    /// The packet carried an action for a cell outside the board.
    Ignored,
    /// The packet still carried the seed this session restarted away from.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedPacket {
    pub seed_changed: bool,
    pub effect: RemoteEffect,
}

/// One participant's game: board, state and the random source behind the shared seed.
///
/// Every mutation goes through this type, whether it came from local input or from a
/// peer's packet, so that two sessions fed the same seed and the same actions end up with
/// the same board.
#[derive(Debug, Clone)]
pub struct GameSession {
    params: GameParams,
    board: Board,
    state: GameState,
    rng: StdRng,
    seed: u32,
    /// Seed left behind by the last local restart. Peers keep sending it until they hear
    /// the new one.
    retired_seed: Option<u32>,
    cursor: Pos,
}

impl GameSession {
    pub fn new(params: GameParams, seed: u32) -> Self {
        let mut session = Self {
            params,
            board: Board::new(params.width, params.height),
            state: GameState::new(&params),
            rng: rng_for(seed),
            seed,
            retired_seed: None,
            cursor: Pos::new(0, 0),
        };
        session.rebuild(seed);
        session
    }

    pub fn params(&self) -> &GameParams {
        &self.params
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn cursor(&self) -> Pos {
        self.cursor
    }

    pub fn cursor_pixels(&self) -> CursorPos {
        CursorPos::from_grid(self.cursor, self.params.cell_size)
    }

    /// Applies a local intent and returns the action to announce to peers.
    #[instrument(level = "trace", skip(self))]
    pub fn handle_input(&mut self, intent: Intent) -> Result<Action> {
        match intent {
            Intent::Move { pos } => {
                self.move_cursor(pos)?;
                Ok(Action::None)
            }
            Intent::Open { pos } => self.open(pos),
            Intent::ToggleMark { pos } => self.toggle_mark(pos),
            Intent::Restart => {
                self.restart();
                Ok(Action::None)
            }
        }
    }

    pub fn move_cursor(&mut self, pos: Pos) -> Result<()> {
        self.cursor = self.board.validate_pos(pos)?;
        Ok(())
    }

    /// Opens the cell at `pos` on behalf of the local player.
    pub fn open(&mut self, pos: Pos) -> Result<Action> {
        self.move_cursor(pos)?;
        if !self.state.phase.is_open() {
            debug!("Ignoring open at ({}, {}) in {:?}", pos.x, pos.y, self.state.phase);
            return Ok(Action::None);
        }

        open_cell(
            &mut self.board,
            &mut self.state,
            pos,
            self.params.mines,
            &mut self.rng,
        )?;

        if self.board.cell_at(pos)?.mark == Mark::Flagged {
            Ok(Action::None)
        } else {
            Ok(Action::Opened)
        }
    }

    /// Cycles the mark of a covered cell while playing; anywhere else the mark is cleared
    /// locally and nothing is announced.
    pub fn toggle_mark(&mut self, pos: Pos) -> Result<Action> {
        self.move_cursor(pos)?;
        let cell = *self.board.cell_at(pos)?;

        if self.state.phase == Phase::Playing && !cell.revealed {
            let mark = cell.mark.next();
            self.board.set_mark(pos, mark)?;
            debug!("Cell ({}, {}) marked {:?}", pos.x, pos.y, mark);
            Ok(mark.into())
        } else {
            self.board.set_mark(pos, Mark::Cleared)?;
            Ok(Action::None)
        }
    }

    /// Starts a new game on a seed drawn from the session's random source.
    ///
    /// The new seed goes out with the next packet, which moves every peer onto the same
    /// fresh board.
    pub fn restart(&mut self) -> u32 {
        let seed = self.rng.random();
        info!("Restarting game, seed {} -> {}", self.seed, seed);
        self.retired_seed = Some(self.seed);
        self.rebuild(seed);
        seed
    }

    /// Packet describing this participant for the current tick.
    pub fn outbound_packet(&self, action: Action) -> Packet {
        Packet {
            cursor: self.cursor_pixels(),
            action,
            seed: self.seed,
            phase: self.state.phase,
        }
    }

    /// Applies a peer's packet.
    ///
    /// A seed different from the tracked one resets the whole game onto that seed before
    /// the action is applied, unless it is the seed a local restart just left. Opens go through the first-cell guard; marks are set as is.
    #[instrument(level = "trace", skip(self))]
    pub fn apply_packet(&mut self, packet: &Packet) -> Result<AppliedPacket> {
        if packet.seed != self.seed && self.retired_seed == Some(packet.seed) {
            debug!("Ignoring packet on retired seed {}", packet.seed);
            return Ok(AppliedPacket {
                seed_changed: false,
                effect: RemoteEffect::Stale,
            });
        }

        let seed_changed = packet.seed != self.seed;
        if seed_changed {
            info!("Peer switched seed from {} to {}", self.seed, packet.seed);
            self.rebuild(packet.seed);
        }

        let target = packet
            .cursor
            .to_grid(self.params.cell_size)
            .filter(|&pos| self.board.contains(pos));

        let effect = match (packet.action, target) {
            (Action::None, _) => RemoteEffect::Heartbeat,
            (action, None) => {
                warn!(
                    "Ignoring {:?} at pixel ({}, {}) outside the board",
                    action, packet.cursor.x, packet.cursor.y
                );
                RemoteEffect::Ignored
            }
            (Action::Opened, Some(pos)) => {
                debug!("Peer opened ({}, {})", pos.x, pos.y);
                RemoteEffect::Revealed(open_cell(
                    &mut self.board,
                    &mut self.state,
                    pos,
                    self.params.mines,
                    &mut self.rng,
                )?)
            }
            (action, Some(pos)) => {
                let mark = action.mark().unwrap_or_default();
                debug!("Peer marked ({}, {}) {:?}", pos.x, pos.y, mark);
                self.board.set_mark(pos, mark)?;
                RemoteEffect::Marked(mark)
            }
        };

        Ok(AppliedPacket {
            seed_changed,
            effect,
        })
    }

    /// Applies a batch in slot order and returns how many packets reset the board.
    pub fn apply_batch<'a>(
        &mut self,
        packets: impl IntoIterator<Item = &'a Packet>,
    ) -> Result<usize> {
        let mut resets = 0;
        for packet in packets {
            if self.apply_packet(packet)?.seed_changed {
                resets += 1;
            }
        }
        Ok(resets)
    }

    fn rebuild(&mut self, seed: u32) {
        self.seed = seed;
        self.rng = rng_for(seed);
        self.state.phase = Phase::Start;
        regenerate(&mut self.board, self.params.mines, &mut self.rng);
    }
}

fn rng_for(seed: u32) -> StdRng {
    StdRng::seed_from_u64(u64::from(seed))
}
