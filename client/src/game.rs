use coopsweeper_common::{Action, Board, CursorPos, GameError, GameSession, Intent, Packet, Phase};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior, timeout};
use tracing::{debug, info, warn};

use crate::{ClientConfig, ClientError, PeerConnection, Result};

/// Events emitted by the tick loop
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A peer announced a new seed and the board was rebuilt from it
    BoardReset { seed: u32 },
    /// The local phase changed during a tick
    PhaseChanged { phase: Phase },
    /// A send or receive hit the network timeout; the tick carried no update
    NetworkTimeout,
    /// The first-cell guard gave up and the board was restarted
    GenerationExhausted { attempts: u32 },
    /// Connection was lost
    ConnectionLost,
}

/// Read-only view handed to a renderer after every tick
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub board: Board,
    pub phase: Phase,
    pub seed: u32,
    pub cursor: CursorPos,
    /// Cursor of every occupied peer slot, in slot order
    pub peers: Vec<CursorPos>,
}

/// Latest known packet of each peer slot; a newer packet overwrites the slot.
#[derive(Debug, Clone)]
pub struct PeerSlots {
    slots: Vec<Option<Packet>>,
}

impl PeerSlots {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Store `packet` in slot `index`. Indices past the capacity are dropped.
    pub fn update(&mut self, index: usize, packet: Packet) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(packet);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Packet> {
        self.slots.get(index)?.as_ref()
    }

    pub fn occupied(&self) -> impl Iterator<Item = (usize, &Packet)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|packet| (index, packet)))
    }

    pub fn cursors(&self) -> Vec<CursorPos> {
        self.occupied().map(|(_, packet)| packet.cursor).collect()
    }
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub sent: Option<Packet>,
    pub received: usize,
    pub resets: usize,
    pub timed_out: bool,
}

/// Tick-driven participant: applies local intents, exchanges one packet round with the
/// relay and reconciles the peers' packets into the local session.
pub struct MultiplayerGame<S = TcpStream> {
    config: ClientConfig,
    session: GameSession,
    connection: PeerConnection<S>,
    peers: PeerSlots,
    event_sender: Option<mpsc::UnboundedSender<GameEvent>>,
}

impl MultiplayerGame<TcpStream> {
    /// Connect to the relay named in `config` and set up a fresh session.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let connection = PeerConnection::connect(&config.server_addr, config.max_peers).await?;
        Ok(Self::with_connection(config, connection))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> MultiplayerGame<S> {
    pub fn with_connection(config: ClientConfig, connection: PeerConnection<S>) -> Self {
        info!(
            "Starting {}x{} game with {} mines, seed {}",
            config.game.width, config.game.height, config.game.mines, config.seed
        );
        Self {
            session: GameSession::new(config.game, config.seed),
            peers: PeerSlots::new(config.max_peers),
            config,
            connection,
            event_sender: None,
        }
    }

    /// Subscribe to game events. Returns a receiver for game events.
    pub fn subscribe_to_events(&mut self) -> mpsc::UnboundedReceiver<GameEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.event_sender = Some(sender);
        receiver
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn peers(&self) -> &PeerSlots {
        &self.peers
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.session.board().clone(),
            phase: self.session.phase(),
            seed: self.session.seed(),
            cursor: self.session.cursor_pixels(),
            peers: self.peers.cursors(),
        }
    }

    /// Run one tick: apply `intent`, send one packet, receive one batch and apply it.
    ///
    /// When the batch moved the session onto a peer's seed, a second heartbeat goes out in
    /// the same tick. Until then the relay still holds this peer's frame with the abandoned
    /// seed, and any peer reading it would switch back.
    ///
    /// A send or receive that exceeds the network timeout ends the tick early without an
    /// error. A send cut short this way may leave a partial frame on the stream.
    pub async fn tick(&mut self, intent: Option<Intent>) -> Result<TickReport> {
        let phase_before = self.session.phase();
        let mut report = TickReport::default();

        let action = match intent {
            Some(intent) => self.local_action(intent)?,
            None => Action::None,
        };

        let packet = self.session.outbound_packet(action);
        if packet.action != Action::None {
            debug!(
                "Sent packet: cursor ({}, {}), action {:?}",
                packet.cursor.x, packet.cursor.y, packet.action
            );
        }
        if !self.exchange(packet, &mut report).await? {
            return Ok(self.timed_out(report, phase_before));
        }

        if report.resets > 0 {
            let announce = self.session.outbound_packet(Action::None);
            debug!("Announcing adopted seed {}", announce.seed);
            if !self.exchange(announce, &mut report).await? {
                return Ok(self.timed_out(report, phase_before));
            }
        }

        self.emit_phase_change(phase_before);
        Ok(report)
    }

    /// Send `packet` and apply the reply. Returns `false` when either half timed out.
    async fn exchange(&mut self, packet: Packet, report: &mut TickReport) -> Result<bool> {
        let network_timeout = self.config.network_timeout();
        match timeout(network_timeout, self.connection.send_packet(&packet)).await {
            Ok(sent) => sent?,
            Err(_) => return Ok(false),
        }
        if report.sent.is_none() {
            report.sent = Some(packet);
        }

        let batch = match timeout(network_timeout, self.connection.receive_batch()).await {
            Ok(batch) => batch?,
            Err(_) => return Ok(false),
        };

        for (slot, frame) in batch.into_iter().enumerate() {
            let packet = match frame {
                Ok(packet) => packet,
                Err(e) => {
                    warn!("Skipping undecodable packet in slot {}: {}", slot, e);
                    continue;
                }
            };

            if !self.peers.update(slot, packet) {
                warn!("Dropping packet for slot {} beyond capacity", slot);
                continue;
            }
            report.received += 1;

            if packet.action != Action::None {
                debug!(
                    "Packet {}: cursor ({}, {}), action {:?}",
                    slot, packet.cursor.x, packet.cursor.y, packet.action
                );
            }

            match self.session.apply_packet(&packet) {
                Ok(applied) => {
                    if applied.seed_changed {
                        report.resets += 1;
                        self.emit(GameEvent::BoardReset { seed: packet.seed });
                    }
                }
                Err(GameError::GenerationExhausted { attempts }) => {
                    self.recover_exhausted(attempts);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(true)
    }

    /// Tick at the configured rate until the intent sender is dropped, publishing a
    /// snapshot after every tick. At most one intent is consumed per tick.
    pub async fn run(
        mut self,
        mut intents: mpsc::UnboundedReceiver<Intent>,
        snapshots: watch::Sender<Snapshot>,
    ) -> Result<()> {
        let mut interval = time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Tick loop running at {} Hz", self.config.tick_rate);

        loop {
            interval.tick().await;

            let intent = match intents.try_recv() {
                Ok(intent) => Some(intent),
                Err(mpsc::error::TryRecvError::Empty) => None,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    info!("Input closed, stopping tick loop");
                    return Ok(());
                }
            };

            match self.tick(intent).await {
                Ok(_) => {}
                Err(ClientError::Game(e)) => warn!("Rejected local input: {}", e),
                Err(e) => {
                    warn!("Tick failed: {}", e);
                    self.emit(GameEvent::ConnectionLost);
                    return Err(e);
                }
            }

            snapshots.send_replace(self.snapshot());
        }
    }

    fn local_action(&mut self, intent: Intent) -> Result<Action> {
        match self.session.handle_input(intent) {
            Ok(action) => Ok(action),
            Err(GameError::GenerationExhausted { attempts }) => {
                self.recover_exhausted(attempts);
                Ok(Action::None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn recover_exhausted(&mut self, attempts: u32) {
        let seed = self.session.restart();
        warn!(
            "First cell constraint not met after {} regenerations, restarting on seed {}",
            attempts, seed
        );
        self.emit(GameEvent::GenerationExhausted { attempts });
    }

    fn timed_out(&mut self, mut report: TickReport, phase_before: Phase) -> TickReport {
        warn!(
            "Network round exceeded {} ms, no update this tick",
            self.config.network_timeout_ms
        );
        report.timed_out = true;
        self.emit(GameEvent::NetworkTimeout);
        self.emit_phase_change(phase_before);
        report
    }

    fn emit_phase_change(&self, phase_before: Phase) {
        let phase = self.session.phase();
        if phase != phase_before {
            info!("Phase changed from {:?} to {:?}", phase_before, phase);
            self.emit(GameEvent::PhaseChanged { phase });
        }
    }

    fn emit(&self, event: GameEvent) {
        if let Some(ref sender) = self.event_sender {
            let _ = sender.send(event);
        }
    }
}
