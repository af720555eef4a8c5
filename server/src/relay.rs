use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use coopsweeper_common::protocol::Frame;
use dashmap::DashMap;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub type SharedRelay = Arc<Relay>;

struct Slot {
    order: u64,
    frame: Option<Frame>,
}

/// Latest frame of every connected peer. Frames are stored and forwarded as opaque bytes.
pub struct Relay {
    slots: DashMap<Uuid, Slot>,
    connected: AtomicUsize,
    next_order: AtomicU64,
    max_clients: usize,
}

impl Relay {
    pub fn new(max_clients: usize) -> SharedRelay {
        Arc::new(Self {
            slots: DashMap::new(),
            connected: AtomicUsize::new(0),
            next_order: AtomicU64::new(0),
            max_clients,
        })
    }

    /// Reserve a slot for a new peer, or `None` when the relay is full.
    pub fn join(&self) -> Option<Uuid> {
        let admitted = self
            .connected
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |connected| {
                (connected < self.max_clients).then_some(connected + 1)
            })
            .is_ok();
        if !admitted {
            warn!("Relay full, rejecting peer ({} slots)", self.max_clients);
            return None;
        }

        let id = Uuid::new_v4();
        let order = self.next_order.fetch_add(1, Ordering::Relaxed);
        self.slots.insert(id, Slot { order, frame: None });
        info!("Peer {} joined, {} connected", id, self.connected_peers());
        Some(id)
    }

    pub fn leave(&self, id: &Uuid) {
        if self.slots.remove(id).is_some() {
            self.connected.fetch_sub(1, Ordering::AcqRel);
            info!("Peer {} left, {} connected", id, self.connected_peers());
        }
    }

    pub fn connected_peers(&self) -> usize {
        self.connected.load(Ordering::Acquire)
    }

    /// Overwrite the peer's slot with its newest frame.
    pub fn store(&self, id: &Uuid, frame: Frame) {
        if let Some(mut slot) = self.slots.get_mut(id) {
            slot.frame = Some(frame);
        }
    }

    /// Concatenated latest frames of every other peer, in join order. A peer that is alone
    /// gets its own frame back.
    #[instrument(level = "trace", skip(self))]
    pub fn reply_for(&self, id: &Uuid) -> Vec<u8> {
        let mut others: Vec<(u64, Frame)> = self
            .slots
            .iter()
            .filter(|entry| entry.key() != id)
            .filter_map(|entry| entry.frame.map(|frame| (entry.order, frame)))
            .collect();

        if others.is_empty() {
            let own = self.slots.get(id).and_then(|slot| slot.frame);
            debug!("No other peers, echoing own frame");
            return own.map(|frame| frame.to_vec()).unwrap_or_default();
        }

        others.sort_by_key(|(order, _)| *order);
        others.into_iter().flat_map(|(_, frame)| frame).collect()
    }
}

#[cfg(test)]
mod tests {
    use coopsweeper_common::PACKET_SIZE;

    use super::*;

    fn frame(byte: u8) -> Frame {
        [byte; PACKET_SIZE]
    }

    #[test]
    fn reply_lists_other_peers_in_join_order() {
        let relay = Relay::new(4);
        let first = relay.join().unwrap();
        let second = relay.join().unwrap();
        let third = relay.join().unwrap();
        relay.store(&third, frame(3));
        relay.store(&first, frame(1));
        relay.store(&second, frame(2));

        let reply = relay.reply_for(&second);

        assert_eq!(reply.len(), 2 * PACKET_SIZE);
        assert_eq!(&reply[..PACKET_SIZE], &frame(1));
        assert_eq!(&reply[PACKET_SIZE..], &frame(3));
    }

    #[test]
    fn lone_peer_gets_its_own_frame() {
        let relay = Relay::new(4);
        let only = relay.join().unwrap();
        relay.store(&only, frame(9));

        assert_eq!(relay.reply_for(&only), frame(9).to_vec());
    }

    #[test]
    fn peers_without_frames_are_skipped() {
        let relay = Relay::new(4);
        let sender = relay.join().unwrap();
        let _silent = relay.join().unwrap();
        relay.store(&sender, frame(5));

        assert_eq!(relay.reply_for(&sender), frame(5).to_vec());
    }

    #[test]
    fn newest_frame_overwrites_the_slot() {
        let relay = Relay::new(4);
        let sender = relay.join().unwrap();
        let other = relay.join().unwrap();
        relay.store(&other, frame(1));
        relay.store(&other, frame(2));

        assert_eq!(relay.reply_for(&sender), frame(2).to_vec());
    }

    #[test]
    fn capacity_is_enforced_and_released() {
        let relay = Relay::new(1);
        let first = relay.join().unwrap();

        assert!(relay.join().is_none());
        relay.leave(&first);
        assert_eq!(relay.connected_peers(), 0);
        assert!(relay.join().is_some());
    }
}
