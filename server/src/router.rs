//! Per-connection outbound queues
//!
//! Every connected player owns one unbounded FIFO queue. The authority pushes packets onto the
//! queue and a network writer task drains it, so each connection sees packets in exactly the
//! order they were pushed. There is no ordering across connections and no acknowledgement: a
//! packet addressed to a connection that is gone is dropped.

use log::{debug, info};
use parking_lot::RwLock;
use shared::{Packet, PlayerId};
use std::collections::HashMap;
use tokio::sync::mpsc;

pub type Outbound = mpsc::UnboundedReceiver<Packet>;

pub struct Router {
    connections: RwLock<HashMap<PlayerId, mpsc::UnboundedSender<Packet>>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Opens the outbound queue for `player_id`, replacing any previous one.
    pub fn register(&self, player_id: PlayerId) -> Outbound {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.connections.write().insert(player_id, tx).is_some() {
            info!("Replaced outbound queue for player {}", player_id);
        }
        rx
    }

    pub fn unregister(&self, player_id: &PlayerId) -> bool {
        self.connections.write().remove(player_id).is_some()
    }

    /// Queues `packet` for a single connection. Returns false if nobody is listening.
    pub fn send_to(&self, player_id: PlayerId, packet: Packet) -> bool {
        let connections = self.connections.read();
        match connections.get(&player_id) {
            Some(tx) => tx.send(packet).is_ok(),
            None => {
                debug!("Dropping packet for unknown player {}", player_id);
                false
            }
        }
    }

    /// Queues `packet` for every connection. Returns how many queues accepted it.
    pub fn broadcast(&self, packet: &Packet) -> usize {
        let connections = self.connections.read();
        connections
            .values()
            .filter(|tx| tx.send(packet.clone()).is_ok())
            .count()
    }

    /// Closes every outbound queue. Packets already queued are still delivered.
    pub fn close_all(&self) -> usize {
        let mut connections = self.connections.write();
        let closed = connections.len();
        connections.clear();
        closed
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
