//! Score ledger: the authoritative list of player scores
//!
//! Scores live in a `ReplicatedList<PlayerRecord>`, one record per player id. Each change is
//! forwarded to every connection as a `LedgerSync` event so client replicas stay in step, while
//! the new score itself is announced only to the player it belongs to via `ScoreNotice`.
//!
//! The list lock is held while events are queued onto the outbound queues, so every connection
//! receives ledger events in the order they were produced.

use crate::router::{Outbound, Router};
use log::{debug, info};
use parking_lot::Mutex;
use shared::{truncate_name, ListEvent, Packet, PlayerId, PlayerRecord, ReplicatedList};
use std::sync::Arc;

pub struct ScoreLedger {
    scores: Mutex<ReplicatedList<PlayerRecord>>,
    router: Arc<Router>,
}

impl ScoreLedger {
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            scores: Mutex::new(ReplicatedList::new()),
            router,
        }
    }

    /// Opens the player's outbound queue and seeds it with the whole current ledger: a `Clear`
    /// followed by one `Add` per record. The list lock is held throughout, so the seed sits ahead
    /// of every later event on that queue.
    pub fn attach(&self, player_id: PlayerId) -> Outbound {
        let scores = self.scores.lock();
        let outbound = self.router.register(player_id);

        self.router.send_to(
            player_id,
            Packet::LedgerSync {
                event: ListEvent::Clear,
            },
        );
        for record in scores.items() {
            self.router.send_to(
                player_id,
                Packet::LedgerSync {
                    event: ListEvent::Add {
                        item: record.clone(),
                    },
                },
            );
        }

        debug!("Seeded player {} with {} ledger records", player_id, scores.len());
        outbound
    }

    /// Adds `points` to the player's score, creating the record on first sight.
    ///
    /// `display_name` only fills in a blank name; an existing name is never overwritten.
    /// Negative points decrement the score.
    pub fn award(&self, player_id: PlayerId, points: i32, display_name: &str) {
        let mut scores = self.scores.lock();

        match scores.position(|record| record.player_id == player_id) {
            Some(index) => {
                let existing = &scores.items()[index];
                let display_name = if existing.has_name() {
                    existing.display_name.clone()
                } else {
                    truncate_name(display_name)
                };
                let updated = PlayerRecord {
                    player_id,
                    display_name,
                    score: existing.score.saturating_add(points),
                };
                scores.update_at(index, updated);
            }
            None => scores.add(PlayerRecord::new(player_id, display_name, points)),
        }

        self.publish(&mut scores);
    }

    /// Clears every record. Used at session teardown.
    pub fn reset(&self) {
        let mut scores = self.scores.lock();
        scores.clear();
        self.publish(&mut scores);
    }

    fn publish(&self, scores: &mut ReplicatedList<PlayerRecord>) {
        for event in scores.drain_events() {
            let notice = match &event {
                ListEvent::Add { item } => {
                    info!(
                        "Player added: id={}, name={:?}, score={}",
                        item.player_id, item.display_name, item.score
                    );
                    Some((item.player_id, item.score))
                }
                ListEvent::Update { item, .. } => {
                    info!(
                        "Player score updated: id={}, name={:?}, score={}",
                        item.player_id, item.display_name, item.score
                    );
                    Some((item.player_id, item.score))
                }
                ListEvent::Remove { item, .. } => {
                    info!("Player removed: id={}", item.player_id);
                    None
                }
                ListEvent::Clear => {
                    info!("Player scores reset");
                    None
                }
            };

            self.router.broadcast(&Packet::LedgerSync { event });

            if let Some((player_id, score)) = notice {
                if !self.router.send_to(player_id, Packet::ScoreNotice { player_id, score }) {
                    debug!("Player {} has no connection for score notice", player_id);
                }
            }
        }
    }

    pub fn record(&self, player_id: PlayerId) -> Option<PlayerRecord> {
        self.scores
            .lock()
            .items()
            .iter()
            .find(|record| record.player_id == player_id)
            .cloned()
    }

    /// The player's display name, if one has been set.
    pub fn display_name(&self, player_id: PlayerId) -> Option<String> {
        self.record(player_id)
            .filter(PlayerRecord::has_name)
            .map(|record| record.display_name)
    }

    pub fn snapshot(&self) -> Vec<PlayerRecord> {
        self.scores.lock().items().to_vec()
    }

    pub fn len(&self) -> usize {
        self.scores.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Outbound;
    use shared::ListReplica;

    fn drain(rx: &mut Outbound) -> Vec<Packet> {
        let mut packets = Vec::new();
        while let Ok(packet) = rx.try_recv() {
            packets.push(packet);
        }
        packets
    }

    fn apply_syncs(packets: Vec<Packet>, replica: &mut ListReplica<PlayerRecord>) {
        for packet in packets {
            if let Packet::LedgerSync { event } = packet {
                replica.apply_event(event);
            }
        }
    }

    fn notices(packets: &[Packet]) -> Vec<(PlayerId, i32)> {
        packets
            .iter()
            .filter_map(|packet| match packet {
                Packet::ScoreNotice { player_id, score } => Some((*player_id, *score)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_award_creates_then_accumulates() {
        let ledger = ScoreLedger::new(Arc::new(Router::new()));

        ledger.award(1, 10, "Nox");
        ledger.award(1, 5, "");
        ledger.award(1, -3, "");

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.record(1), Some(PlayerRecord::new(1, "Nox", 12)));
    }

    #[test]
    fn test_first_name_wins() {
        let ledger = ScoreLedger::new(Arc::new(Router::new()));

        ledger.award(1, 0, "Alice");
        ledger.award(1, 0, "Bob");

        assert_eq!(ledger.display_name(1).as_deref(), Some("Alice"));
    }

    #[test]
    fn test_blank_name_is_backfilled() {
        let ledger = ScoreLedger::new(Arc::new(Router::new()));

        ledger.award(1, 20, "");
        assert_eq!(ledger.display_name(1), None);

        ledger.award(1, 0, "Nox");
        assert_eq!(ledger.record(1), Some(PlayerRecord::new(1, "Nox", 20)));
    }

    #[test]
    fn test_score_saturates_instead_of_overflowing() {
        let ledger = ScoreLedger::new(Arc::new(Router::new()));
        ledger.award(1, i32::MAX, "");
        ledger.award(1, 1, "");
        assert_eq!(ledger.record(1).map(|r| r.score), Some(i32::MAX));
    }

    #[test]
    fn test_example_scenario_notifications() {
        let router = Arc::new(Router::new());
        let mut rx1 = router.register(1);
        let mut rx2 = router.register(2);
        let ledger = ScoreLedger::new(Arc::clone(&router));

        ledger.award(1, 10, "Nox");
        assert_eq!(ledger.record(1), Some(PlayerRecord::new(1, "Nox", 10)));
        assert_eq!(notices(&drain(&mut rx1)), vec![(1, 10)]);

        ledger.award(1, 5, "");
        assert_eq!(ledger.record(1), Some(PlayerRecord::new(1, "Nox", 15)));
        assert_eq!(ledger.len(), 1);
        assert_eq!(notices(&drain(&mut rx1)), vec![(1, 15)]);

        assert!(notices(&drain(&mut rx2)).is_empty());
    }

    #[test]
    fn test_notices_never_reach_other_players() {
        let router = Arc::new(Router::new());
        let receivers: Vec<_> = (1..=4).map(|id| (id, router.register(id))).collect();
        let ledger = ScoreLedger::new(Arc::clone(&router));

        for round in 0..3 {
            for id in 1..=4 {
                ledger.award(id, round + id as i32, "");
            }
        }

        for (id, mut rx) in receivers {
            let received = notices(&drain(&mut rx));
            assert_eq!(received.len(), 3);
            assert!(received.iter().all(|(owner, _)| *owner == id));
        }
    }

    #[test]
    fn test_every_connection_replica_tracks_ledger() {
        let router = Arc::new(Router::new());
        let mut rx = router.register(2);
        let ledger = ScoreLedger::new(Arc::clone(&router));
        let mut replica = ListReplica::new();

        ledger.award(1, 10, "Nox");
        ledger.award(3, 5, "");
        ledger.award(1, 20, "");
        ledger.award(3, 0, "Vex");

        for packet in drain(&mut rx) {
            if let Packet::LedgerSync { event } = packet {
                replica.apply_event(event);
            }
        }
        assert_eq!(replica.items(), ledger.snapshot().as_slice());

        ledger.reset();
        for packet in drain(&mut rx) {
            if let Packet::LedgerSync { event } = packet {
                replica.apply_event(event);
            }
        }
        assert!(replica.is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_attach_seeds_late_connection() {
        let router = Arc::new(Router::new());
        let ledger = ScoreLedger::new(Arc::clone(&router));
        ledger.award(1, 10, "Nox");
        ledger.award(2, 5, "");

        let mut rx = ledger.attach(3);
        let mut replica = ListReplica::new();

        apply_syncs(drain(&mut rx), &mut replica);
        assert_eq!(replica.items(), ledger.snapshot().as_slice());

        ledger.award(1, 20, "");
        apply_syncs(drain(&mut rx), &mut replica);
        assert_eq!(replica.items(), ledger.snapshot().as_slice());

        ledger.award(3, 30, "Vex");
        let packets = drain(&mut rx);
        assert_eq!(notices(&packets), vec![(3, 30)]);
        apply_syncs(packets, &mut replica);
        assert_eq!(replica.items(), ledger.snapshot().as_slice());
    }

    #[test]
    fn test_attach_to_empty_ledger_sends_only_clear() {
        let router = Arc::new(Router::new());
        let ledger = ScoreLedger::new(Arc::clone(&router));

        let mut rx = ledger.attach(1);
        let packets = drain(&mut rx);
        assert_eq!(
            packets,
            vec![Packet::LedgerSync {
                event: ListEvent::Clear
            }]
        );
    }

    #[test]
    fn test_ledger_sync_precedes_score_notice() {
        let router = Arc::new(Router::new());
        let mut rx = router.register(1);
        let ledger = ScoreLedger::new(Arc::clone(&router));

        ledger.award(1, 10, "");

        let packets = drain(&mut rx);
        assert_eq!(packets.len(), 2);
        assert!(matches!(packets[0], Packet::LedgerSync { .. }));
        assert!(matches!(packets[1], Packet::ScoreNotice { player_id: 1, score: 10 }));
    }
}
