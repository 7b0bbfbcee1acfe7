use log::debug;
use shared::{ListReplica, Packet, PlayerId, PlayerRecord, Position, PresentId};

/// What the client currently knows about the live present
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentView {
    pub id: PresentId,
    pub position: Position,
    pub landed: bool,
}

/// Something the player should be told about after a packet was applied
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connected(PlayerId),
    ScoreChanged(i32),
    PresentSpawned(PresentId),
    PresentLanded(PresentId),
    Chat(String),
    Timer(u32),
    Disconnected(String),
}

/// The client's read-only view of the session
#[derive(Debug, Default)]
pub struct ClientGameState {
    pub client_id: Option<PlayerId>,
    scoreboard: ListReplica<PlayerRecord>,
    score: Option<i32>,
    present: Option<PresentView>,
    remaining_secs: Option<u32>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one packet from the server. Ledger events must arrive in the order the server
    /// sent them.
    pub fn apply_packet(&mut self, packet: Packet) -> Option<ClientEvent> {
        match packet {
            Packet::Connected { client_id } => {
                self.client_id = Some(client_id);
                Some(ClientEvent::Connected(client_id))
            }
            Packet::LedgerSync { event } => {
                if let Some(record) = event.item() {
                    debug!(
                        "Ledger change for player {}: score {}",
                        record.player_id, record.score
                    );
                }
                self.scoreboard.apply_event(event);
                None
            }
            Packet::ScoreNotice { player_id, score } => {
                if self.client_id != Some(player_id) {
                    debug!("Ignoring score notice addressed to player {}", player_id);
                    return None;
                }
                self.score = Some(score);
                Some(ClientEvent::ScoreChanged(score))
            }
            Packet::PresentSpawned {
                present_id,
                position,
            } => {
                self.present = Some(PresentView {
                    id: present_id,
                    position,
                    landed: false,
                });
                Some(ClientEvent::PresentSpawned(present_id))
            }
            Packet::PresentLanded { present_id } => match &mut self.present {
                Some(present) if present.id == present_id => {
                    present.landed = true;
                    Some(ClientEvent::PresentLanded(present_id))
                }
                _ => None,
            },
            Packet::ChatMessage { text } => Some(ClientEvent::Chat(text)),
            Packet::Timer { remaining_secs } => {
                self.remaining_secs = Some(remaining_secs);
                Some(ClientEvent::Timer(remaining_secs))
            }
            Packet::Disconnected { reason } => {
                self.client_id = None;
                Some(ClientEvent::Disconnected(reason))
            }
            other => {
                debug!("Ignoring unexpected packet {:?}", other);
                None
            }
        }
    }

    /// Ledger records in replica order
    pub fn scoreboard(&self) -> &[PlayerRecord] {
        self.scoreboard.items()
    }

    /// Ledger records sorted by score, highest first
    pub fn leaderboard(&self) -> Vec<PlayerRecord> {
        let mut records = self.scoreboard.items().to_vec();
        records.sort_by(|a, b| b.score.cmp(&a.score).then(a.player_id.cmp(&b.player_id)));
        records
    }

    pub fn score(&self) -> Option<i32> {
        self.score
    }

    pub fn present(&self) -> Option<PresentView> {
        self.present
    }

    pub fn remaining_secs(&self) -> Option<u32> {
        self.remaining_secs
    }
}
