use serde::{Deserialize, Serialize};

pub mod command;
pub mod replicated;

pub use command::{ChatCommand, CommandError, COMMAND_PREFIX};
pub use replicated::{ListEvent, ListReplica, ReplicatedList};

pub const GRAVITY: f32 = 980.0;
pub const FLOOR_Y: f32 = 550.0;
pub const WORLD_WIDTH: f32 = 800.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const PRESENT_SIZE: f32 = 24.0;

/// Point values a present can be worth (small, medium, large, xl).
pub const PRESENT_VALUES: [i32; 4] = [5, 10, 20, 30];

/// Display names are stored in at most this many UTF-8 bytes.
pub const MAX_NAME_BYTES: usize = 64;

pub const SESSION_SECS: f32 = 120.0;
pub const CLIENT_VERSION: u32 = 1;

/// Connection-scoped player identity assigned by the server.
pub type PlayerId = u64;

/// Identity of one spawned present instance. Never reused within a session.
pub type PresentId = u64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    CollectRequest {
        present_id: PresentId,
    },
    ScoreUpdate {
        points: i32,
        display_name: Option<String>,
    },
    Chat {
        text: String,
    },
    Heartbeat,
    Disconnect,

    Connected {
        client_id: PlayerId,
    },
    LedgerSync {
        event: ListEvent<PlayerRecord>,
    },
    ScoreNotice {
        player_id: PlayerId,
        score: i32,
    },
    PresentSpawned {
        present_id: PresentId,
        position: Position,
    },
    PresentLanded {
        present_id: PresentId,
    },
    ChatMessage {
        text: String,
    },
    Timer {
        remaining_secs: u32,
    },
    Disconnected {
        reason: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One player's entry in the score ledger, keyed by `player_id`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    pub display_name: String,
    pub score: i32,
}

impl PlayerRecord {
    pub fn new(player_id: PlayerId, display_name: &str, score: i32) -> Self {
        Self {
            player_id,
            display_name: truncate_name(display_name),
            score,
        }
    }

    pub fn has_name(&self) -> bool {
        !self.display_name.is_empty()
    }
}

/// Cuts `name` down to `MAX_NAME_BYTES`, backing off to a char boundary.
pub fn truncate_name(name: &str) -> String {
    if name.len() <= MAX_NAME_BYTES {
        return name.to_string();
    }

    let mut end = MAX_NAME_BYTES;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

/// Parses a spawn point list of the form `x,y;x,y;...`.
pub fn parse_positions(spec: &str) -> Option<Vec<Position>> {
    spec.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (x, y) = part.split_once(',')?;
            Some(Position::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
        })
        .collect()
}
