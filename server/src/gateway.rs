//! Entry point for everything a connected player asks of the authority
//!
//! The network layer resolves which player a packet came from and hands it here. Requests are
//! routed to the score ledger or the present coordinator; chat lines are either commands
//! (`::name args`) or messages relayed to everyone.

use crate::ledger::ScoreLedger;
use crate::present::{CollectOutcome, CollectibleCoordinator};
use crate::router::{Outbound, Router};
use log::{debug, info, warn};
use shared::command::is_command;
use shared::{ChatCommand, Packet, PlayerId, PresentId};
use std::sync::Arc;

const DEFAULT_CHAT_NAME: &str = "player";

pub struct SessionGateway {
    router: Arc<Router>,
    ledger: Arc<ScoreLedger>,
    presents: Arc<CollectibleCoordinator>,
}

impl SessionGateway {
    pub fn new(
        router: Arc<Router>,
        ledger: Arc<ScoreLedger>,
        presents: Arc<CollectibleCoordinator>,
    ) -> Self {
        Self {
            router,
            ledger,
            presents,
        }
    }

    /// Opens the player's outbound queue seeded with the current ledger, greets them, and tells
    /// them where the present is.
    pub fn join(&self, player_id: PlayerId) -> Outbound {
        let outbound = self.ledger.attach(player_id);
        self.router.send_to(
            player_id,
            Packet::Connected {
                client_id: player_id,
            },
        );

        if let Some((present, position)) = self.presents.current() {
            if !present.is_collected() {
                self.router.send_to(
                    player_id,
                    Packet::PresentSpawned {
                        present_id: present.id,
                        position,
                    },
                );
                if present.is_landed() {
                    self.router.send_to(
                        player_id,
                        Packet::PresentLanded {
                            present_id: present.id,
                        },
                    );
                }
            }
        }

        info!("Player {} joined the session", player_id);
        outbound
    }

    pub fn leave(&self, player_id: PlayerId) {
        if self.router.unregister(&player_id) {
            info!("Player {} left the session", player_id);
        }
    }

    pub fn collect_request(&self, player_id: PlayerId, present_id: PresentId) -> CollectOutcome {
        self.presents.attempt_collect(present_id, player_id)
    }

    pub fn score_update_request(&self, player_id: PlayerId, points: i32, display_name: Option<&str>) {
        self.ledger
            .award(player_id, points, display_name.unwrap_or_default());
    }

    /// Handles one chat line from `player_id`.
    pub fn chat(&self, player_id: PlayerId, text: &str) {
        if is_command(text) {
            match ChatCommand::parse(text) {
                Ok(command) => self.handle_command(player_id, command),
                Err(e) => warn!("Dropping command from player {}: {}", player_id, e),
            }
            return;
        }

        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let name = self
            .ledger
            .display_name(player_id)
            .unwrap_or_else(|| DEFAULT_CHAT_NAME.to_string());
        self.router.broadcast(&Packet::ChatMessage {
            text: format!("{}: {}", name, text),
        });
    }

    fn handle_command(&self, player_id: PlayerId, command: ChatCommand) {
        match command {
            ChatCommand::PlayerName(name) => {
                debug!("Player {} asked to be called {:?}", player_id, name);
                self.router.send_to(
                    player_id,
                    Packet::ChatMessage {
                        text: format!("Hello {}!", name),
                    },
                );
                self.ledger.award(player_id, 0, &name);
            }
        }
    }

    /// Routes a request packet from an already connected player.
    pub fn handle_packet(&self, player_id: PlayerId, packet: Packet) {
        match packet {
            Packet::CollectRequest { present_id } => {
                let outcome = self.collect_request(player_id, present_id);
                debug!("Collect request from player {}: {:?}", player_id, outcome);
            }
            Packet::ScoreUpdate {
                points,
                display_name,
            } => self.score_update_request(player_id, points, display_name.as_deref()),
            Packet::Chat { text } => self.chat(player_id, &text),
            Packet::Heartbeat => {}
            other => warn!("Unexpected packet from player {}: {:?}", player_id, other),
        }
    }
}
