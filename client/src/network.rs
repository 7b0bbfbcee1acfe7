use crate::game::{ClientEvent, ClientGameState};
use crate::input::{InputAction, InputManager};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, CLIENT_VERSION, COMMAND_PREFIX};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::interval;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Packets the client sends on its own in response to a server event
pub fn follow_up(event: &ClientEvent, name: Option<&str>, auto_collect: bool) -> Vec<Packet> {
    match event {
        ClientEvent::Connected(_) => name
            .map(|name| Packet::Chat {
                text: format!("{}playerName {}", COMMAND_PREFIX, name),
            })
            .into_iter()
            .collect(),
        ClientEvent::PresentLanded(present_id) if auto_collect => vec![Packet::CollectRequest {
            present_id: *present_id,
        }],
        _ => Vec::new(),
    }
}

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    name: Option<String>,
    auto_collect: bool,

    game_state: ClientGameState,
    input_manager: InputManager,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        name: Option<String>,
        auto_collect: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            name,
            auto_collect,
            game_state: ClientGameState::new(),
            input_manager: InputManager::new(),
        })
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to server...");

        let packet = Packet::Connect {
            client_version: CLIENT_VERSION,
        };
        self.send_packet(&packet).await?;

        Ok(())
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    /// Returns false once the server has dropped us
    async fn handle_packet(&mut self, packet: Packet) -> bool {
        let Some(event) = self.game_state.apply_packet(packet) else {
            return true;
        };

        match &event {
            ClientEvent::Connected(client_id) => {
                info!("Connected! Client ID: {}", client_id);
            }
            ClientEvent::ScoreChanged(score) => println!("Your score: {}", score),
            ClientEvent::PresentSpawned(present_id) => {
                debug!("Present {} spawned", present_id);
            }
            ClientEvent::PresentLanded(present_id) => {
                println!("Present {} has landed!", present_id);
            }
            ClientEvent::Chat(text) => println!("{}", text),
            ClientEvent::Timer(remaining) => {
                if *remaining % 10 == 0 {
                    println!("{}s left", remaining);
                }
            }
            ClientEvent::Disconnected(reason) => {
                warn!("Disconnected: {}", reason);
                return false;
            }
        }

        for packet in follow_up(&event, self.name.as_deref(), self.auto_collect) {
            if let Err(e) = self.send_packet(&packet).await {
                error!("Error sending packet: {}", e);
            }
        }
        true
    }

    fn print_scores(&self) {
        println!("--- Scores ---");
        for record in self.game_state.leaderboard() {
            let name = if record.has_name() {
                record.display_name.as_str()
            } else {
                "player"
            };
            println!("{:>6}  {}", record.score, name);
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut heartbeat_interval = interval(HEARTBEAT_INTERVAL);
        let mut buffer = [0u8; 2048];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => match deserialize::<Packet>(&buffer[0..len]) {
                            Ok(packet) => {
                                if !self.handle_packet(packet).await {
                                    return Ok(());
                                }
                            }
                            Err(e) => warn!("Failed to deserialize packet: {}", e),
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                action = self.input_manager.next_action() => {
                    match action {
                        InputAction::Chat(text) => {
                            if let Err(e) = self.send_packet(&Packet::Chat { text }).await {
                                error!("Error sending chat: {}", e);
                            }
                        }
                        InputAction::ShowScores => self.print_scores(),
                        InputAction::Quit => break,
                    }
                },

                _ = heartbeat_interval.tick() => {
                    if self.game_state.client_id.is_some() {
                        if let Err(e) = self.send_packet(&Packet::Heartbeat).await {
                            error!("Error sending heartbeat: {}", e);
                        }
                    }
                },

                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C");
                    break;
                },
            }
        }

        if self.game_state.client_id.is_some() {
            self.send_packet(&Packet::Disconnect).await?;
        }
        info!("Client shutting down");
        Ok(())
    }
}
