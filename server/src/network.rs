//! Server network layer: UDP transport, per-connection writers, and the session tick loop

use crate::client_manager::ClientManager;
use crate::game::{GameState, SessionConfig};
use crate::router::Outbound;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PlayerId, CLIENT_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
const WRITER_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] bincode::Error),
}

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: PlayerId },
    Shutdown,
}

/// Main server coordinating networking and the session authority
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game_state: GameState,
    tick_duration: Duration,
    writers: Vec<JoinHandle<()>>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        config: SessionConfig,
    ) -> Result<Self, ServerError> {
        let game_state = GameState::new(&config);
        Self::with_game_state(addr, tick_duration, config.max_clients, game_state).await
    }

    pub async fn with_game_state(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
        game_state: GameState,
    ) -> Result<Self, ServerError> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients, CLIENT_TIMEOUT))),
            game_state,
            tick_duration,
            writers: Vec::new(),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    /// Sender that can stop `run` with `ServerMessage::Shutdown`.
    pub fn control(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the writer that drains one player's outbound queue onto the socket, in order.
    /// It ends when the queue is closed by the player leaving.
    fn spawn_connection_writer(&mut self, client_id: PlayerId, addr: SocketAddr, mut outbound: Outbound) {
        let socket = Arc::clone(&self.socket);
        self.writers.retain(|writer| !writer.is_finished());

        let writer = tokio::spawn(async move {
            while let Some(packet) = outbound.recv().await {
                if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                    error!("Failed to send to client {}: {}", client_id, e);
                }
            }
            debug!("Writer for client {} finished", client_id);
        });
        self.writers.push(writer);
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), ServerError> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    /// Resolves the sender of a packet and hands it to the session
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                if client_version != CLIENT_VERSION {
                    self.reject(addr, "Protocol version mismatch").await;
                    return;
                }

                // Remove existing connection if present
                let existing_client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(existing_id) = existing_client_id {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    self.clients.write().await.remove_client(&existing_id);
                    self.game_state.gateway().leave(existing_id);
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                match client_id {
                    Some(client_id) => {
                        let outbound = self.game_state.gateway().join(client_id);
                        self.spawn_connection_writer(client_id, addr, outbound);
                    }
                    None => self.reject(addr, "Server full").await,
                }
            }

            Packet::Disconnect => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(client_id) = client_id {
                    self.clients.write().await.remove_client(&client_id);
                    self.game_state.gateway().leave(client_id);
                }
            }

            packet => {
                let client_id = {
                    let mut clients = self.clients.write().await;
                    let client_id = clients.find_client_by_addr(addr);
                    if let Some(id) = client_id {
                        clients.touch(id);
                    }
                    client_id
                };

                match client_id {
                    Some(client_id) => self.game_state.gateway().handle_packet(client_id, packet),
                    None => warn!("Packet from unknown address {}", addr),
                }
            }
        }
    }

    async fn reject(&self, addr: SocketAddr, reason: &str) {
        warn!("Rejecting {}: {}", addr, reason);
        let packet = Packet::Disconnected {
            reason: reason.to_string(),
        };
        if let Err(e) = Self::send_packet_impl(&self.socket, &packet, addr).await {
            error!("Failed to send rejection to {}: {}", addr, e);
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.spawn_network_receiver();
        self.spawn_timeout_checker();

        self.game_state.start();

        let mut tick_interval = interval(self.tick_duration);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            self.game_state.gateway().leave(client_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    self.game_state.update_physics(dt);
                    self.game_state.tick += 1;

                    if self.game_state.tick % 300 == 0 {
                        debug!(
                            "Tick {}: {} connections, {}s left",
                            self.game_state.tick,
                            self.game_state.connection_count(),
                            self.game_state.clock().remaining_secs()
                        );
                    }
                },
            }
        }

        self.game_state.end();
        self.game_state.disconnect_all("Server shutting down");
        for writer in self.writers.drain(..) {
            if timeout(WRITER_FLUSH_TIMEOUT, writer).await.is_err() {
                warn!("Connection writer did not flush in time");
            }
        }
        Ok(())
    }
}
