//! # Session Server Library
//!
//! This library is the authoritative side of a small multiplayer present hunt. It owns the only
//! writable copy of the score ledger and the collectible present, routes every client request
//! through that single authority, and pushes change notifications to the right connections.
//!
//! ## Core Responsibilities
//!
//! ### Score Ledger
//! One record per player, kept in a replicated list. Every change is mirrored to all client
//! replicas as an ordered event stream, while the new score itself is only announced to the
//! player it belongs to.
//!
//! ### Present Lifecycle
//! A single present falls from a random spawn point, lands, and can be collected exactly once.
//! Near-simultaneous collect requests for the same present are settled by an atomic
//! compare-and-set; the winner is awarded 5, 10, 20 or 30 points and the next present drops
//! from a different spawn point.
//!
//! ### Notification Routing
//! Each connection owns a FIFO outbound queue. Packets for one connection arrive in the order
//! the authority produced them; there is no ordering between connections and no retry.
//!
//! ## Module Organization
//!
//! - `router`: per-connection outbound queues
//! - `ledger`: the score ledger
//! - `present`: spawn, landing, and collection of the present
//! - `gateway`: inbound request routing and chat commands
//! - `clock`: the session countdown
//! - `game`: wires one session's components together
//! - `client_manager`: address to player mapping and timeouts
//! - `network`: UDP transport and the tick loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::SessionConfig;
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(33), // 30Hz
//!         SessionConfig::default(),
//!     ).await?;
//!
//!     // Drops the first present, then serves requests and ticks physics until shutdown
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Without the transport, a session can be driven directly through `game::GameState` and its
//! `gateway::SessionGateway`, which is how the tests exercise it.

pub mod client_manager;
pub mod clock;
pub mod game;
pub mod gateway;
pub mod ledger;
pub mod network;
pub mod present;
pub mod router;
