//! # Session Client Library
//!
//! A terminal client for the present hunt. The server is the only authority; the client keeps a
//! read-only replica of the score ledger, shows what the server announces, and forwards what
//! the player types.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The client's view of the session:
//! - Score ledger replica rebuilt from the server's ordered event stream
//! - The player's own score, taken only from notices addressed to them
//! - The live present and the session countdown
//!
//! ### Input Module (`input`)
//! Reads lines from stdin. `/scores` prints the leaderboard, `/quit` leaves, and everything else
//! is sent as chat, including `::playerName <name>` commands.
//!
//! ### Network Module (`network`)
//! UDP connection handling, heartbeats, and the select loop tying socket, input, and shutdown
//! together. With auto-collect enabled the client requests every present as soon as it lands.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new("127.0.0.1:8080", Some("Nox".to_string()), true).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
