use clap::Parser;
use log::{info, warn};
use server::game::{default_spawn_points, SessionConfig};
use server::network::{Server, ServerMessage};
use shared::parse_positions;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Tick rate (updates per second)
    #[arg(short, long, default_value = "30")]
    tick_rate: u32,

    /// Maximum concurrent players
    #[arg(short, long, default_value = "16")]
    max_clients: usize,

    /// Present spawn points as "x,y;x,y;..."
    #[arg(short, long)]
    spawn_points: Option<String>,

    /// Session length in seconds
    #[arg(long, default_value = "120")]
    session_secs: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let spawn_points = match &args.spawn_points {
        Some(spec) => parse_positions(spec).ok_or("invalid --spawn-points, expected x,y;x,y;...")?,
        None => default_spawn_points(),
    };

    let config = SessionConfig {
        spawn_points,
        session_secs: args.session_secs,
        max_clients: args.max_clients,
    };
    let tick_duration = Duration::from_secs_f64(1.0 / args.tick_rate.max(1) as f64);
    let address = format!("{}:{}", args.host, args.port);

    info!("Starting server on {} at {}Hz", address, args.tick_rate);
    let mut server = Server::new(&address, tick_duration, config).await?;

    // Ctrl+C stops `run` through its own loop, which ends the session before returning
    let control = server.control();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            if control.send(ServerMessage::Shutdown).is_err() {
                warn!("Server loop already stopped");
            }
        }
    });

    server.run().await?;

    Ok(())
}
