use clap::Parser;
use client::network::Client;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Display name announced after connecting
    #[arg(short, long)]
    name: Option<String>,

    /// Request every present as soon as it lands
    #[arg(short, long)]
    auto_collect: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    println!("Type to chat, ::playerName <name> to rename, /scores for the leaderboard, /quit to leave");

    let mut client = Client::new(&args.server, args.name, args.auto_collect).await?;
    client.run().await?;

    Ok(())
}
