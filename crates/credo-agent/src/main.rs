//! Credo auto-playing agent.
//!
//! # Usage
//!
//! ```bash
//! credo-agent --server 127.0.0.1:7000 --username ada --room lobby-7
//! ```

use clap::Parser;
use credo_agent::AutoPlayer;
use credo_client::{FramedTransport, GameClient, SystemEnv};
use tokio::net::TcpStream;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Credo auto-playing agent
#[derive(Parser, Debug)]
#[command(name = "credo-agent")]
#[command(about = "Logs in, joins a room and plays until the game ends")]
#[command(version)]
struct Args {
    /// Game server address
    #[arg(short, long, default_value = "127.0.0.1:7000")]
    server: String,

    /// Player name
    #[arg(short, long, default_value = "credo-agent")]
    username: String,

    /// Room to join (created if missing)
    #[arg(short, long, default_value = "lobby")]
    room: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Connecting to {}", args.server);
    let stream = TcpStream::connect(&args.server).await?;
    stream.set_nodelay(true)?;

    let mut client = GameClient::new(FramedTransport::new(stream));
    client.login(&args.username).await?;
    client.join_room(&args.room).await?;
    let catalog = client.card_catalog().await?.clone();
    tracing::info!("{} card prototypes loaded", catalog.len());

    let mut handle = client.enter_game(SystemEnv::new()).await?;
    AutoPlayer.play(&mut handle, &catalog).await;
    handle.close().await;
    Ok(())
}
