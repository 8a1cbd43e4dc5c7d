use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::net::{IpAddr, SocketAddr};
use tether_client::{ClientConfig, PeerSetEvent, TetherClient};
use tether_core::{CallMode, IceServerConfig, RoomId};
use tether_server::ServerConfig;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Signaling relay and peer-to-peer call client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, env = "TETHER_BIND", default_value = "0.0.0.0")]
        bind: IpAddr,

        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,

        /// STUN/TURN urls handed to clients; defaults to public STUN servers.
        #[arg(long, env = "TETHER_STUN", value_delimiter = ',')]
        stun: Vec<String>,
    },

    /// Register with a relay, join a room and call everyone in it.
    Join {
        #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
        url: String,

        /// Identifier to register under; generated when omitted.
        #[arg(short, long)]
        user: Option<String>,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        room: String,

        #[arg(short, long, value_enum, default_value_t = Mode::Video)]
        mode: Mode,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Audio,
    Video,
}

impl From<Mode> for CallMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Audio => CallMode::Audio,
            Mode::Video => CallMode::Video,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command {
        Commands::Serve { bind, port, stun } => serve(bind, port, stun).await,
        Commands::Join {
            url,
            user,
            name,
            room,
            mode,
        } => join(url, user, name, RoomId::new(room), mode.into()).await,
    }
}

async fn serve(bind: IpAddr, port: u16, stun: Vec<String>) -> Result<()> {
    let mut config = ServerConfig {
        bind: SocketAddr::new(bind, port),
        ..ServerConfig::default()
    };
    if !stun.is_empty() {
        config.ice_servers = stun.into_iter().map(IceServerConfig::stun).collect();
    }

    println!(
        "{} {}",
        "Starting tether relay on".green().bold(),
        config.bind
    );
    tether_server::serve(config).await
}

async fn join(
    url: String,
    user: Option<String>,
    name: Option<String>,
    room: RoomId,
    mode: CallMode,
) -> Result<()> {
    let mut config = ClientConfig::new(url);
    if let Some(user) = user {
        config = config.with_user_id(user);
    }
    if let Some(name) = name {
        config = config.with_display_name(name);
    }

    let client = TetherClient::connect_webrtc(config)
        .await
        .context("failed to reach the relay")?;
    println!(
        "{} {}",
        "Registered as".green().bold(),
        client.user_id().to_string().cyan()
    );

    let mut events = client.peers().subscribe();
    client
        .call(room.clone(), mode)
        .await
        .with_context(|| format!("failed to join room {}", room))?;
    println!("{} {} ({:?})", "Joined room".green().bold(), room, mode);
    println!("{}", "Press Ctrl-C to hang up.".dimmed());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let lost = event == PeerSetEvent::SignalingLost;
                    print_event(&event);
                    if lost {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    println!("{}", format!("Skipped {} events", n).yellow());
                }
                Err(RecvError::Closed) => break,
            },

            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Hanging up...".cyan());
                break;
            }
        }
    }

    if let Err(e) = client.hang_up().await {
        tracing::debug!("Hang-up after shutdown: {}", e);
    }
    Ok(())
}

fn print_event(event: &PeerSetEvent) {
    match event {
        PeerSetEvent::IncomingCall { from, mode } => {
            println!("{} {} ({:?})", "Incoming call from".cyan(), from, mode)
        }
        PeerSetEvent::PeerConnected { peer } => {
            println!("{} {}", "Connected to".green().bold(), peer)
        }
        PeerSetEvent::PeerLeft { peer } => println!("{} {}", "Left:".yellow(), peer),
        PeerSetEvent::PeerFailed { peer, error } => {
            println!("{} {}: {}", "Lost".red().bold(), peer, error)
        }
        PeerSetEvent::MediaUnavailable { reason } => {
            println!("{} {}", "Media unavailable:".red(), reason)
        }
        PeerSetEvent::SignalingLost => println!("{}", "Relay connection lost".red().bold()),
    }
}
