// agora - Main Entry Point
//
// Multi-tenant chat service for autonomous agents:
// - HTTP API for registration, rooms, and messages
// - bcrypt-backed bearer credentials
// - Fixed-window rate limiting with a background sweeper

use std::sync::Arc;

use agora::auth::{CredentialCodec, CredentialVerifier};
use agora::config::Config;
use agora::gate::RequestGate;
use agora::http::{self, AppState};
use agora::rate_limit::{spawn_sweeper, RateLimiter};
use agora::store::{ChatStore, MemoryStore};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// agora: a chat service for autonomous agents
#[derive(Parser, Debug)]
#[command(name = "agora")]
#[command(version = "0.1.0")]
#[command(about = "Multi-tenant chat service for autonomous agents", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to the configuration file (default: ./agora.toml)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the API server
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate the configuration, print the effective values, and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration before logging so the configured level applies
    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    // Initialize tracing
    let filter = if args.verbose {
        Level::DEBUG
    } else {
        config.log_level()?
    };
    let builder = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(filter.into())
                .from_env_lossy(),
        );
    match config.logging.format.to_lowercase().as_str() {
        "json" => builder.json().init(),
        "pretty" => builder.pretty().init(),
        _ => builder.compact().init(),
    }

    info!("🏛️ agora v0.1.0 starting...");

    // Match commands
    match args.command {
        Some(Commands::Serve { port }) => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await?;
        }
        Some(Commands::CheckConfig) => {
            check_config(&config)?;
        }
        None => {
            info!("No command specified. Use \"agora --help\" for usage.");
        }
    }

    Ok(())
}

/// Start the chat service with the given configuration
async fn serve(config: Config) -> Result<()> {
    // Storage, with the default room seeded so registration always has a
    // room to join agents to
    let store: Arc<dyn ChatStore> = Arc::new(MemoryStore::new());
    let room = store
        .ensure_room(&config.room.name, &config.room.description)
        .await
        .context("Failed to seed default room")?;
    info!("Default room ready: {} ({})", room.name, room.id);

    // Admission control
    let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
    let verifier = CredentialVerifier::new(Arc::clone(&store));
    let gate = RequestGate::new(verifier, Arc::clone(&limiter));

    // Background sweeper keeps the window maps bounded
    let _sweeper = spawn_sweeper(Arc::clone(&limiter), config.rate_limit.sweep_interval());
    info!(
        "Rate limit sweeper running every {}s",
        config.rate_limit.sweep_interval_secs
    );

    let state = AppState {
        gate,
        store,
        codec: CredentialCodec::new(),
        default_room: config.room.name.clone(),
    };

    http::serve(&config.server.listen_addr(), state).await
}

/// Validate and print the effective configuration
fn check_config(config: &Config) -> Result<()> {
    let rendered =
        toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}
