use aimint::{
    logger::{self, LogLevel, LoggerConfig},
    wallet::spawn_account_watcher,
    Config, MintOrchestrator, MintRequest, MintState,
};
use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "aimint", version, about = "Generate an image from a prompt and mint it as an NFT")]
struct Cli {
    /// Debug-level logs with source locations
    #[arg(long, global = true)]
    verbose: bool,
    /// One JSON object per log line
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Request wallet accounts and switch to the contract's network
    Connect,
    /// Generate an image without pinning or minting it
    Preview {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        /// Write the image here instead of printing a data URL
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate, pin and mint
    Mint {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
    },
    /// Number of tokens held by an address (defaults to the connected account)
    Balance { address: Option<String> },
    /// Serve the HTTP API
    #[cfg(feature = "server")]
    Serve {
        /// Defaults to 127.0.0.1 on `PORT`
        #[arg(long)]
        listen: Option<std::net::SocketAddr>,
    },
}

fn logger_config(cli: &Cli) -> LoggerConfig {
    let base = if cli.verbose {
        LoggerConfig::development()
    } else {
        let level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|value| LogLevel::parse(&value))
            .unwrap_or(LogLevel::Info);
        LoggerConfig::new().with_level(level)
    };
    base.with_json_output(cli.json_logs)
}

fn print_state_changes(orchestrator: &MintOrchestrator) {
    let mut states = orchestrator.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            match state {
                MintState::Generating => log::info!("🎨 Generating image..."),
                MintState::Uploading => log::info!("📦 Uploading image..."),
                MintState::Minting { .. } => log::info!("⛓️  Waiting for mint..."),
                _ => {}
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let cli = Cli::parse();
    logger::init_with_config(logger_config(&cli))?;
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if !dotenv_loaded {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    let (orchestrator, wallet) = MintOrchestrator::from_config(&config)?;
    let orchestrator = Arc::new(orchestrator);
    let watcher = spawn_account_watcher(wallet, Duration::from_secs(5));

    let canceller = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    match cli.command {
        Command::Connect => {
            let account = orchestrator.connect().await?;
            println!("{}", account);
        }
        Command::Preview {
            name,
            description,
            out,
        } => {
            let image = orchestrator
                .generate_image(&MintRequest::new(name, description))
                .await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &image.bytes)?;
                    log::info!("💾 Image saved to: {}", path.display());
                }
                None => println!("{}", image.to_data_url()),
            }
        }
        Command::Mint { name, description } => {
            orchestrator.connect().await?;
            print_state_changes(&orchestrator);
            let result = orchestrator
                .submit(MintRequest::new(name, description))
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Balance { address } => {
            let owner = match address {
                Some(address) => address.parse::<Address>()?,
                None => orchestrator.connect().await?,
            };
            let balance = orchestrator.balance_of(owner).await?;
            println!("{} {}", owner, balance);
        }
        #[cfg(feature = "server")]
        Command::Serve { listen } => {
            let listen = listen.unwrap_or_else(|| ([127, 0, 0, 1], config.listen_port()).into());
            aimint::server::run_server(Arc::clone(&orchestrator), listen).await?;
        }
    }

    watcher.abort();
    Ok(())
}
