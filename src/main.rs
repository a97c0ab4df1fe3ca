//! blindfold-broker - Key and storage broker for client-side encrypted files
//!
//! Usage:
//!   blindfold-broker serve                         - Run the HTTP service
//!   blindfold-broker check-config                  - Validate configuration
//!   blindfold-broker upload-id --account A --group G - Print the upload handle

use blindfold_broker::{
    config::Config,
    identity::{AccountId, GroupId, UploadId},
    server,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blindfold-broker")]
#[command(author = "blindfold Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Key and storage broker for client-side encrypted files")]
struct Cli {
    /// Configuration file path (JSON); environment variables are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration and print a redacted summary
    CheckConfig,

    /// Print the deterministic upload handle for an account and group
    UploadId {
        #[arg(long)]
        account: String,

        #[arg(long)]
        group: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run_command(cli.command, cli.config).await {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load(&path)?,
        None => Config::from_env()?,
    };
    Ok(config)
}

async fn run_command(command: Commands, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    match command {
        Commands::Serve { port } => cmd_serve(config_path, port).await,
        Commands::CheckConfig => cmd_check_config(config_path),
        Commands::UploadId { account, group } => {
            cmd_upload_id(&account, &group);
            Ok(())
        }
    }
}

async fn cmd_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    info!("============================================================");
    info!("Starting {} v{}", server::SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    info!("Shade Agent URL: {}", config.broker.base_url);
    info!("Pinata configured: upload={}", config.storage.upload_url);
    info!("============================================================");

    server::serve(&config).await?;
    Ok(())
}

fn cmd_check_config(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("Configuration OK");
    println!("  Broker:   {} (timeout {:?})", config.broker.base_url, config.broker.timeout());
    println!("  Upload:   {}", config.storage.upload_url);
    println!("  Gateway:  {}", config.storage.gateway_url);
    println!("  Storage timeout: {:?}", config.storage.timeout());
    println!("  Listen:   {}", config.server.socket_addr()?);
    println!("  Credentials: {:?}", config.storage);

    Ok(())
}

fn cmd_upload_id(account: &str, group: &str) {
    let id = UploadId::derive(&AccountId::new(account), &GroupId::new(group));
    println!("{}", id);
}
