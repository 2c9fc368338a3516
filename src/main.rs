//! SafeVault - wallet session and vault transaction CLI
//!
//! # WARNING
//! - Deposits and withdrawals are signed by the connected wallet and move real funds.
//! - A submitted transaction cannot be cancelled from here.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use safevault::cli::commands;
use safevault::config::Config;

/// SafeVault - deposit into and withdraw from the vault contract
#[derive(Parser)]
#[command(name = "safevault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "safevault.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and show the account with its balances
    Status,

    /// Deposit native currency into the vault
    Deposit {
        /// Amount in display units, e.g. "0.5"
        amount: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Withdraw from the vault
    Withdraw {
        /// Amount in display units, e.g. "0.5"
        amount: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Interactive session (balances, deposit, withdraw)
    Session,

    /// Show current configuration (endpoint masked)
    Config,

    /// Check the provider endpoint
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("safevault=info".parse()?),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded from {}", cli.config);

    let result = match cli.command {
        Commands::Status => commands::status(&config).await,
        Commands::Deposit { amount, force } => commands::deposit(&config, &amount, force).await,
        Commands::Withdraw { amount, force } => commands::withdraw(&config, &amount, force).await,
        Commands::Session => commands::session(&config).await,
        Commands::Config => commands::show_config(&config),
        Commands::Health => commands::health(&config).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
