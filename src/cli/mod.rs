pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::WalletSession;
use crate::config::ClientConfig;

#[derive(Parser)]
#[command(name = "wallet")]
#[command(about = "Wallet session CLI - bootstrap, connect and inspect sessions against the session service")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Service base URL (defaults to WALLET_API_BASE_URL)")]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Session bootstrap, wallet connect and logout")]
    Session {
        #[command(subcommand)]
        cmd: commands::session::SessionCommands,
    },

    #[command(about = "Check service liveness via /healthz")]
    Health,

    #[command(about = "Sign a message with a local key (development helper)")]
    Sign {
        #[arg(long, help = "Hex-encoded secp256k1 private key")]
        private_key: String,
        #[arg(long, help = "Statement to sign; the current timestamp line is appended")]
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Client settings from the environment, with `--url` taking precedence
pub fn client_config(url: Option<String>) -> ClientConfig {
    let mut config = crate::config::config().client.clone();
    if let Some(url) = url {
        config.base_url = url;
    }
    config
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = client_config(cli.url.clone());

    match cli.command {
        Commands::Session { cmd } => {
            let session = WalletSession::new(&config)?;
            commands::session::handle(cmd, &session, output_format).await
        }
        Commands::Health => {
            let session = WalletSession::new(&config)?;
            commands::health::handle(&session, output_format).await
        }
        Commands::Sign { private_key, message } => commands::sign::handle(&private_key, &message, output_format),
    }
}
