//! Correios label back office CLI - migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! correio-cli migrate
//!
//! # Obfuscate an access code for manual insertion
//! correio-cli credential obfuscate "<access code>"
//!
//! # Reveal a stored access code
//! correio-cli credential reveal "xor1:..."
//!
//! # List known Correios services
//! correio-cli services
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "correio-cli")]
#[command(author, version, about = "Correios label back office CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Obfuscate or reveal stored carrier access codes
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },
    /// List known Correios services
    Services,
}

#[derive(Subcommand)]
enum CredentialAction {
    /// Produce the storage form of an access code
    Obfuscate {
        /// Plaintext access code
        value: String,
    },
    /// Recover an access code from its storage form
    Reveal {
        /// Stored value (`xor1:` prefixed)
        value: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Credential { action } => match action {
            CredentialAction::Obfuscate { value } => commands::credential::obfuscate(&value)?,
            CredentialAction::Reveal { value } => commands::credential::reveal(&value)?,
        },
        Commands::Services => commands::services::list(),
    }
    Ok(())
}
