use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod serve;

use crate::core::{AppConfig, init_tracing};

#[derive(Subcommand)]
enum Command {
    /// Run the chat API server
    Serve {
        /// Set the server host address
        #[arg(long)]
        host: Option<String>,

        /// Set the server port
        #[arg(long)]
        port: Option<String>,

        /// Seed the mock responses for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Start an interactive chat session
    Chat {
        /// Seed the mock responses for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port, seed }) => {
            // axum logs rejections from built-in extractors with the `axum::rejection`
            // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
            init_tracing(&format!(
                "{}=debug,tower_http=debug,axum::rejection=trace",
                env!("CARGO_CRATE_NAME")
            ));
            let config = AppConfig::default().with_overrides(host, port, seed);
            serve::run(config).await?;
        }
        Some(Command::Chat { seed }) => {
            // Keep the prompt readable, only surface problems
            init_tracing(&format!("{}=warn", env!("CARGO_CRATE_NAME")));
            let config = AppConfig::default().with_overrides(None, None, seed);
            chat::run(config).await?;
        }
        None => {}
    }

    Ok(())
}
