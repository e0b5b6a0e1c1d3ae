//! Ragline CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize the config file
//! - `ask`     — Ask a single question and stream the answer to stdout
//! - `serve`   — Start the HTTP query server

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ragline",
    about = "Ragline — retrieval-augmented answer service",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the configuration file
    Onboard,

    /// Ask a question and stream the answer
    Ask {
        /// The question to ask
        message: String,

        /// Act as this user (keeps conversational memory separate)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Start the HTTP query server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask { message, user } => commands::ask::run(message, user).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
    }

    Ok(())
}
