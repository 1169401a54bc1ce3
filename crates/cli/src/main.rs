//! TreatOrHell CLI — the main entry point.
//!
//! Commands:
//! - `serve`        — Start the HTTP API (default when no command is given)
//! - `check-store`  — Verify the configured Upstash Redis store
//! - `config`       — Print the effective configuration

use clap::{Parser, Subcommand};
use treatorhell_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "treatorhell",
    about = "TreatOrHell — the Angel persona chat service",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write, read, and delete a test key in the configured Upstash store
    CheckStore,

    /// Print the effective configuration with secrets redacted
    Config,
}

/// Initialize JSON logging. `RUST_LOG` wins, then `--verbose`, then the
/// configured level.
fn init_tracing(verbose: bool, configured: Option<&AppConfig>) {
    let fallback = if verbose {
        "debug".to_string()
    } else {
        configured.map_or_else(|| "info".to_string(), AppConfig::log_filter)
    };

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Read config before logging starts so its level can drive the filter.
    let config = AppConfig::load_unvalidated();
    init_tracing(cli.verbose, config.as_ref().ok());
    let config = config.map_err(|e| format!("Failed to load config: {e}"))?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => commands::serve::run(config, host, port).await?,
        Commands::CheckStore => commands::check_store::run(&config).await?,
        Commands::Config => commands::config_cmd::show(&config)?,
    }

    Ok(())
}
