//! Atelier - upload server and CLI for portfolio images.
//!
//! Atelier accepts images over HTTP (or from disk), validates them, produces
//! a web-sized JPEG and stores it, plus the untouched original on request,
//! in object storage.
//!
//! # Usage
//!
//! ```bash
//! # Run the upload API
//! atelier serve --port 8787
//!
//! # Upload a directory into a portfolio section
//! atelier upload ./shoot/ --page portfolio --section weddings --keep-original
//!
//! # View configuration
//! atelier config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// Atelier - optimize portfolio images into object storage.
#[derive(Parser, Debug)]
#[command(name = "atelier")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "ATELIER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP upload API
    Serve(cli::serve::ServeArgs),

    /// Upload images from disk through the pipeline
    Upload(cli::upload::UploadArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .as_deref()
        .map(|p| atelier_core::Config::expand_path(&p.to_string_lossy()))
        .unwrap_or_else(atelier_core::Config::default_path);

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match atelier_core::Config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `atelier config path`."
            );
            atelier_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Atelier v{}", atelier_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Upload(args) => cli::upload::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, &config_path).await,
    }
}
