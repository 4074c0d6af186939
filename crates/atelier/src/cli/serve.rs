//! The `atelier serve` command.

use atelier_core::Config;
use clap::Args;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!(
        backend = ?config.storage.backend,
        optimized_bucket = %config.storage.optimized_bucket,
        rate_limit = config.rate_limit.enabled,
        "Starting upload server"
    );
    crate::server::run(config).await
}
