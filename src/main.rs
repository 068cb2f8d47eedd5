use clap::Parser;
use tracing_subscriber::EnvFilter;

use logidoc::config;

/// Review frontend for logistics document extraction.
#[derive(Debug, Parser)]
#[command(name = "logidoc", version, about)]
struct Cli {
    /// Backend API base URL
    #[arg(long, env = "API_BASE_URL")]
    api_base_url: Option<String>,

    /// Interface to bind
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to bind
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before clap reads environment fallbacks
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = config::load_settings().await?;
    if let Some(ref url) = cli.api_base_url {
        settings.set_api_base_url(url)?;
    }
    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }

    logidoc::server::serve(&settings).await
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "logidoc=debug,tower_http=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
