//! textlens server binary.
//!
//! ```bash
//! # Start with defaults (port 8000, Ollama at localhost:11434)
//! textlens-server
//!
//! # Custom configuration
//! OLLAMA_HOST=http://192.168.1.100:11434 TEXTLENS_MAX_CONCURRENT=8 textlens-server --port 9000
//! ```

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use textlens_server::{run_server, AppConfig};

#[derive(Parser)]
#[command(name = "textlens-server")]
#[command(version)]
#[command(about = "Summarize, classify and index text with an LLM backend", long_about = None)]
struct Cli {
    /// Port to listen on (overrides TEXTLENS_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database URL (overrides TEXTLENS_DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Skip the startup banner
    #[arg(long)]
    no_banner: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("textlens_server=info,textlens_core=info,tower_http=info")
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load configuration
    let mut config = AppConfig::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }

    run_server(config, !cli.no_banner).await
}
