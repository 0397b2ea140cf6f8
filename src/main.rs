//! `slate` binary: serve a content directory.
//!
//! ```text
//! RUST_LOG=debug slate --config slate.toml
//! slate --root ./site --bind 127.0.0.1:3000
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use slate::{site, Server, Settings, Site};
use tracing::{error, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content directory (overrides `root`)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Listen address (overrides `bind`)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), slate::Error> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(root) = cli.root {
        settings.root = root;
    }
    if let Some(bind) = cli.bind {
        settings.bind = bind;
    }
    if !settings.admin_enabled() {
        warn!("admin panel disabled: no admin password configured");
    }

    let router = site::app(&settings);
    let server = Server::bind(&settings.bind)?;
    server.serve(Site::open(settings), router).await
}
