//! Worklens - employer reviews in your browser

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// Worklens employer review server
#[derive(Parser)]
#[command(name = "worklens", version, about, long_about = None)]
struct Cli {
    /// Data directory (defaults to ~/.worklens)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Listen port, overriding settings.json and WORKLENS_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
            .join(".worklens"),
    };

    worklens_server::start_server(&data_dir, cli.port).await
}
