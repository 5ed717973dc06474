//! prebind CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use prebind_cli::cmd;
use prebind_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Install { project } => {
            cmd::install::install(&project, &cli.env, cli.dry_run).await
        }
        Commands::Locate { dir } => cmd::locate::locate(&dir, &cli.env).await,
        Commands::Env { project } => cmd::env::env(&project, &cli.env).await,
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
