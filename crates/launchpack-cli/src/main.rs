mod dirs;
mod flows;
mod launch;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "launchpack")]
#[command(about = "Self-updating game client installer and launcher", long_about = None)]
struct Cli {
    /// Installation directory override.
    #[arg(long, global = true)]
    install_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report the installed version and whether an update is available.
    Status,
    /// Download and install the configured client release.
    Install {
        /// Reinstall even when already up to date.
        #[arg(long)]
        force: bool,
    },
    /// Start the installed client.
    Launch,
    /// Manage folders preserved across updates.
    Protect {
        #[command(subcommand)]
        action: ProtectAction,
    },
    /// Replace this launcher with the newest published build.
    SelfUpdate,
    /// Print resolved paths and configuration state.
    Doctor,
}

#[derive(Subcommand, Debug)]
enum ProtectAction {
    Add { name: String },
    Remove { name: String },
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = dirs::install_root(cli.install_dir)?;

    match cli.command {
        Commands::Status => flows::status(&root),
        Commands::Install { force } => flows::install(&root, force),
        Commands::Launch => flows::launch(&root),
        Commands::Protect { action } => flows::protect(&root, action),
        Commands::SelfUpdate => flows::self_update(&root),
        Commands::Doctor => flows::doctor(&root),
    }
}
