use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod settings;

/// Keep a local directory stocked with verified agent packages.
#[derive(Parser, Debug)]
#[command(name = "depot", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Destination directory. Overrides the config file and DEPOT_DESTINATION.
    #[arg(short, long, global = true)]
    destination: Option<PathBuf>,

    /// More log output. Repeat for trace.
    #[arg(short, long, action = clap::ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download catalog artifacts that are missing or corrupt.
    Sync(cli::SyncCmd),
    /// Check every catalog artifact on disk.
    Verify(cli::VerifyCmd),
    /// Show the catalog.
    List(cli::ListCmd),
    /// Probe free space at the destination.
    Space(cli::SpaceCmd),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let config = match settings::resolve(cli.config.as_deref(), cli.destination) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(destination = %config.destination.display(), "configuration resolved");

    let result = match cli.command {
        Commands::Sync(cmd) => cmd.run(config).await,
        Commands::Verify(cmd) => cmd.run(config).await,
        Commands::List(cmd) => cmd.run(),
        Commands::Space(cmd) => cmd.run(config).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
