use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use navdb::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for navdb::AppCommand {
    fn from(cmd: Commands) -> navdb::AppCommand {
        match cmd {
            Commands::Load { data_dir } => navdb::AppCommand::Load { data_dir },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Load NAV bulletins into the database
    Load {
        /// Directory searched recursively for nav*.txt files
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => navdb::cli::setup::setup().map(|path| {
            println!("Created default configuration at {}", path.display());
        }),
        Some(cmd) => navdb::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
