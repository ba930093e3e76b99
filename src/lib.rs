pub mod cli;
pub mod config;
pub mod core;
pub mod ingest;
pub mod log;
pub mod source;
pub mod store;

use crate::store::SqliteStore;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    /// Load bulletins, optionally from a directory other than the configured one
    Load { data_dir: Option<PathBuf> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("navdb starting...");

    let mut config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Load { data_dir } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }

            let store = SqliteStore::open(&config.database_path).await?;
            let pb = cli::ui::new_spinner();
            let result = ingest::load(&config, &store, &pb).await;
            pb.finish_and_clear();
            store.close().await;

            let report = result?;
            println!("{}", report.display_as_table());
            Ok(())
        }
    }
}
