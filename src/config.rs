use crate::core::NumberPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Directory searched recursively for `nav*.txt` bulletins
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Number of NAV records written per transaction
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Stop after this many batches of NAV records; unlimited when unset
    #[serde(default)]
    pub max_batches: Option<usize>,
    /// Fail the load on malformed amounts instead of storing them as NULL
    #[serde(default)]
    pub strict_numbers: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("mfdb.sqlite3")
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: default_data_dir(),
            database_path: default_database_path(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_batches: None,
            strict_numbers: false,
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to defaults when none exists.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "navdb", "navdb")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be greater than zero");
        }
        Ok(())
    }

    pub fn number_policy(&self) -> NumberPolicy {
        if self.strict_numbers {
            NumberPolicy::Strict
        } else {
            NumberPolicy::Lenient
        }
    }
}
