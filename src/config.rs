// Explicit loader configuration. Every entry point takes a `LoaderConfig`
// instead of reading a process-global credentials path.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// SQLite database file the cleaned batches are appended to.
    pub database: PathBuf,
    /// Directory of `.sql` files used for destination table provisioning.
    pub ddl_directory: PathBuf,
}

impl LoaderConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}
