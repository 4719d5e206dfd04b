//! Resolved working directories for a run.

use anyhow::{Context, Result};
use fx_options_core::AppConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Where archives are unpacked and leftovers cleaned.
    pub base: PathBuf,
    pub legacy: PathBuf,
    pub normalized: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let appdata = std::env::var_os("APPDATA").map(PathBuf::from);
        Self {
            base: config.paths.base_dir.clone(),
            legacy: config.paths.legacy_path(),
            normalized: config.paths.normalized_path(),
            output: config.paths.output_path(appdata.as_deref()),
        }
    }

    /// Creates the legacy, normalized and output directories.
    ///
    /// # Errors
    /// Returns an error if a directory cannot be created.
    pub fn prepare(&self) -> Result<()> {
        for dir in [&self.legacy, &self.normalized, &self.output] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
