use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Default location of the optional TOML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Prefix for environment overrides, e.g. `FXOPT_PATHS__OUTPUT_DIR`.
pub const ENV_PREFIX: &str = "FXOPT_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from the default TOML path layered over built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file or environment cannot be parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Loads configuration by merging defaults, a TOML file and environment variables.
    ///
    /// A missing file is not an error; the defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file or environment cannot be parsed.
    pub fn load_from(path: &Path) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(path).extract()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
