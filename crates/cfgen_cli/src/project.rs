//! Locating the project configuration and opening its cache.

use std::path::{Path, PathBuf};

use cfgen_cache::{CacheError, ConfigCache};
use cfgen_config::{load_config, load_config_file, ConfigError, ProjectConfig, CONFIG_FILE};

use crate::GlobalArgs;

/// A loaded project: its directory and configuration.
#[derive(Debug)]
pub struct Project {
    /// Directory relative paths in the configuration resolve against.
    pub dir: PathBuf,
    /// The parsed configuration.
    pub config: ProjectConfig,
}

impl Project {
    /// Loads the project named by `--config`, or the one in the current
    /// directory. Without a `cfgen.toml` the defaults apply.
    pub fn load(global: &GlobalArgs) -> Result<Self, ConfigError> {
        match &global.config {
            Some(path) => Self::from_file(Path::new(path)),
            None => {
                let dir = std::env::current_dir().map_err(|source| ConfigError::Io {
                    path: PathBuf::from("."),
                    source,
                })?;
                Self::from_dir(&dir)
            }
        }
    }

    /// Loads an explicit configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = load_config_file(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self { dir, config })
    }

    /// Loads `<dir>/cfgen.toml` if present.
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let config = if dir.join(CONFIG_FILE).is_file() {
            load_config(dir)?
        } else {
            tracing::debug!(dir = %dir.display(), "no {CONFIG_FILE}, using defaults");
            ProjectConfig::default()
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            config,
        })
    }

    /// Opens the project's artifact cache.
    pub fn open_cache(&self) -> Result<ConfigCache, CacheError> {
        ConfigCache::open(self.config.cache_options(&self.dir))
    }
}
