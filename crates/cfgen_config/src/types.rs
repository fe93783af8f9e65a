//! Configuration types deserialized from `cfgen.toml`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cfgen_cache::{CacheOptions, CacheStrategy, DEFAULT_NAMESPACE};
use cfgen_schema::{FingerprintMode, SchemaDirectory};
use serde::Deserialize;

/// The top-level project configuration parsed from `cfgen.toml`.
///
/// Every section is optional; a missing file behaves like an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    /// Artifact cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Where subject schemas are declared.
    #[serde(default)]
    pub schemas: SchemaConfig,
}

/// The `[cache]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Storage root for the registry and artifact files, relative to the
    /// project directory.
    pub root: String,
    /// Reuse policy for generated artifacts.
    pub strategy: CacheStrategy,
    /// Base namespace generated artifacts are placed under.
    pub namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: ".cfgen/cache".to_string(),
            strategy: CacheStrategy::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

/// The `[schemas]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directory of `.toml` schema files, relative to the project directory.
    pub dir: String,
    /// How schema files are fingerprinted for the `validate` strategy.
    pub fingerprint: FingerprintMode,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            dir: "schemas".to_string(),
            fingerprint: FingerprintMode::default(),
        }
    }
}

impl ProjectConfig {
    /// Absolute cache root for a project rooted at `project_dir`.
    pub fn cache_root(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.cache.root)
    }

    /// Absolute schema directory for a project rooted at `project_dir`.
    pub fn schema_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.schemas.dir)
    }

    /// Cache options reading schemas from the configured directory.
    pub fn cache_options(&self, project_dir: &Path) -> CacheOptions {
        let schemas = SchemaDirectory::new(self.schema_dir(project_dir), self.schemas.fingerprint);
        CacheOptions::new(self.cache_root(project_dir), Arc::new(schemas))
            .strategy(self.cache.strategy)
            .namespace(self.cache.namespace.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProjectConfig::default();
        assert_eq!(config.cache.root, ".cfgen/cache");
        assert_eq!(config.cache.strategy, CacheStrategy::Validate);
        assert_eq!(config.cache.namespace, "cfgen::cache");
        assert_eq!(config.schemas.dir, "schemas");
        assert_eq!(config.schemas.fingerprint, FingerprintMode::Mtime);
    }

    #[test]
    fn paths_are_relative_to_project() {
        let config = ProjectConfig::default();
        let project = Path::new("/work/app");
        assert_eq!(
            config.cache_root(project),
            PathBuf::from("/work/app/.cfgen/cache")
        );
        assert_eq!(config.schema_dir(project), PathBuf::from("/work/app/schemas"));
    }

    #[test]
    fn absolute_paths_win() {
        let config: ProjectConfig = toml::from_str("[cache]\nroot = \"/var/cache/cfgen\"\n").unwrap();
        assert_eq!(
            config.cache_root(Path::new("/work/app")),
            PathBuf::from("/var/cache/cfgen")
        );
    }

    #[test]
    fn cache_options_carry_settings() {
        let config: ProjectConfig =
            toml::from_str("[cache]\nstrategy = \"always\"\nnamespace = \"gen\"\n").unwrap();
        let options = config.cache_options(Path::new("/work/app"));
        assert_eq!(options.strategy, CacheStrategy::Always);
        assert_eq!(options.namespace, "gen");
        assert_eq!(options.root, PathBuf::from("/work/app/.cfgen/cache"));
    }
}
