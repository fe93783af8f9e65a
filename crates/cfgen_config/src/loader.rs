//! Configuration file loading and validation.

use std::path::Path;

use cfgen_schema::SubjectName;

use crate::error::ConfigError;
use crate::types::ProjectConfig;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "cfgen.toml";

/// Loads and validates a `cfgen.toml` configuration from a project directory.
///
/// Reads `<project_dir>/cfgen.toml`, parses it, and validates required fields.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `cfgen.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.cache.root.trim().is_empty() {
        return Err(ConfigError::MissingField("cache.root".to_string()));
    }
    if config.schemas.dir.trim().is_empty() {
        return Err(ConfigError::MissingField("schemas.dir".to_string()));
    }

    let namespace = config.cache.namespace.trim_matches(':');
    if !namespace.is_empty() && SubjectName::parse(&format!("{namespace}::Probe")).is_err() {
        return Err(ConfigError::ValidationError(format!(
            "cache.namespace '{}' is not a '::'-separated path of identifiers",
            config.cache.namespace
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgen_cache::CacheStrategy;
    use cfgen_schema::FingerprintMode;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.cache.strategy, CacheStrategy::Validate);
        assert_eq!(config.schemas.dir, "schemas");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[cache]
root = "build/cfgen"
strategy = "never"
namespace = "app::generated"

[schemas]
dir = "config/schemas"
fingerprint = "content"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.cache.root, "build/cfgen");
        assert_eq!(config.cache.strategy, CacheStrategy::Never);
        assert_eq!(config.cache.namespace, "app::generated");
        assert_eq!(config.schemas.dir, "config/schemas");
        assert_eq!(config.schemas.fingerprint, FingerprintMode::Content);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = load_config_from_str("[cache]\nstrategy = \"always\"\n").unwrap();
        assert_eq!(config.cache.strategy, CacheStrategy::Always);
        assert_eq!(config.cache.root, ".cfgen/cache");
        assert_eq!(config.cache.namespace, "cfgen::cache");
    }

    #[test]
    fn empty_root_errors() {
        let err = load_config_from_str("[cache]\nroot = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "cache.root"));
    }

    #[test]
    fn empty_schema_dir_errors() {
        let err = load_config_from_str("[schemas]\ndir = \" \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "schemas.dir"));
    }

    #[test]
    fn bad_namespace_errors() {
        let err = load_config_from_str("[cache]\nnamespace = \"my gen\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = load_config_from_str("[cache]\nnamespace = \"a::::b\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_namespace_is_allowed() {
        let config = load_config_from_str("[cache]\nnamespace = \"\"\n").unwrap();
        assert!(config.cache.namespace.is_empty());
    }

    #[test]
    fn unknown_strategy_errors() {
        let err = load_config_from_str("[cache]\nstrategy = \"sometimes\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[cache]\nroot = \"out\"\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.cache.root, "out");
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { ref path, .. } if path.ends_with(CONFIG_FILE)));
    }
}
