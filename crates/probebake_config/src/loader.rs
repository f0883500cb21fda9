//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "probebake.toml";

/// Loads and validates a `probebake.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `probebake.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name"));
    }
    if config.project.scene.is_empty() {
        return Err(ConfigError::MissingField("project.scene"));
    }
    let q = config.bake.quantization;
    if !q.is_finite() || q <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field: "bake.quantization",
            reason: format!("must be a positive number, got {q}"),
        });
    }
    if config.cache.dir.is_empty() {
        return Err(ConfigError::MissingField("cache.dir"));
    }
    if config.cache.texture_ext.is_empty() || config.cache.texture_ext.contains('.') {
        return Err(ConfigError::InvalidValue {
            field: "cache.texture_ext",
            reason: format!("expected a bare extension, got '{}'", config.cache.texture_ext),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[project]
name = "atrium"
scene = "scene.toml"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.name, "atrium");
        assert_eq!(config.project.scene, "scene.toml");
        assert_eq!(config.bake.bounces, 1);
        assert_eq!(config.cache.dir, ".probebake-cache");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
name = "atrium"
scene = "levels/atrium.toml"

[bake]
bounces = 2
quantization = 100.0

[cache]
dir = "build/probes"
texture_ext = "cube"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.bake.bounces, 2);
        assert_eq!(config.bake.quantization, 100.0);
        assert_eq!(config.cache.dir, "build/probes");
        assert_eq!(config.cache.texture_ext, "cube");
    }

    #[test]
    fn missing_name_errors() {
        let toml = r#"
[project]
name = ""
scene = "scene.toml"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("project.name")));
    }

    #[test]
    fn missing_scene_errors() {
        let toml = r#"
[project]
name = "atrium"
scene = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("project.scene")));
    }

    #[test]
    fn non_positive_quantization_errors() {
        let toml = r#"
[project]
name = "atrium"
scene = "scene.toml"

[bake]
quantization = 0.0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "bake.quantization",
                ..
            }
        ));
    }

    #[test]
    fn dotted_extension_errors() {
        let toml = r#"
[project]
name = "atrium"
scene = "scene.toml"

[cache]
texture_ext = ".bake"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "cache.texture_ext",
                ..
            }
        ));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
