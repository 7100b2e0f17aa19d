//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `TelemetryBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Broker: {}:{}", blueprint.broker.host, blueprint.broker.port);
//! ```

mod parser;
mod validator;

pub use contracts::TelemetryBlueprint;
pub use parser::ConfigFormat;

use contracts::TelemetryError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<TelemetryBlueprint, TelemetryError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<TelemetryBlueprint, TelemetryError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize TelemetryBlueprint to TOML string
    pub fn to_toml(blueprint: &TelemetryBlueprint) -> Result<String, TelemetryError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| TelemetryError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize TelemetryBlueprint to JSON string
    pub fn to_json(blueprint: &TelemetryBlueprint) -> Result<String, TelemetryError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| TelemetryError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, TelemetryError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            TelemetryError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            TelemetryError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, TelemetryError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<TelemetryBlueprint, TelemetryError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
[broker]
host = "localhost"

[[poles]]
id = 1
min_level = 0.0
max_level = 8.0

[[poles]]
id = 2
min_level = 0.0
max_level = 8.0

[[stores]]
name = "log"
store_type = "log"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let blueprint = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.poles.len(), 2);
        assert_eq!(blueprint.broker.port, 1883);
    }

    #[test]
    fn test_load_invalid_config_fails_validation() {
        let content = r#"
[[poles]]
id = 1
min_level = 5.0
max_level = 1.0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(matches!(
            result,
            Err(TelemetryError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let blueprint = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let rendered = ConfigLoader::to_toml(&blueprint).unwrap();
        let reparsed = ConfigLoader::load_from_str(&rendered, ConfigFormat::Toml).unwrap();
        assert_eq!(reparsed.poles.len(), blueprint.poles.len());
    }
}
