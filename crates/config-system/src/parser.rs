//! Configuration file parser for JSON and TOML

use crate::{ChartCanvasConfig, ConfigError, ConfigValidator, Result};
use std::fs;
use std::path::Path;

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

/// Configuration parser
pub struct ConfigParser;

impl ConfigParser {
    /// Parse and validate a configuration file, format chosen by extension
    pub fn parse_file(path: impl AsRef<Path>) -> Result<ChartCanvasConfig> {
        let path = path.as_ref();
        let format = Self::detect_format(path)?;
        let content = fs::read_to_string(path)?;

        log::debug!("[ConfigParser] Loading {:?} config from {}", format, path.display());
        Self::parse_string(&content, format)
    }

    /// Parse and validate a configuration string
    pub fn parse_string(content: &str, format: ConfigFormat) -> Result<ChartCanvasConfig> {
        let config = match format {
            ConfigFormat::Json => Self::parse_json(content)?,
            ConfigFormat::Toml => Self::parse_toml(content)?,
        };
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    fn parse_json(content: &str) -> Result<ChartCanvasConfig> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("JSON parse error: {}", e)))
    }

    fn parse_toml(content: &str) -> Result<ChartCanvasConfig> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e)))
    }

    /// Detect configuration format from file extension
    pub fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ConfigError::Parse("Cannot determine config format from file extension".to_string())
        })?;

        match ext.to_lowercase().as_str() {
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::Parse(format!(
                "Unsupported config format: {}",
                ext
            ))),
        }
    }
}

/// Configuration serializer
pub struct ConfigSerializer;

impl ConfigSerializer {
    /// Serialize configuration to a file
    pub fn serialize_file(config: &ChartCanvasConfig, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = ConfigParser::detect_format(path)?;
        let content = Self::serialize_string(config, format)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Serialize configuration to a string
    pub fn serialize_string(config: &ChartCanvasConfig, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config)
                .map_err(|e| ConfigError::Parse(format!("JSON serialize error: {}", e))),
            ConfigFormat::Toml => toml::to_string_pretty(config)
                .map_err(|e| ConfigError::Parse(format!("TOML serialize error: {}", e))),
        }
    }
}
