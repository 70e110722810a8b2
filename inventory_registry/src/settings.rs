//! Configuration management with layered file and environment variable support.

use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_seconds: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            enable_target: false,
        }
    }
}

/// Request hardening configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub allowed_origins: Vec<String>,
    pub enable_rate_limiting: bool,
    pub rate_limit_per_minute: u32,
    pub max_request_size_kb: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_cors: false,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            enable_rate_limiting: true,
            rate_limit_per_minute: 1_000,
            max_request_size_kb: 256,
        }
    }
}

/// Inventory core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Load the example records at startup
    pub seed_defaults: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self { seed_defaults: true }
    }
}

/// Main settings structure with all configuration sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub inventory: InventoryConfig,
}

impl Settings {
    /// Load settings from the built-in defaults, an optional file and the environment.
    ///
    /// Without an explicit path, `inventory.toml` in the working directory is
    /// used when present. Environment variables use the `INVENTORY` prefix and
    /// `__` separator, e.g. `INVENTORY__SERVER__PORT=9000`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            // Start with default settings
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("inventory").required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("INVENTORY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings for consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("Server port cannot be 0"));
        }
        if self.server.request_timeout_seconds == 0 {
            return Err(anyhow!("Request timeout cannot be 0"));
        }

        if self.security.enable_rate_limiting && self.security.rate_limit_per_minute == 0 {
            return Err(anyhow!("Rate limiting enabled but rate_limit_per_minute is 0"));
        }
        if self.security.max_request_size_kb == 0 {
            return Err(anyhow!("Maximum request size cannot be 0"));
        }

        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(anyhow!("Unknown logging format: {}", other)),
        }
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_defaults_match_default_impl() {
        let embedded: Settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let defaults = Settings::default();

        assert_eq!(embedded.server.host, defaults.server.host);
        assert_eq!(embedded.server.port, defaults.server.port);
        assert_eq!(embedded.logging.format, defaults.logging.format);
        assert_eq!(embedded.security.rate_limit_per_minute, defaults.security.rate_limit_per_minute);
        assert_eq!(embedded.security.allowed_origins, defaults.security.allowed_origins);
        assert!(embedded.inventory.seed_defaults);
        assert!(embedded.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[inventory]\nseed_defaults = false\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert!(!settings.inventory.seed_defaults);
        assert_eq!(settings.logging.format, "json");
    }

    #[test]
    fn test_load_rejects_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        assert!(Settings::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.security.rate_limit_per_minute = 0;
        assert!(settings.validate().is_err());
        settings.security.enable_rate_limiting = false;
        assert!(settings.validate().is_ok());

        let mut settings = Settings::default();
        settings.logging.format = "yaml".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.security.max_request_size_kb = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let settings = Settings::default();
        let rendered = settings.to_toml().unwrap();

        assert!(rendered.contains("[server]"));
        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.server.port, settings.server.port);
        assert_eq!(parsed.security.allowed_origins, settings.security.allowed_origins);
    }
}
