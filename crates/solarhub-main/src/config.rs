// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SolarHub.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solarhub_core::ProviderConfig;
use std::collections::HashSet;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Vendor accounts to connect, one entry per `[[providers]]` table
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl AppConfig {
    /// Load from a TOML file, or defaults when the file does not exist.
    /// Environment overrides are applied either way.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_toml_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text)?;
        for provider in &mut config.providers {
            if provider.name.trim().is_empty() {
                provider.name.clone_from(&provider.provider_type);
            }
        }
        Ok(config)
    }

    /// Apply `SOLARHUB_HOST`, `SOLARHUB_PORT` and `SOLARHUB_LOG_LEVEL`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SOLARHUB_HOST")
            && !host.is_empty()
        {
            self.server.host = host;
        }

        if let Some(port) = lookup("SOLARHUB_PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            self.server.port = port;
        }

        if let Some(level) = lookup("SOLARHUB_LOG_LEVEL")
            && !level.is_empty()
        {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }
        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host must not be empty");
        }

        let mut names = HashSet::new();
        for (idx, provider) in self.providers.iter().enumerate() {
            if provider.provider_type.trim().is_empty() {
                anyhow::bail!("Provider {} has empty type", idx);
            }
            if provider.name.trim().is_empty() {
                anyhow::bail!("Provider {} ({}) has empty name", idx, provider.provider_type);
            }
            if !names.insert(provider.name.as_str()) {
                anyhow::bail!("Duplicate provider name '{}'", provider.name);
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const SAMPLE: &str = r#"
[server]
port = 9090

[logging]
format = "json"

[[providers]]
type = "saj"
name = "roof"
timezone = "Europe/Prague"

[providers.credentials]
appId = "app"
appSecret = "secret"

[[providers]]
type = "sma"
enabled = false

[providers.credentials]
bearerToken = "token"
"#;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Console);
        assert!(config.providers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_providers() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].credential("appId"), Some("app"));
        assert_eq!(config.providers[0].timezone.as_deref(), Some("Europe/Prague"));
        // Unnamed providers take their type as name
        assert_eq!(config.providers[1].name, "sma");

        let enabled: Vec<&str> = config
            .enabled_providers()
            .map(|p| p.provider_type.as_str())
            .collect();
        assert_eq!(enabled, vec!["saj"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SOLARHUB_HOST", "127.0.0.1"),
            ("SOLARHUB_PORT", "3000"),
            ("SOLARHUB_LOG_LEVEL", "debug"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| (*v).to_owned()));

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.logging.level, "debug");

        // Unparseable port is ignored
        config.apply_overrides(|key| (key == "SOLARHUB_PORT").then(|| "http".to_owned()));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().unwrap_err().to_string().contains("port"));

        let mut config = AppConfig::default();
        config.providers.push(ProviderConfig::new("saj"));
        config.providers.push(ProviderConfig::new("saj"));
        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("Duplicate provider name 'saj'")
        );

        let mut config = AppConfig::default();
        config.providers.push(ProviderConfig::new(""));
        assert!(config.validate().unwrap_err().to_string().contains("empty type"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.providers[0].name, "roof");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[server]\nport = \"eighty\"\n").unwrap();

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
