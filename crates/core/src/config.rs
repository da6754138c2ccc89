use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
    #[serde(default = "default_user_name")]
    pub default_user_name: String,
    /// Number of conversations returned by `history` when no limit is given.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_user_id() -> String {
    "default_user".to_string()
}

fn default_user_name() -> String {
    "User".to_string()
}

fn default_history_limit() -> usize {
    10
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
            default_user_name: default_user_name(),
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersConfig {
    #[serde(default = "default_enabled")]
    pub calendar: bool,
    #[serde(default = "default_enabled")]
    pub notes: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            calendar: default_enabled(),
            notes: default_enabled(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_host")]
    pub host: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `ATTUNE_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("ATTUNE_USER_ID").filter(|v| !v.trim().is_empty()) {
            self.assistant.default_user_id = id;
        }
        if let Some(name) = lookup("ATTUNE_USER_NAME").filter(|v| !v.trim().is_empty()) {
            self.assistant.default_user_name = name;
        }
        if let Some(host) = lookup("ATTUNE_HOST").filter(|v| !v.trim().is_empty()) {
            self.gateway.host = host;
        }
        if let Some(port) = lookup("ATTUNE_PORT").and_then(|v| v.trim().parse::<u16>().ok()) {
            self.gateway.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{ "gateway": { "port": 9100 } }"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.gateway.port, 9100);
        assert_eq!(cfg.gateway.host, "0.0.0.0");
        assert_eq!(cfg.assistant.default_user_name, "User");
        assert!(cfg.providers.calendar);
        assert_eq!(cfg.assistant.history_limit, 10);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_base(dir.path().to_path_buf());
        let mut cfg = Config::default();
        cfg.providers.notes = false;
        cfg.save(&paths.config_file()).unwrap();

        let loaded = Config::load_or_default(&paths).unwrap();
        assert!(!loaded.providers.notes);
    }

    #[test]
    fn test_malformed_config_is_configuration_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_base(dir.path().to_path_buf());
        std::fs::write(paths.config_file(), "{ \"gateway\": { \"port\": \"high\" } }").unwrap();

        let err = Config::load_or_default(&paths).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ATTUNE_USER_NAME", "Alex"),
            ("ATTUNE_PORT", "not-a-port"),
            ("ATTUNE_HOST", "127.0.0.1"),
        ]
        .into_iter()
        .collect();
        let mut cfg = Config::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.assistant.default_user_name, "Alex");
        assert_eq!(cfg.assistant.default_user_id, "default_user");
        assert_eq!(cfg.gateway.host, "127.0.0.1");
        assert_eq!(cfg.gateway.port, 8000);
    }
}
