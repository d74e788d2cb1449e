use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::types::{PolicyKind, SYSTEM_CLIENT_ID};

/// Top-level application config — loaded from config/config.toml
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub server: ServerConfig,
    pub toggle: ToggleConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleConfig {
    pub policy: PolicyKind,
    #[serde(default = "default_system_client_id")]
    pub system_client_id: String,
    #[serde(default)]
    pub seed_on_start: bool,
}

fn default_system_client_id() -> String {
    SYSTEM_CLIENT_ID.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Snapshot file, required for the `file` backend.
    pub path: Option<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.toggle.system_client_id.is_empty(),
            "toggle.system_client_id must not be empty"
        );
        if self.storage.backend == StorageBackend::File {
            anyhow::ensure!(
                self.storage.path.as_deref().is_some_and(|p| !p.is_empty()),
                "storage.path is required for the file backend"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
[general]
log_level = "info"

[server]
bind_addr = "127.0.0.1:8080"

[toggle]
policy = "timestamp_lww"
seed_on_start = true
"#;

    #[test]
    fn test_app_config_deserialize() {
        let toml_str = format!(
            "{}\n[storage]\nbackend = \"file\"\npath = \"data/state.json\"\n",
            BASE
        );
        let config = AppConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.toggle.policy, PolicyKind::TimestampLww);
        assert_eq!(config.toggle.system_client_id, "system");
        assert!(config.toggle.seed_on_start);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.path.as_deref(), Some("data/state.json"));
    }

    #[test]
    fn test_file_backend_requires_path() {
        let toml_str = format!("{}\n[storage]\nbackend = \"file\"\n", BASE);
        let err = AppConfig::parse(&toml_str).unwrap_err();
        assert!(err.to_string().contains("storage.path"));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let toml_str = BASE.replace("timestamp_lww", "optimistic")
            + "\n[storage]\nbackend = \"memory\"\n";
        assert!(AppConfig::parse(&toml_str).is_err());
    }

    #[test]
    fn test_empty_system_client_rejected() {
        let toml_str = BASE.replace(
            "seed_on_start = true",
            "seed_on_start = true\nsystem_client_id = \"\"",
        ) + "\n[storage]\nbackend = \"memory\"\n";
        assert!(AppConfig::parse(&toml_str).is_err());
    }
}
