use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default = "default_moderation_config")]
    pub moderation: ModerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// User allowed to run /stats. Unset means nobody is.
    #[serde(default)]
    pub super_admin_id: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModerationConfig {
    /// How long a foreign-mention warning stays up before the bot removes it.
    #[serde(default = "default_warning_ttl_secs")]
    pub warning_ttl_secs: u64,
    /// Upper bound on each external membership lookup.
    #[serde(default = "default_verify_timeout_secs")]
    pub verify_timeout_secs: u64,
}

impl ModerationConfig {
    pub fn warning_ttl(&self) -> Duration {
        Duration::from_secs(self.warning_ttl_secs)
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }
}

fn default_warning_ttl_secs() -> u64 {
    5
}

fn default_verify_timeout_secs() -> u64 {
    3
}

fn default_moderation_config() -> ModerationConfig {
    ModerationConfig {
        warning_ttl_secs: default_warning_ttl_secs(),
        verify_timeout_secs: default_verify_timeout_secs(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.super_admin_id, None);
        assert_eq!(config.moderation.warning_ttl(), Duration::from_secs(5));
        assert_eq!(config.moderation.verify_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_full_config_overrides_defaults() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            super_admin_id = 777

            [moderation]
            warning_ttl_secs = 10
            verify_timeout_secs = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.super_admin_id, Some(777));
        assert_eq!(config.moderation.warning_ttl_secs, 10);
        assert_eq!(config.moderation.verify_timeout_secs, 2);
    }
}
