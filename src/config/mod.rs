// src/config/mod.rs - Bot configuration file and the runtime config store

use indexmap::IndexMap;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::error::{ConfigError, PersistenceError, StoreError};
use crate::types::PrivilegeContext;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Everything the bot persists. Written back in full after every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub channels: Vec<String>,

    /// Trigger word -> canned response, in insertion order
    #[serde(default)]
    pub word_responses: IndexMap<String, String>,

    #[serde(default = "default_spam_patterns")]
    pub spam_patterns: Vec<String>,

    /// Minimum seconds between two trigger responses, across all channels
    #[serde(default = "default_response_delay")]
    pub response_delay: f64,
}

fn default_spam_patterns() -> Vec<String> {
    vec!["casino".to_string()]
}

fn default_response_delay() -> f64 {
    1.0
}

impl BotConfig {
    /// Config for the given channels with every optional field defaulted
    pub fn new(channels: Vec<String>) -> Self {
        Self {
            channels,
            word_responses: IndexMap::new(),
            spam_patterns: default_spam_patterns(),
            response_delay: default_response_delay(),
        }
    }

    /// Load and validate the configuration file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading config from: {}", path.display());

        let content = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse and validate YAML content
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: BotConfig = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.iter().all(|c| c.trim().is_empty()) {
            warn!("No channels specified in config");
            return Err(ConfigError::MissingChannels);
        }

        // rejects NaN, infinities, negatives and values too large for a Duration
        if Duration::try_from_secs_f64(self.response_delay).is_err() {
            return Err(ConfigError::InvalidResponseDelay(self.response_delay));
        }

        Ok(())
    }

    /// Response delay as a duration. An unvalidated value that is too large
    /// saturates to `Duration::MAX`; a negative or NaN one becomes zero.
    pub fn response_delay(&self) -> Duration {
        let fallback = if self.response_delay > 0.0 { Duration::MAX } else { Duration::ZERO };
        Duration::try_from_secs_f64(self.response_delay).unwrap_or(fallback)
    }
}

/// In-memory configuration plus the file it is persisted to.
///
/// Every mutation requires a privileged author and writes the whole config
/// back before returning. A failed write leaves the in-memory change in
/// place and is reported as [`StoreError::Persistence`].
pub struct ConfigStore {
    config: BotConfig,
    path: PathBuf,
}

impl ConfigStore {
    pub fn new<P: AsRef<Path>>(config: BotConfig, path: P) -> Self {
        Self {
            config,
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn word_responses(&self) -> &IndexMap<String, String> {
        &self.config.word_responses
    }

    pub fn spam_patterns(&self) -> &[String] {
        &self.config.spam_patterns
    }

    /// Add or replace the response for a trigger word
    pub async fn add_trigger(
        &mut self,
        ctx: &PrivilegeContext,
        trigger: &str,
        response: &str,
    ) -> Result<(), StoreError> {
        authorize(ctx)?;

        let key = trigger.to_lowercase();
        self.config.word_responses.insert(key.clone(), response.to_string());
        info!("Set response for trigger '{}'", key);

        self.save().await?;
        Ok(())
    }

    pub async fn remove_trigger(
        &mut self,
        ctx: &PrivilegeContext,
        trigger: &str,
    ) -> Result<(), StoreError> {
        authorize(ctx)?;

        let key = trigger.to_lowercase();
        if self.config.word_responses.shift_remove(&key).is_none() {
            return Err(StoreError::NotFound(trigger.to_string()));
        }
        info!("Removed response for trigger '{}'", key);

        self.save().await?;
        Ok(())
    }

    pub fn list_triggers(
        &self,
        ctx: &PrivilegeContext,
    ) -> Result<Vec<(String, String)>, StoreError> {
        authorize(ctx)?;

        Ok(self
            .config
            .word_responses
            .iter()
            .map(|(trigger, response)| (trigger.clone(), response.clone()))
            .collect())
    }

    pub async fn add_spam_pattern(
        &mut self,
        ctx: &PrivilegeContext,
        pattern: &str,
    ) -> Result<(), StoreError> {
        authorize(ctx)?;

        let pattern = pattern.to_lowercase();
        info!("Added spam pattern '{}'", pattern);
        self.config.spam_patterns.push(pattern);

        self.save().await?;
        Ok(())
    }

    /// Remove the first occurrence of a spam pattern
    pub async fn remove_spam_pattern(
        &mut self,
        ctx: &PrivilegeContext,
        pattern: &str,
    ) -> Result<(), StoreError> {
        authorize(ctx)?;

        let pattern = pattern.to_lowercase();
        let position = self
            .config
            .spam_patterns
            .iter()
            .position(|p| *p == pattern)
            .ok_or_else(|| StoreError::NotFound(pattern.clone()))?;

        self.config.spam_patterns.remove(position);
        info!("Removed spam pattern '{}'", pattern);

        self.save().await?;
        Ok(())
    }

    pub fn list_spam_patterns(&self, ctx: &PrivilegeContext) -> Result<Vec<String>, StoreError> {
        authorize(ctx)?;
        Ok(self.config.spam_patterns.clone())
    }

    /// Write the full configuration to disk, replacing the previous file
    pub async fn save(&self) -> Result<(), PersistenceError> {
        let content = serde_yaml::to_string(&self.config)?;

        if let Err(source) = fs::write(&self.path, content).await {
            error!("Failed to save config to {}: {}", self.path.display(), source);
            return Err(PersistenceError::Io {
                path: self.path.clone(),
                source,
            });
        }

        debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }
}

fn authorize(ctx: &PrivilegeContext) -> Result<(), StoreError> {
    if ctx.is_privileged() {
        Ok(())
    } else {
        Err(StoreError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MODERATOR: PrivilegeContext = PrivilegeContext {
        is_moderator: true,
        is_broadcaster: false,
    };

    const VIEWER: PrivilegeContext = PrivilegeContext {
        is_moderator: false,
        is_broadcaster: false,
    };

    fn store_in(dir: &Path) -> ConfigStore {
        ConfigStore::new(BotConfig::new(vec!["testchannel".to_string()]), dir.join("config.yml"))
    }

    #[test]
    fn test_defaults_applied() {
        let config = BotConfig::from_yaml("channels:\n  - somechannel\n").unwrap();

        assert_eq!(config.channels, vec!["somechannel".to_string()]);
        assert!(config.word_responses.is_empty());
        assert_eq!(config.spam_patterns, vec!["casino".to_string()]);
        assert_eq!(config.response_delay, 1.0);
        assert_eq!(config.response_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_channels_rejected() {
        let result = BotConfig::from_yaml("response_delay: 2.0\n");
        assert!(matches!(result, Err(ConfigError::MissingChannels)));

        let result = BotConfig::from_yaml("channels: []\n");
        assert!(matches!(result, Err(ConfigError::MissingChannels)));
    }

    #[test]
    fn test_invalid_response_delay_rejected() {
        let result = BotConfig::from_yaml("channels: [a]\nresponse_delay: -1\n");
        assert!(matches!(result, Err(ConfigError::InvalidResponseDelay(_))));
    }

    #[test]
    fn test_oversized_response_delay_rejected() {
        let result = BotConfig::from_yaml("channels: [a]\nresponse_delay: 1e20\n");
        assert!(matches!(result, Err(ConfigError::InvalidResponseDelay(_))));

        let result = BotConfig::from_yaml("channels: [a]\nresponse_delay: .inf\n");
        assert!(matches!(result, Err(ConfigError::InvalidResponseDelay(_))));

        let config = BotConfig::from_yaml("channels: [a]\nresponse_delay: 86400\n").unwrap();
        assert_eq!(config.response_delay(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_unvalidated_huge_delay_saturates() {
        let mut config = BotConfig::new(vec!["a".to_string()]);
        config.response_delay = 1e20;
        assert_eq!(config.response_delay(), Duration::MAX);

        config.response_delay = -5.0;
        assert_eq!(config.response_delay(), Duration::ZERO);
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let result = BotConfig::from_yaml("channels: [unclosed\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));

        let result = BotConfig::from_yaml("channels: [a]\nword_responses: [not, a, map]\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_trigger_order_preserved() {
        let yaml = "channels: [a]\nword_responses:\n  zebra: z\n  apple: a\n  mango: m\n";
        let config = BotConfig::from_yaml(yaml).unwrap();
        let keys: Vec<&str> = config.word_responses.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = tempdir().unwrap();
        let result = BotConfig::load(temp_dir.path().join("absent.yml")).await;
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[tokio::test]
    async fn test_add_trigger_persists() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        store.add_trigger(&MODERATOR, "GO", "bye").await.unwrap();
        assert_eq!(store.word_responses().get("go"), Some(&"bye".to_string()));

        let reloaded = BotConfig::load(store.path()).await.unwrap();
        assert_eq!(reloaded.word_responses.get("go"), Some(&"bye".to_string()));
        assert_eq!(reloaded.channels, vec!["testchannel".to_string()]);
    }

    #[tokio::test]
    async fn test_add_trigger_upserts() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        store.add_trigger(&MODERATOR, "hello", "hi").await.unwrap();
        store.add_trigger(&MODERATOR, "Hello", "hey there").await.unwrap();

        assert_eq!(store.word_responses().len(), 1);
        assert_eq!(store.word_responses().get("hello"), Some(&"hey there".to_string()));
    }

    #[tokio::test]
    async fn test_unprivileged_mutation_rejected() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        let result = store.add_trigger(&VIEWER, "go", "bye").await;
        assert!(matches!(result, Err(StoreError::Unauthorized)));
        assert!(store.word_responses().is_empty());
        assert!(!store.path().exists());

        let result = store.add_spam_pattern(&VIEWER, "scam").await;
        assert!(matches!(result, Err(StoreError::Unauthorized)));
        assert_eq!(store.spam_patterns(), &["casino".to_string()]);

        assert!(matches!(store.list_triggers(&VIEWER), Err(StoreError::Unauthorized)));
        assert!(matches!(store.list_spam_patterns(&VIEWER), Err(StoreError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_broadcaster_is_privileged() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());
        let broadcaster = PrivilegeContext {
            is_moderator: false,
            is_broadcaster: true,
        };

        store.add_spam_pattern(&broadcaster, "Free Money").await.unwrap();
        assert_eq!(store.list_spam_patterns(&broadcaster).unwrap(), vec!["casino", "free money"]);
    }

    #[tokio::test]
    async fn test_remove_absent_is_not_found() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        let result = store.remove_spam_pattern(&MODERATOR, "nonexistent").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(store.spam_patterns(), &["casino".to_string()]);
        // nothing was persisted
        assert!(!store.path().exists());

        let result = store.remove_trigger(&MODERATOR, "nope").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_spam_pattern_removes_first_match() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        store.add_spam_pattern(&MODERATOR, "scam").await.unwrap();
        store.add_spam_pattern(&MODERATOR, "casino").await.unwrap();
        store.remove_spam_pattern(&MODERATOR, "CASINO").await.unwrap();

        assert_eq!(store.spam_patterns(), &["scam".to_string(), "casino".to_string()]);

        let reloaded = BotConfig::load(store.path()).await.unwrap();
        assert_eq!(reloaded.spam_patterns, vec!["scam".to_string(), "casino".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_trigger_keeps_order() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        for trigger in ["one", "two", "three"] {
            store.add_trigger(&MODERATOR, trigger, trigger).await.unwrap();
        }
        store.remove_trigger(&MODERATOR, "TWO").await.unwrap();

        let triggers: Vec<String> = store
            .list_triggers(&MODERATOR)
            .unwrap()
            .into_iter()
            .map(|(trigger, _)| trigger)
            .collect();
        assert_eq!(triggers, vec!["one", "three"]);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_memory_state() {
        let temp_dir = tempdir().unwrap();
        let mut store = ConfigStore::new(
            BotConfig::new(vec!["testchannel".to_string()]),
            temp_dir.path().join("missing_dir").join("config.yml"),
        );

        let result = store.add_trigger(&MODERATOR, "go", "bye").await;
        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert_eq!(store.word_responses().get("go"), Some(&"bye".to_string()));
    }
}
