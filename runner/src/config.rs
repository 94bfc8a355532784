//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tickwire::{Environment, KeyConfig, KeySet};
use tickwire_broker::{PollConfig, RetryPolicy};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub broker: BrokerConfig,
    pub keys: KeySet,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub account_id_key: Option<String>,
    pub watch_list: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    #[serde(default)]
    pub balance: bool,
    /// 0 retries forever.
    #[serde(default)]
    pub max_consecutive_failures: u32,
    #[serde(default)]
    pub backoff_ms: u64,
}

fn default_interval() -> u64 {
    1000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            balance: false,
            max_consecutive_failures: 0,
            backoff_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_token_file")]
    pub token_file: String,
}

fn default_token_file() -> String {
    "./tokens.json".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_tick_file")]
    pub tick_file: String,
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_tick_file() -> String {
    "ticks.jsonl".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            tick_file: default_tick_file(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    /// Parse and validate TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.broker.watch_list.is_empty() {
            return Err(Error::Config("watch_list must not be empty".into()));
        }
        if let Some(bad) = self
            .broker
            .watch_list
            .iter()
            .find(|s| s.trim().is_empty() || s.contains(|c: char| matches!(c, ',' | '/' | '?' | '#')))
        {
            return Err(Error::Config(format!("invalid symbol in watch_list: {bad:?}")));
        }
        if self.polling.interval_ms == 0 {
            return Err(Error::Config("interval_ms must be > 0".into()));
        }
        if self.polling.balance && self.account_id_key().is_none() {
            return Err(Error::Config(
                "polling.balance requires broker.account_id_key".into(),
            ));
        }

        let env = self.broker.environment;
        let keys = self.key_config();
        if keys.key.is_empty() || keys.secret.is_empty() {
            return Err(Error::Config(format!("keys.{env} must have a key and a secret")));
        }
        if keys.environment() != env {
            return Err(Error::Config(format!(
                "keys.{env} has isProduction = {}",
                keys.is_production
            )));
        }
        Ok(())
    }

    /// The key pair for the configured environment.
    pub fn key_config(&self) -> &KeyConfig {
        self.keys.select(self.broker.environment)
    }

    pub fn account_id_key(&self) -> Option<&str> {
        self.broker
            .account_id_key
            .as_deref()
            .filter(|k| !k.is_empty())
    }

    /// Polling settings for the tick stream.
    pub fn poll_config(&self) -> PollConfig {
        let retry = RetryPolicy {
            max_consecutive_failures: match self.polling.max_consecutive_failures {
                0 => None,
                n => Some(n),
            },
            backoff: Duration::from_millis(self.polling.backoff_ms),
        };
        let poll = PollConfig::new(
            Duration::from_millis(self.polling.interval_ms),
            self.broker.watch_list.clone(),
        )
        .with_retry(retry);

        match (self.polling.balance, self.account_id_key()) {
            (true, Some(key)) => poll.with_balance(key),
            _ => poll,
        }
    }

    pub fn token_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.token_file)
    }

    /// Full path to the tick log file.
    pub fn tick_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.tick_file)
    }
}
