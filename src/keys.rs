//! Consumer key configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Which E*TRADE environment a broker talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    /// API host prefix: `api` for production, `apisb` for sandbox.
    pub fn host(self) -> &'static str {
        match self {
            Environment::Sandbox => "apisb",
            Environment::Production => "api",
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Sandbox => write!(f, "sandbox"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Environment::Sandbox),
            "production" => Ok(Environment::Production),
            other => Err(Error::Environment(other.to_string())),
        }
    }
}

/// One OAuth1 consumer credential pair. Immutable once loaded.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfig {
    #[serde(alias = "is_production")]
    pub is_production: bool,
    pub key: String,
    pub secret: String,
}

impl KeyConfig {
    pub fn new(is_production: bool, key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            is_production,
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn environment(&self) -> Environment {
        if self.is_production {
            Environment::Production
        } else {
            Environment::Sandbox
        }
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("is_production", &self.is_production)
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Drop for KeyConfig {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Sandbox and production credentials; a broker uses exactly one of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    pub sandbox: KeyConfig,
    pub production: KeyConfig,
}

impl KeySet {
    pub fn select(&self, env: Environment) -> &KeyConfig {
        match env {
            Environment::Sandbox => &self.sandbox,
            Environment::Production => &self.production,
        }
    }

    /// Parse a JSON key file (`{"sandbox": {...}, "production": {...}}`).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
