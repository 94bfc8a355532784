//! Error types for the runner.

use std::path::PathBuf;

use tickwire_broker::BrokerError;

/// All errors that can occur while running tickwire from the command line.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("token file {path} is not a JSON object of strings: {source}")]
    TokenFileParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no valid access token; run `tickwire authorize` first")]
    NotAuthorized,

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("aborted: {0}")]
    Aborted(String),

    #[error("tick log error: {0}")]
    Recorder(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
