//! Persisted token state.
//!
//! The handshake spans two process runs (the user authorizes in a browser
//! in between), so the request token and the access token are kept in a
//! key-value store under fixed names, each as a JSON-serialized
//! [`OAuthToken`].

use std::collections::HashMap;

use tickwire::OAuthToken;

use crate::error::BrokerError;

pub const REQUEST_TOKEN_KEY: &str = "requestToken";
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Get/set of named string blobs.
pub trait TokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, BrokerError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), BrokerError>;
}

/// Load and decode a token stored under `key`.
pub fn load_token<S: TokenStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Option<OAuthToken>, BrokerError> {
    match store.get(key)? {
        None => Ok(None),
        Some(json) => OAuthToken::from_json(&json)
            .map(Some)
            .map_err(|e| BrokerError::TokenStore(format!("stored `{key}` is not a token: {e}"))),
    }
}

/// Encode and store a token under `key`, replacing any previous value.
pub fn save_token<S: TokenStore + ?Sized>(
    store: &mut S,
    key: &str,
    token: &OAuthToken,
) -> Result<(), BrokerError> {
    let json = token
        .to_json()
        .map_err(|e| BrokerError::TokenStore(format!("failed to encode `{key}`: {e}")))?;
    store.set(key, &json)
}

/// In-process store; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    entries: HashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    /// Builder-style [`save_token`].
    pub fn with_token(mut self, key: &str, token: &OAuthToken) -> Result<Self, BrokerError> {
        save_token(&mut self, key, token)?;
        Ok(self)
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, BrokerError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), BrokerError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
