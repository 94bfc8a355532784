//! Token persistence in a single JSON object file.
//!
//! The file maps store keys (`requestToken`, `accessToken`) to the
//! JSON-serialized token, mirroring a browser-style local storage.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use tickwire_broker::{BrokerError, TokenStore};

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileTokenStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| Error::TokenFileParse {
                path: path.clone(),
                source: e,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Error::TokenFile { path, source: e }),
        };
        debug!("token store {} has {} entries", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the whole file via a sibling temp file.
    fn flush(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, BrokerError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), BrokerError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush().map_err(|e| {
            BrokerError::TokenStore(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}
