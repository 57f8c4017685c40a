use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::errors::ApiError;

/// Key the auth token is persisted under.
pub const TOKEN_KEY: &str = "authToken";

/// Persistence for the bearer token between runs.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, ApiError>;
    fn save(&self, token: &str) -> Result<(), ApiError>;
    fn clear(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        Ok(self.token.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Stores `{ "authToken": "..." }` in a JSON file. Other keys in the file
/// are preserved.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

type Entries = BTreeMap<String, serde_json::Value>;

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<Entries, ApiError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Entries::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                ApiError::Storage(format!("{} is not valid JSON: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(self.storage_error(e)),
        }
    }

    fn write(&self, entries: &Entries) -> Result<(), ApiError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.storage_error(e))?;
        }
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        fs::write(&self.path, text).map_err(|e| self.storage_error(e))
    }

    fn storage_error(&self, e: std::io::Error) -> ApiError {
        ApiError::Storage(format!("{}: {e}", self.path.display()))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        Ok(self
            .read()?
            .get(TOKEN_KEY)
            .and_then(|v| v.as_str())
            .map(String::from))
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        let mut entries = self.read()?;
        entries.insert(TOKEN_KEY.to_string(), token.into());
        self.write(&entries)
    }

    fn clear(&self) -> Result<(), ApiError> {
        let mut entries = self.read()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }
}
