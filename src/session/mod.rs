pub mod guard;

pub use guard::{ProtectedPage, SessionGuard, SessionOutcome};

use std::{
    collections::BTreeMap,
    fmt, fs,
    path::PathBuf,
};

use anyhow::{Context, Result};
use tracing::warn;

/// Local-storage key under which the session identifier lives.
pub const SESSION_KEY: &str = "session_id";

/// Opaque credential issued by the backend at login.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Accessor for the single persisted session slot.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<SessionToken>;
    fn set(&self, token: &SessionToken) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON object of string values on disk, the terminal counterpart of browser local storage.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create storage directory {}", parent.display())
                })?;
            }
        }
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<SessionToken> {
        match self.load() {
            Ok(entries) => entries
                .get(SESSION_KEY)
                .filter(|value| !value.is_empty())
                .map(SessionToken::new),
            Err(err) => {
                warn!(?err, "unreadable local storage, treating session as absent");
                None
            }
        }
    }

    fn set(&self, token: &SessionToken) -> Result<()> {
        // corrupt file is replaced rather than blocking sign-in
        let mut entries = self.load().unwrap_or_default();
        entries.insert(SESSION_KEY.to_string(), token.as_str().to_string());
        self.save(&entries)
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.load().unwrap_or_default();
        if entries.remove(SESSION_KEY).is_none() {
            return Ok(());
        }
        self.save(&entries)
    }
}
