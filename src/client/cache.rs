use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::WidgetError;

/// Last known follow state for one target user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedFollow {
    pub is_following: bool,
    pub followers_count: usize,
}

/// Local fallback, keyed by target user id. Never the source of truth.
pub trait FollowCache: Send + Sync {
    fn load(&self, target_id: &str) -> Result<Option<CachedFollow>, WidgetError>;
    fn store(&self, target_id: &str, state: CachedFollow) -> Result<(), WidgetError>;
}

/// JSON map on disk; a missing file reads as empty.
pub struct FileFollowCache {
    path: PathBuf,
}

impl FileFollowCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileFollowCache { path: path.into() }
    }

    fn read_all(&self) -> Result<HashMap<String, CachedFollow>, WidgetError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl FollowCache for FileFollowCache {
    fn load(&self, target_id: &str) -> Result<Option<CachedFollow>, WidgetError> {
        Ok(self.read_all()?.get(target_id).copied())
    }

    fn store(&self, target_id: &str, state: CachedFollow) -> Result<(), WidgetError> {
        let mut entries = self.read_all()?;
        entries.insert(target_id.to_string(), state);
        std::fs::write(&self.path, serde_json::to_vec_pretty(&entries)?)?;
        Ok(())
    }
}
