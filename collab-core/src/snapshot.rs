use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use collab_types::{Friend, TeamSession};
use serde::{Deserialize, Serialize};

/// The durable slice of collaboration state. Only friends and team
/// sessions survive a reload; rooms, rosters, pending requests, and the
/// live event log are rebuilt from scratch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollabSnapshot {
    pub friends: Vec<Friend>,
    pub team_sessions: Vec<TeamSession>,
}

/// Versionless JSON snapshot on disk.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. A missing file is a fresh start, not an error;
    /// a corrupt file is reported to the caller instead of panicking
    /// during store construction.
    pub fn load(&self) -> Result<Option<CollabSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read snapshot at {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("corrupt snapshot at {}", self.path.display()))?;

        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &CollabSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create snapshot directory {}", parent.display())
            })?;
        }

        let raw = serde_json::to_string_pretty(snapshot).context("failed to encode snapshot")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write snapshot at {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collab_types::PresenceStatus;
    use uuid::Uuid;

    fn sample_friend() -> Friend {
        Friend {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            avatar: "👤".to_string(),
            added_at: chrono::Utc::now().to_rfc3339(),
            status: PresenceStatus::Offline,
        }
    }

    #[test]
    fn test_missing_snapshot_is_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("collab.json"));

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("collab.json"));

        let snapshot = CollabSnapshot {
            friends: vec![sample_friend()],
            team_sessions: Vec::new(),
        };
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collab.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SnapshotStore::new(&path);
        let result = store.load();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("corrupt snapshot"));
    }
}
