//! Local filesystem repository.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── channels/{id}.json        # Latest snapshot per channel
//! └── history/{id}/             # Superseded versions, oldest pruned first
//! ```
//!
//! Writes go to a temporary file that is renamed over the target, so a
//! crash never leaves a half-written snapshot behind. The superseded version
//! is copied into history only after the new bytes are on disk, so a failed
//! save leaves the current snapshot in place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result};
use crate::models::{ChannelSnapshot, StorageConfig};
use crate::storage::{Repository, WriteMetadata};
use crate::utils::is_valid_entity_id;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root_dir: PathBuf,
    keep_history: usize,
}

impl LocalRepository {
    /// Create a repository rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            keep_history: 5,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.root).with_history(config.keep_history)
    }

    /// Keep at most `versions` superseded snapshots per channel (`0` keeps
    /// none).
    pub fn with_history(mut self, versions: usize) -> Self {
        self.keep_history = versions;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn checked_id(channel_id: &str) -> Result<&str> {
        if is_valid_entity_id(channel_id) {
            Ok(channel_id)
        } else {
            Err(AppError::invalid_identifier(channel_id))
        }
    }

    fn current_path(&self, channel_id: &str) -> PathBuf {
        self.root_dir
            .join("channels")
            .join(format!("{channel_id}.json"))
    }

    fn history_dir(&self, channel_id: &str) -> PathBuf {
        self.root_dir.join("history").join(channel_id)
    }

    /// Ensure parent directory exists.
    fn ensure_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write bytes next to `path` and return the temporary file, ready to
    /// be renamed over the target.
    fn write_temp(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
        Self::ensure_dir(path)?;

        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(tmp)
    }

    fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(value)?)
    }

    /// Read bytes, returning None if file doesn't exist.
    fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        match Self::read_bytes(path)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Copy the current file of a channel into its history directory.
    fn rotate(&self, channel_id: &str, current: &Path) -> Result<()> {
        let dir = self.history_dir(channel_id);
        fs::create_dir_all(&dir)?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let target = (0..)
            .map(|n| dir.join(format!("{stamp}_{n:03}.json")))
            .find(|candidate| !candidate.exists())
            .ok_or_else(|| AppError::storage("no free history slot"))?;

        fs::copy(current, &target)?;
        log::debug!("Rotated {} into {}", current.display(), target.display());
        self.prune(channel_id)
    }

    fn prune(&self, channel_id: &str) -> Result<()> {
        let versions = self.list_history(channel_id)?;
        for stale in versions.iter().skip(self.keep_history) {
            let path = self.history_dir(channel_id).join(format!("{stale}.json"));
            fs::remove_file(&path)?;
            log::debug!("Pruned history version {}", path.display());
        }
        Ok(())
    }

    /// Load one superseded version by the name [`Repository::list_history`]
    /// reports.
    pub fn load_history(&self, channel_id: &str, version: &str) -> Result<Option<ChannelSnapshot>> {
        let channel_id = Self::checked_id(channel_id)?;
        if !is_history_name(version) {
            return Err(AppError::validation(format!("bad history version '{version}'")));
        }
        Self::read_json(&self.history_dir(channel_id).join(format!("{version}.json")))
    }
}

fn is_history_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_'))
}

impl Repository for LocalRepository {
    fn get_by_id(&self, channel_id: &str) -> Result<Option<ChannelSnapshot>> {
        let channel_id = Self::checked_id(channel_id)?;
        let path = self.current_path(channel_id);
        let snapshot: Option<ChannelSnapshot> = Self::read_json(&path)?;
        if snapshot.is_none() {
            log::debug!("No stored snapshot for {}", channel_id);
        }
        Ok(snapshot)
    }

    fn save(&self, snapshot: &ChannelSnapshot) -> Result<WriteMetadata> {
        let channel_id = Self::checked_id(&snapshot.channel_id)?;
        let path = self.current_path(channel_id);
        let bytes = Self::to_json(snapshot)?;
        let mut meta = WriteMetadata::for_snapshot(snapshot, path.display().to_string());

        let rotate = match Self::read_bytes(&path)? {
            Some(stored) if stored == bytes => {
                log::debug!("Snapshot of {} unchanged; skipping write", channel_id);
                meta.unchanged = true;
                return Ok(meta);
            }
            Some(_) => self.keep_history > 0,
            None => false,
        };

        let tmp = Self::write_temp(&path, &bytes)?;
        if rotate {
            if let Err(e) = self.rotate(channel_id, &path) {
                if let Err(cleanup) = fs::remove_file(&tmp) {
                    log::warn!("Could not remove {}: {}", tmp.display(), cleanup);
                }
                return Err(e);
            }
            meta.rotated = true;
        }
        fs::rename(&tmp, &path)?;
        log::info!(
            "Saved {}: {} videos, {} comments to {}",
            channel_id,
            meta.video_count,
            meta.comment_count,
            meta.location
        );
        Ok(meta)
    }

    fn list_history(&self, channel_id: &str) -> Result<Vec<String>> {
        let channel_id = Self::checked_id(channel_id)?;
        let dir = self.history_dir(channel_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    versions.push(stem.to_string());
                }
            }
        }
        versions.sort_unstable_by(|a, b| b.cmp(a));
        Ok(versions)
    }
}
