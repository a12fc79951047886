//! Timestamped backup copies with a retention cap

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::clock::Clock;
use super::error::{Error, Result};
use super::file_system::{self, BACKUP_EXTENSION};

/// Backups kept when no preference says otherwise
pub const DEFAULT_KEEP_BACKUPS: usize = 10;

/// A backup file on disk
#[derive(Debug, Clone, PartialEq)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Creates, prunes, lists and restores backups in one directory.
///
/// The cap is global across the directory, not per document.
pub struct BackupManager {
    dir: PathBuf,
    keep: usize,
    clock: Arc<dyn Clock>,
}

impl BackupManager {
    pub fn new(dir: PathBuf, keep: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir,
            keep: keep.max(1),
            clock,
        }
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    /// Copy `path` into the backup directory, then prune to the cap
    pub fn create(&self, path: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::io("create", &self.dir, e))?;

        let stamp = self.clock.now().format("%Y%m%d_%H%M%S_%3f");
        let stem = format!("{}_backup_{}", file_system::file_stem(path), stamp);
        let backup = file_system::unique_path(&self.dir, &stem, BACKUP_EXTENSION);

        std::fs::copy(path, &backup).map_err(|e| Error::io("back up", path, e))?;
        tracing::debug!("Created backup: {}", backup.display());

        let removed = self.prune()?;
        if removed > 0 {
            tracing::debug!("Pruned {} old backups", removed);
        }
        Ok(backup)
    }

    /// Delete all but the `keep` most recently modified backups
    pub fn prune(&self) -> Result<usize> {
        let mut backups = self.list_oldest_first();
        if backups.len() <= self.keep {
            return Ok(0);
        }
        let excess = backups.len() - self.keep;
        for old in backups.drain(..excess) {
            std::fs::remove_file(&old.path).map_err(|e| Error::io("remove", &old.path, e))?;
        }
        Ok(excess)
    }

    /// Backups newest first
    pub fn list(&self) -> Vec<BackupInfo> {
        let mut backups = self.list_oldest_first();
        backups.reverse();
        backups
    }

    fn list_oldest_first(&self) -> Vec<BackupInfo> {
        let mut backups: Vec<BackupInfo> =
            file_system::files_with_extension(&self.dir, BACKUP_EXTENSION)
                .into_iter()
                .filter_map(|path| {
                    let modified = file_system::modified_time(&path)?;
                    Some(BackupInfo { path, modified })
                })
                .collect();
        backups.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
        backups
    }

    /// Overwrite `target` with the backup's bytes. No merge, last write wins.
    pub fn restore(&self, backup: &Path, target: &Path) -> Result<()> {
        let bytes = std::fs::read(backup).map_err(|e| Error::io("read", backup, e))?;
        file_system::atomic_write(target, &bytes).map_err(|e| Error::io("restore", target, e))?;
        tracing::info!(
            "Restored {} from {}",
            target.display(),
            backup.display()
        );
        Ok(())
    }
}
