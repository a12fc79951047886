//! Document store: novels as individual JSON files in the workspace

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};

use super::backup::{BackupManager, DEFAULT_KEEP_BACKUPS};
use super::clock::{Clock, SystemClock};
use super::document::{Metadata, Novel, NovelHeader};
use super::error::{Error, Result};
use super::file_system::{self, Workspace, ARCHIVE_EXTENSION, NOVEL_EXTENSION};

/// What happened to a deleted document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Moved into the archive directory at this path
    Archived(PathBuf),
    /// Removed with no recovery path
    Deleted,
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archived(path) => write!(f, "File moved to archive: {}", path.display()),
            Self::Deleted => f.write_str("File permanently deleted"),
        }
    }
}

/// Ordering for document listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Most recently modified first
    #[default]
    Modified,
    /// Most recently created first
    Created,
    /// Case-insensitive title, ascending
    Title,
}

impl FromStr for SortBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "modified" => Ok(Self::Modified),
            "created" => Ok(Self::Created),
            "title" => Ok(Self::Title),
            _ => Err(Error::Validation(format!("sort order (unknown value '{s}')"))),
        }
    }
}

/// One row of a document listing
#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub filename: String,
    pub path: PathBuf,
    pub title: String,
    pub author: String,
    pub genre: Vec<String>,
    pub created: SystemTime,
    pub modified: SystemTime,
    pub size: u64,
    pub metadata: Option<Metadata>,
}

impl DocumentSummary {
    /// "3 days ago" style age of the last modification
    pub fn modified_ago(&self, now: SystemTime) -> String {
        relative_time(now.duration_since(self.modified).unwrap_or_default())
    }
}

pub fn relative_time(age: Duration) -> String {
    let secs = age.as_secs();
    let days = secs / 86_400;
    if days > 365 {
        format!("{} years ago", days / 365)
    } else if days > 30 {
        format!("{} months ago", days / 30)
    } else if days > 0 {
        format!("{} days ago", days)
    } else if secs > 3600 {
        format!("{} hours ago", secs / 3600)
    } else if secs > 60 {
        format!("{} minutes ago", secs / 60)
    } else {
        "just now".to_string()
    }
}

/// Create/open/save/delete/list operations over the workspace's novels directory
pub struct DocumentStore {
    workspace: Workspace,
    clock: Arc<dyn Clock>,
    backups: BackupManager,
}

impl DocumentStore {
    pub fn new(workspace: Workspace) -> Self {
        Self::with_clock(workspace, Arc::new(SystemClock))
    }

    pub fn with_clock(workspace: Workspace, clock: Arc<dyn Clock>) -> Self {
        let backups = BackupManager::new(
            workspace.backups_dir(),
            DEFAULT_KEEP_BACKUPS,
            Arc::clone(&clock),
        );
        Self {
            workspace,
            clock,
            backups,
        }
    }

    /// Change how many backups are retained
    pub fn with_backup_limit(mut self, keep: usize) -> Self {
        self.backups = BackupManager::new(
            self.workspace.backups_dir(),
            keep,
            Arc::clone(&self.clock),
        );
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Current time from the store's clock
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Eight hex characters derived from the title and a nanosecond timestamp
    fn generate_file_id(title: &str, now: NaiveDateTime) -> String {
        let input = format!("{}_{}", title, now.format("%Y%m%d%H%M%S%f"));
        let digest = Sha256::digest(input.as_bytes());
        hex::encode(&digest[..4])
    }

    /// Materialize a new document file and return its path.
    ///
    /// Any metadata already on `novel` is replaced. Fails without touching disk if a
    /// required field is missing or the derived path is taken.
    pub fn create(&self, mut novel: Novel) -> Result<PathBuf> {
        novel.check_required()?;

        let now = self.clock.now();
        let file_id = Self::generate_file_id(&novel.title, now);
        let filename = format!(
            "{}_{}.{}",
            file_system::sanitize_title(&novel.title),
            file_id,
            NOVEL_EXTENSION
        );
        let path = self.workspace.novels_dir().join(filename);
        if path.exists() {
            return Err(Error::AlreadyExists(path));
        }

        novel.metadata = Some(Metadata::new(file_id, now));
        novel.refresh_counts();
        write_novel(&path, &novel)?;
        tracing::info!("Created novel '{}' at {}", novel.title, path.display());

        self.create_backup(&path);
        Ok(path)
    }

    /// Read a document and stamp `last_opened` on disk
    pub fn open(&self, path: &Path) -> Result<Novel> {
        let mut novel = read_novel(path)?;

        if let Some(meta) = novel.metadata.as_mut() {
            meta.last_opened = Some(self.clock.now());
            if let Err(e) = write_novel(path, &novel) {
                tracing::warn!("Could not record open time for {}: {}", path.display(), e);
            }
        }
        Ok(novel)
    }

    /// Stamp, bump the revision and atomically write `novel` to `path`.
    ///
    /// The stamp lands on the caller's value whether or not the write succeeds.
    pub fn save(&self, path: &Path, novel: &mut Novel, auto_backup: bool) -> Result<()> {
        let now = self.clock.now();
        if let Some(meta) = novel.metadata.as_mut() {
            meta.modified = Some(now);
            meta.version = meta.version.next();
        }
        novel.refresh_counts();

        write_novel(path, novel)?;
        tracing::info!("Saved novel: {}", path.display());

        if auto_backup {
            self.create_backup(path);
        }
        Ok(())
    }

    /// Copy an existing document under a new title and file id
    pub fn save_as(&self, old_path: &Path, new_title: &str) -> Result<PathBuf> {
        let mut novel = read_novel(old_path)?;
        novel.title = new_title.to_string();
        self.create(novel)
    }

    /// Archive (soft delete) or permanently remove a document
    pub fn delete(&self, path: &Path, move_to_archive: bool) -> Result<DeleteOutcome> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        if !move_to_archive {
            std::fs::remove_file(path).map_err(|e| Error::io("delete", path, e))?;
            tracing::info!("Permanently deleted {}", path.display());
            return Ok(DeleteOutcome::Deleted);
        }

        let archives = self.workspace.archives_dir();
        std::fs::create_dir_all(&archives).map_err(|e| Error::io("create", &archives, e))?;
        let stem = format!(
            "{}_{}",
            file_system::file_stem(path),
            self.clock.now().format("%Y%m%d%H%M%S")
        );
        let target = file_system::unique_path(&archives, &stem, ARCHIVE_EXTENSION);

        if std::fs::rename(path, &target).is_err() {
            // rename fails across filesystems
            std::fs::copy(path, &target).map_err(|e| Error::io("archive", path, e))?;
            std::fs::remove_file(path).map_err(|e| Error::io("delete", path, e))?;
        }
        tracing::info!("Archived {} to {}", path.display(), target.display());
        Ok(DeleteOutcome::Archived(target))
    }

    /// Back up `path`. Failures are logged and reported as `None`, never as an error.
    pub fn create_backup(&self, path: &Path) -> Option<PathBuf> {
        match self.backups.create(path) {
            Ok(backup) => Some(backup),
            Err(e) => {
                tracing::warn!("Backup failed for {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn restore_backup(&self, backup: &Path, target: &Path) -> Result<()> {
        self.backups.restore(backup, target)
    }

    /// Summaries of every document in the novels directory.
    ///
    /// Files that cannot be read or parsed are skipped.
    pub fn list_documents(&self, sort_by: SortBy) -> Vec<DocumentSummary> {
        let mut docs: Vec<DocumentSummary> =
            file_system::files_with_extension(&self.workspace.novels_dir(), NOVEL_EXTENSION)
                .into_iter()
                .filter_map(|path| match summarize(&path) {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        tracing::warn!("Skipping {}: {}", path.display(), e);
                        None
                    }
                })
                .collect();

        match sort_by {
            SortBy::Modified => docs.sort_by(|a, b| b.modified.cmp(&a.modified)),
            SortBy::Created => docs.sort_by(|a, b| b.created.cmp(&a.created)),
            SortBy::Title => docs.sort_by_key(|d| d.title.to_lowercase()),
        }
        docs
    }
}

pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::io("read", path, e))
}

pub(crate) fn read_novel(path: &Path) -> Result<Novel> {
    let bytes = read_bytes(path)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::format(path, e))
}

fn write_novel(path: &Path, novel: &Novel) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(novel).map_err(|e| Error::format(path, e))?;
    file_system::atomic_write(path, &bytes).map_err(|e| Error::io("write", path, e))
}

fn summarize(path: &Path) -> Result<DocumentSummary> {
    let bytes = read_bytes(path)?;
    let header: NovelHeader = serde_json::from_slice(&bytes).map_err(|e| Error::format(path, e))?;
    let stat = std::fs::metadata(path).map_err(|e| Error::io("stat", path, e))?;
    let modified = stat.modified().unwrap_or(SystemTime::UNIX_EPOCH);

    Ok(DocumentSummary {
        filename: path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        title: header.title,
        author: header.author,
        genre: header.genre,
        created: stat.created().unwrap_or(modified),
        modified,
        size: stat.len(),
        metadata: header.metadata,
    })
}
