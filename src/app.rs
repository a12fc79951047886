//! Session state for one running instance of the application

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::core::config::Preferences;
use crate::core::document::Novel;
use crate::core::error::{Error, Result};
use crate::core::file_system::Workspace;
use crate::core::store::{DeleteOutcome, DocumentStore};

/// Main application state
pub struct NovelCraftApp {
    /// Loaded user preferences
    pub preferences: Preferences,
    /// Document persistence
    pub store: DocumentStore,
    /// Path of the active document
    current_path: Option<PathBuf>,
    /// The active document
    novel: Option<Novel>,
    /// Whether the active document has changes not yet on disk
    unsaved_changes: bool,
    /// When auto-save last ran (or its timer started)
    last_auto_save: Option<Instant>,
}

impl NovelCraftApp {
    /// Start a session: create the workspace layout and load preferences
    pub fn new(workspace: Workspace) -> Result<Self> {
        workspace
            .ensure()
            .map_err(|e| Error::io("create", workspace.root(), e))?;
        let preferences = Preferences::load(&workspace.preferences_path());
        let store = DocumentStore::new(workspace).with_backup_limit(preferences.backup.keep_backups);

        Ok(Self {
            preferences,
            store,
            current_path: None,
            novel: None,
            unsaved_changes: false,
            last_auto_save: None,
        })
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn novel(&self) -> Option<&Novel> {
        self.novel.as_ref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    /// Create a document and make it the active one
    pub fn new_novel(&mut self, draft: Novel) -> Result<PathBuf> {
        let path = self.store.create(draft)?;
        self.open(&path)?;
        Ok(path)
    }

    /// Open a document, replacing the active one
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let novel = self.store.open(path)?;
        self.current_path = Some(path.to_path_buf());
        self.novel = Some(novel);
        self.unsaved_changes = false;
        self.last_auto_save = None;
        Ok(())
    }

    /// Apply a change to the active document and flag it unsaved on success
    pub fn edit<T>(&mut self, change: impl FnOnce(&mut Novel) -> Result<T>) -> Result<T> {
        let novel = self.novel.as_mut().ok_or(Error::NoActiveDocument)?;
        let out = change(novel)?;
        self.unsaved_changes = true;
        Ok(out)
    }

    /// Save the active document
    pub fn save(&mut self) -> Result<()> {
        let (path, novel) = match (self.current_path.as_ref(), self.novel.as_mut()) {
            (Some(path), Some(novel)) => (path, novel),
            _ => return Err(Error::NoActiveDocument),
        };
        self.store
            .save(path, novel, self.preferences.backup.auto_backup)?;
        self.unsaved_changes = false;
        Ok(())
    }

    /// Write pending changes, copy the document under a new title and switch to the copy
    pub fn save_as(&mut self, new_title: &str) -> Result<PathBuf> {
        let source = self
            .current_path
            .clone()
            .ok_or(Error::NoActiveDocument)?;
        if self.unsaved_changes {
            self.save()?;
        }
        let path = self.store.save_as(&source, new_title)?;
        self.open(&path)?;
        Ok(path)
    }

    /// Delete a document; closes it first if it is the active one
    pub fn delete(&mut self, path: &Path, move_to_archive: bool) -> Result<DeleteOutcome> {
        let outcome = self.store.delete(path, move_to_archive)?;
        if self.current_path.as_deref() == Some(path) {
            self.close();
        }
        Ok(outcome)
    }

    /// Drop the active document, discarding unsaved changes
    pub fn close(&mut self) {
        if self.unsaved_changes {
            tracing::warn!("Discarding unsaved changes");
        }
        self.current_path = None;
        self.novel = None;
        self.unsaved_changes = false;
        self.last_auto_save = None;
    }

    /// Run once per refresh cycle. Saves when auto-save is on, a document is open, it
    /// has unsaved changes and the configured interval has passed since the last
    /// auto-save. The first call with pending changes only starts the timer.
    pub fn auto_save_tick(&mut self, now: Instant) -> Result<bool> {
        let writing = &self.preferences.writing;
        if !writing.auto_save || self.current_path.is_none() || !self.unsaved_changes {
            return Ok(false);
        }
        let interval = Duration::from_secs(writing.auto_save_interval);

        let last = *self.last_auto_save.get_or_insert(now);
        if now.saturating_duration_since(last) <= interval {
            return Ok(false);
        }
        self.save()?;
        self.last_auto_save = Some(now);
        tracing::info!("Auto-saved");
        Ok(true)
    }
}
