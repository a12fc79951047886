//! Workspace layout and low-level file operations

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;
use directories::ProjectDirs;
use walkdir::WalkDir;

pub const NOVEL_EXTENSION: &str = "novel";
pub const BACKUP_EXTENSION: &str = "bak";
pub const ARCHIVE_EXTENSION: &str = "archived";

/// Directory tree holding novels, backups, archives, exports and settings
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Platform data directory used when no root is given
    pub fn default_root() -> Result<PathBuf> {
        ProjectDirs::from("com", "novelcraft", "NovelCraft")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn novels_dir(&self) -> PathBuf {
        self.root.join("novels")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.novels_dir().join("backups")
    }

    pub fn archives_dir(&self) -> PathBuf {
        self.novels_dir().join("archives")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    pub fn pdf_exports_dir(&self) -> PathBuf {
        self.exports_dir().join("pdf")
    }

    pub fn settings_dir(&self) -> PathBuf {
        self.root.join("settings")
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.settings_dir().join("user_preferences.json")
    }

    /// Create every directory of the layout
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [
            self.novels_dir(),
            self.backups_dir(),
            self.archives_dir(),
            self.exports_dir(),
            self.pdf_exports_dir(),
            self.settings_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Replace `path` with `bytes` via a temporary sibling and a rename.
///
/// The target is either the old content or the new content, never a prefix of it.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// First free `dir/<stem>.<ext>`, falling back to `<stem>_1`, `<stem>_2`, ...
pub fn unique_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let candidate = dir.join(format!("{stem}.{ext}"));
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}.{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Keep alphanumerics, spaces, hyphens and underscores; spaces become underscores
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() {
        return "Untitled".to_string();
    }
    trimmed.replace(' ', "_")
}

/// Files directly inside `dir` with the given extension
pub fn files_with_extension(dir: &Path, ext: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|x| x == ext)
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}

pub fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "untitled".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Dune II"), "Dune_II");
        assert_eq!(sanitize_title("What?! A Tale: Part-1 "), "What_A_Tale_Part-1");
        assert_eq!(sanitize_title("***"), "Untitled");
        assert_eq!(sanitize_title("Café Noir"), "Café_Noir");
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.novel");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        // no temporary siblings left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unique_path_appends_counter() {
        let dir = TempDir::new().unwrap();
        let first = unique_path(dir.path(), "a", "bak");
        std::fs::write(&first, "").unwrap();
        let second = unique_path(dir.path(), "a", "bak");
        assert_eq!(second, dir.path().join("a_1.bak"));
    }

    #[test]
    fn test_files_with_extension_ignores_subdirectories() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("one.novel"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("backups")).unwrap();
        std::fs::write(dir.path().join("backups").join("two.novel"), "{}").unwrap();

        let files = files_with_extension(dir.path(), NOVEL_EXTENSION);
        assert_eq!(files, vec![dir.path().join("one.novel")]);
    }

    #[test]
    fn test_workspace_ensure_creates_layout() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        workspace.ensure().unwrap();
        assert!(workspace.backups_dir().is_dir());
        assert!(workspace.archives_dir().is_dir());
        assert!(workspace.pdf_exports_dir().is_dir());
        assert!(workspace.settings_dir().is_dir());
    }
}
