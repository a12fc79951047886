//! Exporting documents to other formats

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::document::Novel;
use super::error::{Error, Result};
use super::file_system;
use super::store::{read_bytes, DocumentStore};

/// Export targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Txt,
    /// Declared but not rendered
    Pdf,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "txt" => Ok(Self::Txt),
            "pdf" => Ok(Self::Pdf),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Txt => "txt",
            Self::Pdf => "pdf",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// The format has no renderer; nothing was written
    Skipped(ExportFormat),
}

impl fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written(path) => write!(f, "Exported to {}", path.display()),
            Self::Skipped(format) => write!(f, "Export to {} is not available yet", format),
        }
    }
}

impl DocumentStore {
    /// Export the document at `path` into the workspace's exports directory
    pub fn export(&self, path: &Path, format: ExportFormat) -> Result<ExportOutcome> {
        let bytes = read_bytes(path)?;
        let stem = file_system::file_stem(path);
        let exports = self.workspace().exports_dir();

        let (target, rendered) = match format {
            ExportFormat::Json => {
                let data: serde_json::Value =
                    serde_json::from_slice(&bytes).map_err(|e| Error::format(path, e))?;
                let text = serde_json::to_string_pretty(&data).map_err(|e| Error::format(path, e))?;
                (exports.join(format!("{stem}_export.json")), text)
            }
            ExportFormat::Txt => {
                let novel: Novel =
                    serde_json::from_slice(&bytes).map_err(|e| Error::format(path, e))?;
                (exports.join(format!("{stem}_export.txt")), render_txt(&novel))
            }
            ExportFormat::Pdf => {
                tracing::warn!("PDF export requested for {}; not implemented", path.display());
                return Ok(ExportOutcome::Skipped(format));
            }
        };

        file_system::atomic_write(&target, rendered.as_bytes())
            .map_err(|e| Error::io("export", &target, e))?;
        tracing::info!("Exported {} as {}", path.display(), format);
        Ok(ExportOutcome::Written(target))
    }
}

/// Plain-text manuscript: header, then every chapter in number order
pub fn render_txt(novel: &Novel) -> String {
    let or = |s: &str, fallback: &str| {
        if s.is_empty() {
            fallback.to_string()
        } else {
            s.to_string()
        }
    };

    let mut out = String::new();
    out.push_str(&format!("Title: {}\n", or(&novel.title, "Untitled")));
    out.push_str(&format!("Author: {}\n", or(&novel.author, "Unknown")));
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    let mut chapters: Vec<_> = novel.chapters.iter().collect();
    chapters.sort_by_key(|c| c.number);
    for chapter in chapters {
        out.push_str(&format!("\nChapter {}: {}\n", chapter.number, chapter.title));
        out.push_str(&"-".repeat(40));
        out.push('\n');
        out.push_str(&chapter.content);
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chapter::ChapterDraft;
    use crate::core::file_system::Workspace;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DocumentStore, PathBuf) {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        workspace.ensure().unwrap();
        let store = DocumentStore::new(workspace);

        let mut novel = Novel::new("Tides", "Mara", vec!["Literary".into()], "English");
        let now = store.now();
        novel.save_chapter(ChapterDraft::new("Ebb", "The water left."), Some(2), now);
        novel.save_chapter(ChapterDraft::new("Flow", "It came back."), Some(1), now);
        let path = store.create(novel).unwrap();
        (dir, store, path)
    }

    #[test]
    fn test_txt_export_orders_chapters() {
        let (_dir, store, path) = setup();
        let outcome = store.export(&path, ExportFormat::Txt).unwrap();
        let target = match outcome {
            ExportOutcome::Written(p) => p,
            other => panic!("unexpected outcome: {other:?}"),
        };
        let text = std::fs::read_to_string(target).unwrap();

        assert!(text.starts_with("Title: Tides\nAuthor: Mara\n"));
        let first = text.find("Chapter 1: Flow").unwrap();
        let second = text.find("Chapter 2: Ebb").unwrap();
        assert!(first < second);
        assert!(text.contains(&format!("{}\nIt came back.\n", "-".repeat(40))));
    }

    #[test]
    fn test_json_export_matches_source() {
        let (_dir, store, path) = setup();
        let target = match store.export(&path, ExportFormat::Json).unwrap() {
            ExportOutcome::Written(p) => p,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert!(target.to_string_lossy().ends_with("_export.json"));

        let source: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let exported: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&target).unwrap()).unwrap();
        assert_eq!(source, exported);
    }

    #[test]
    fn test_pdf_is_a_no_op() {
        let (_dir, store, path) = setup();
        assert_eq!(
            store.export(&path, ExportFormat::Pdf).unwrap(),
            ExportOutcome::Skipped(ExportFormat::Pdf)
        );
        let pdf_dir = store.workspace().pdf_exports_dir();
        assert_eq!(std::fs::read_dir(pdf_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_txt_export_of_unnumbered_chapter() {
        let (dir, store, _) = setup();
        let path = dir.path().join("novels").join("loose.novel");
        let body = r#"{"title": "Loose", "author": "Kit", "chapters": [{"title": "Start", "content": "Go."}]}"#;
        std::fs::write(&path, body).unwrap();

        let target = match store.export(&path, ExportFormat::Txt).unwrap() {
            ExportOutcome::Written(p) => p,
            other => panic!("unexpected outcome: {other:?}"),
        };
        let text = std::fs::read_to_string(target).unwrap();
        assert!(text.contains("Chapter 1: Start"));
    }

    #[test]
    fn test_unknown_format() {
        let err = "epub".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref f) if f == "epub"));
    }

    #[test]
    fn test_render_txt_defaults() {
        let text = render_txt(&Novel::default());
        assert!(text.starts_with("Title: Untitled\nAuthor: Unknown\n"));
    }
}
