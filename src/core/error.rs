//! Error types for document store operations

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the document store and the document model.
///
/// The `Display` text is what the user sees; callers branch on the variant.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input was missing or empty.
    #[error("Missing required field: {0}")]
    Validation(String),

    /// The target path does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but is not a valid document.
    #[error("Invalid file format in {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A create would overwrite an existing document.
    #[error("File already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Export to a format the store does not know.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Underlying read/write/copy/rename failure.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Chapter {0} not found")]
    ChapterNotFound(u32),

    #[error("Character not found: {0}")]
    CharacterNotFound(String),

    #[error("No document is open")]
    NoActiveDocument,
}

impl Error {
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation(field.into())
    }

    pub fn format(path: &Path, source: serde_json::Error) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Wrap an I/O failure, mapping `NotFound` onto the dedicated variant.
    pub fn io(action: &str, path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path.to_path_buf());
        }
        Self::Io {
            context: format!("Failed to {} {}", action, path.display()),
            source,
        }
    }
}
