//! Read-only structural audit of a document file

use std::fmt;
use std::path::Path;

use serde_json::Value;

use super::store::DocumentStore;

/// Problems that make a document invalid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField(&'static str),
    InvalidJson(String),
    Unreadable(String),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "Missing required field: {field}"),
            Self::InvalidJson(e) => write!(f, "Invalid JSON format: {e}"),
            Self::Unreadable(e) => write!(f, "Validation error: {e}"),
        }
    }
}

/// Non-fatal findings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    MissingMetadata(&'static str),
    ChapterMissingTitle(u64),
    ChapterMissingContent(u64),
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMetadata(field) => write!(f, "Missing metadata: {field}"),
            Self::ChapterMissingTitle(n) => write!(f, "Chapter {n} missing title"),
            Self::ChapterMissingContent(n) => write!(f, "Chapter {n} missing content"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total_chapters: usize,
    pub total_characters: usize,
    pub total_words: usize,
    pub total_chars: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationWarning>,
    pub statistics: Statistics,
}

impl DocumentStore {
    /// Audit the file at `path`; never writes to it
    pub fn validate(&self, path: &Path) -> ValidationReport {
        validate_file(path)
    }
}

pub fn validate_file(path: &Path) -> ValidationReport {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return invalid(ValidationIssue::Unreadable(e.to_string())),
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(data) => validate_value(&data),
        Err(e) => invalid(ValidationIssue::InvalidJson(e.to_string())),
    }
}

fn invalid(issue: ValidationIssue) -> ValidationReport {
    ValidationReport {
        valid: false,
        errors: vec![issue],
        ..Default::default()
    }
}

fn is_missing(v: Option<&Value>) -> bool {
    matches!(v, None | Some(Value::Null))
}

pub fn validate_value(data: &Value) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for field in ["title", "author", "metadata"] {
        if is_missing(data.get(field)) {
            errors.push(ValidationIssue::MissingField(field));
        }
    }

    if let Some(meta) = data.get("metadata").filter(|m| !m.is_null()) {
        for field in ["created", "modified", "version"] {
            if is_missing(meta.get(field)) {
                warnings.push(ValidationWarning::MissingMetadata(field));
            }
        }
    }

    let chapters: &[Value] = data
        .get("chapters")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let mut total_words = 0;
    let mut total_chars = 0;
    for (i, chapter) in chapters.iter().enumerate() {
        let number = chapter
            .get("number")
            .and_then(Value::as_u64)
            .unwrap_or(i as u64 + 1);
        if is_missing(chapter.get("title")) {
            warnings.push(ValidationWarning::ChapterMissingTitle(number));
        }
        match chapter.get("content").and_then(Value::as_str) {
            Some(content) => {
                total_words += content.split_whitespace().count();
                total_chars += content.chars().count();
            }
            None if is_missing(chapter.get("content")) => {
                warnings.push(ValidationWarning::ChapterMissingContent(number));
            }
            None => {}
        }
    }

    let statistics = Statistics {
        total_chapters: chapters.len(),
        total_characters: data
            .get("characters")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0),
        total_words,
        total_chars,
    };

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
        statistics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_content_is_only_a_warning() {
        let data = json!({
            "title": "T",
            "author": "A",
            "metadata": {"created": "x", "modified": "y", "version": "1.0"},
            "characters": [{"name": "Ann"}],
            "chapters": [
                {"number": 1, "title": "One", "content": "three short words"},
                {"number": 4, "title": "Four"}
            ]
        });
        let report = validate_value(&data);
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings, vec![ValidationWarning::ChapterMissingContent(4)]);
        assert_eq!(
            report.statistics,
            Statistics {
                total_chapters: 2,
                total_characters: 1,
                total_words: 3,
                total_chars: 17,
            }
        );
    }

    #[test]
    fn test_missing_root_fields_are_errors() {
        let report = validate_value(&json!({"title": "T", "chapters": [{"content": "a b"}]}));
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                ValidationIssue::MissingField("author"),
                ValidationIssue::MissingField("metadata")
            ]
        );
        assert_eq!(report.warnings, vec![ValidationWarning::ChapterMissingTitle(1)]);
        assert_eq!(report.statistics.total_words, 2);
    }

    #[test]
    fn test_metadata_warnings() {
        let report = validate_value(&json!({"title": "T", "author": "A", "metadata": {"version": "1.0"}}));
        assert!(report.valid);
        let messages: Vec<String> = report.warnings.iter().map(|w| w.to_string()).collect();
        assert_eq!(messages, vec!["Missing metadata: created", "Missing metadata: modified"]);
    }

    #[test]
    fn test_file_is_not_modified() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.novel");
        std::fs::write(&path, r#"{"title":"T"}"#).unwrap();
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        let report = validate_file(&path);
        assert!(!report.valid);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"title":"T"}"#);
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn test_invalid_json_and_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.novel");
        std::fs::write(&path, "{{").unwrap();
        let report = validate_file(&path);
        assert!(!report.valid);
        assert!(matches!(report.errors[0], ValidationIssue::InvalidJson(_)));

        let report = validate_file(&dir.path().join("none.novel"));
        assert!(matches!(report.errors[0], ValidationIssue::Unreadable(_)));
    }
}
