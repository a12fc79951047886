//! The novel document model persisted as one JSON file

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::chapter::Chapter;
use super::character::Character;
use super::error::{Error, Result};

/// A novel document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Novel {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub world_building: WorldBuilding,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub outline: Vec<Value>,
    /// Keys this model does not know about, kept so rewrites do not drop them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_status() -> String {
    "draft".to_string()
}

/// Document-level bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<NaiveDateTime>,
    #[serde(default)]
    pub version: Revision,
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub character_count: u64,
    #[serde(default)]
    pub chapter_count: u64,
}

impl Metadata {
    /// Fresh metadata for a newly created document
    pub fn new(file_id: String, now: NaiveDateTime) -> Self {
        Self {
            created: Some(now),
            modified: Some(now),
            last_opened: None,
            version: Revision::default(),
            file_id,
            word_count: 0,
            character_count: 0,
            chapter_count: 0,
        }
    }
}

/// Document revision counted in tenths and rendered as "1.0", "1.1", ...
///
/// Stored on disk as a decimal string. Integer arithmetic keeps it exact over any
/// number of saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u64);

impl Revision {
    /// The revision after one more save
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some((whole, frac)) = s.split_once('.') {
            let whole: u64 = whole.parse().ok()?;
            let frac = frac.trim_end_matches('0');
            if frac.len() <= 1 {
                let tenth = if frac.is_empty() { 0 } else { frac.parse::<u64>().ok()? };
                return whole.checked_mul(10)?.checked_add(tenth).map(Self);
            }
        } else if let Ok(whole) = s.parse::<u64>() {
            return whole.checked_mul(10).map(Self);
        }
        // float-drifted legacy values such as "1.2000000000000002"
        let value: f64 = s.parse().ok()?;
        let tenths = (value * 10.0).round();
        (tenths.is_finite() && tenths >= 0.0 && tenths < u64::MAX as f64)
            .then(|| Self(tenths as u64))
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self(10)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl Serialize for Revision {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Revision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Revision::parse(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid version: {s}"))),
            Value::Number(n) => Revision::parse(&n.to_string())
                .ok_or_else(|| serde::de::Error::custom(format!("invalid version: {n}"))),
            other => Err(serde::de::Error::custom(format!(
                "invalid version: {other}"
            ))),
        }
    }
}

/// Free-form world-building notes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldBuilding {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cultures: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub systems: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maps: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorldBuilding {
    /// Timeline events ordered by their `year` field (textual order, as entered)
    pub fn timeline_sorted(&self) -> Vec<&Value> {
        let mut events: Vec<&Value> = self.timeline.iter().collect();
        events.sort_by_key(|e| e.get("year").map(value_text).unwrap_or_default());
        events
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lightweight view used for document listings
#[derive(Debug, Clone, Deserialize)]
pub struct NovelHeader {
    #[serde(default = "untitled")]
    pub title: String,
    #[serde(default = "unknown_author")]
    pub author: String,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

fn untitled() -> String {
    "Untitled".to_string()
}

fn unknown_author() -> String {
    "Unknown".to_string()
}

/// Writing progress figures for a document
#[derive(Debug, Clone, PartialEq)]
pub struct WritingStats {
    pub total_words: u64,
    pub chapter_words: Vec<(u32, u64)>,
    pub average_chapter_words: u64,
}

/// Whitespace-delimited word count
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

impl Novel {
    /// A draft with the four fields `create` requires
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: Vec<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre,
            language: language.into(),
            status: default_status(),
            ..Default::default()
        }
    }

    /// Check the fields required on creation, naming the first one missing
    pub fn check_required(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("title"));
        }
        if self.author.trim().is_empty() {
            return Err(Error::validation("author"));
        }
        if self.genre.iter().all(|g| g.trim().is_empty()) {
            return Err(Error::validation("genre"));
        }
        if self.language.trim().is_empty() {
            return Err(Error::validation("language"));
        }
        Ok(())
    }

    pub fn total_words(&self) -> u64 {
        self.chapters.iter().map(|c| count_words(&c.content)).sum()
    }

    /// Bring the aggregate counts in `metadata` in line with the content
    pub fn refresh_counts(&mut self) {
        let words = self.total_words();
        let chapters = self.chapters.len() as u64;
        let characters = self.characters.len() as u64;
        if let Some(meta) = self.metadata.as_mut() {
            meta.word_count = words;
            meta.chapter_count = chapters;
            meta.character_count = characters;
        }
    }

    pub fn stats(&self) -> WritingStats {
        let chapter_words: Vec<(u32, u64)> = self
            .chapters
            .iter()
            .map(|c| (c.number, count_words(&c.content)))
            .collect();
        let total_words: u64 = chapter_words.iter().map(|(_, w)| w).sum();
        let average_chapter_words = if chapter_words.is_empty() {
            0
        } else {
            total_words / chapter_words.len() as u64
        };
        WritingStats {
            total_words,
            chapter_words,
            average_chapter_words,
        }
    }

    /// Days left to reach `goal_words` at `words_per_day`, rounded up
    pub fn days_to_goal(&self, goal_words: u64, words_per_day: u64) -> Option<u64> {
        if words_per_day == 0 {
            return None;
        }
        let remaining = goal_words.saturating_sub(self.total_words());
        Some(remaining.div_ceil(words_per_day))
    }
}
