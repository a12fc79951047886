//! Chapters and scenes of a novel

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::{count_words, Novel};
use super::error::{Error, Result};

/// Writing stage of a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    Outline,
    #[default]
    Draft,
    Revised,
    Final,
}

impl fmt::Display for ChapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Outline => "outline",
            Self::Draft => "draft",
            Self::Revised => "revised",
            Self::Final => "final",
        };
        f.write_str(s)
    }
}

impl FromStr for ChapterStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "outline" => Ok(Self::Outline),
            "draft" => Ok(Self::Draft),
            "revised" => Ok(Self::Revised),
            "final" => Ok(Self::Final),
            _ => Err(Error::Validation(format!("status (unknown value '{s}')"))),
        }
    }
}

/// A chapter record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Missing numbers read as 1
    #[serde(default = "first_chapter")]
    pub number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: ChapterStatus,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub pov_character: String,
    #[serde(default)]
    pub setting: String,
    #[serde(default)]
    pub time_of_day: String,
    #[serde(default)]
    pub word_count_goal: u64,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<Scene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn first_chapter() -> u32 {
    1
}

impl Chapter {
    pub fn word_count(&self) -> u64 {
        count_words(&self.content)
    }
}

/// User-editable chapter fields
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDraft {
    pub title: String,
    pub content: String,
    pub status: ChapterStatus,
    pub summary: String,
    pub pov_character: String,
    pub setting: String,
    pub time_of_day: String,
    pub word_count_goal: u64,
    pub characters: Vec<String>,
}

impl ChapterDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            status: ChapterStatus::Draft,
            summary: String::new(),
            pov_character: String::new(),
            setting: String::new(),
            time_of_day: String::new(),
            word_count_goal: 2000,
            characters: Vec::new(),
        }
    }
}

/// A scene inside a chapter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub pov: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How many chapters sit at each stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlineProgress {
    pub completed: usize,
    pub in_progress: usize,
    pub outlined: usize,
}

impl Novel {
    /// Number a new chapter would receive
    pub fn next_chapter_number(&self) -> u32 {
        self.chapters.iter().map(|c| c.number).max().unwrap_or(0) + 1
    }

    pub fn chapter(&self, number: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.number == number)
    }

    pub fn chapter_mut(&mut self, number: u32) -> Result<&mut Chapter> {
        self.chapters
            .iter_mut()
            .find(|c| c.number == number)
            .ok_or(Error::ChapterNotFound(number))
    }

    /// Insert or update a chapter and return its number.
    ///
    /// `None` appends a new chapter numbered max+1. `Some(n)` replaces chapter `n` in
    /// place (keeping its `created` stamp, scenes and unknown keys) or inserts it if
    /// absent. `now` stamps `modified`, and `created` on insert.
    pub fn save_chapter(
        &mut self,
        draft: ChapterDraft,
        number: Option<u32>,
        now: NaiveDateTime,
    ) -> u32 {
        let number = number.unwrap_or_else(|| self.next_chapter_number());
        let existing = self.chapters.iter().position(|c| c.number == number);

        let (created, scenes, locations, conflicts, extra) = match existing {
            Some(i) => {
                let old = &mut self.chapters[i];
                (
                    old.created,
                    std::mem::take(&mut old.scenes),
                    std::mem::take(&mut old.locations),
                    std::mem::take(&mut old.conflicts),
                    std::mem::take(&mut old.extra),
                )
            }
            None => (Some(now), Vec::new(), Vec::new(), Vec::new(), Map::new()),
        };

        let chapter = Chapter {
            number,
            title: draft.title,
            content: draft.content,
            status: draft.status,
            summary: draft.summary,
            pov_character: draft.pov_character,
            setting: draft.setting,
            time_of_day: draft.time_of_day,
            word_count_goal: draft.word_count_goal,
            characters: draft.characters,
            locations,
            conflicts,
            scenes,
            created,
            modified: Some(now),
            extra,
        };

        match existing {
            Some(i) => self.chapters[i] = chapter,
            None => {
                self.chapters.push(chapter);
                self.chapters.sort_by_key(|c| c.number);
            }
        }
        self.refresh_counts();
        number
    }

    pub fn delete_chapter(&mut self, number: u32) -> Result<Chapter> {
        let index = self
            .chapters
            .iter()
            .position(|c| c.number == number)
            .ok_or(Error::ChapterNotFound(number))?;
        let removed = self.chapters.remove(index);
        self.refresh_counts();
        Ok(removed)
    }

    pub fn chapters_with_status(&self, status: ChapterStatus) -> Vec<&Chapter> {
        self.chapters.iter().filter(|c| c.status == status).collect()
    }

    pub fn outline_progress(&self) -> OutlineProgress {
        let mut progress = OutlineProgress::default();
        for chapter in &self.chapters {
            match chapter.status {
                ChapterStatus::Final => progress.completed += 1,
                ChapterStatus::Draft | ChapterStatus::Revised => progress.in_progress += 1,
                ChapterStatus::Outline => progress.outlined += 1,
            }
        }
        progress
    }

    /// Append a scene to a chapter; scenes are numbered from 1 in insertion order
    pub fn add_scene(&mut self, chapter: u32, mut scene: Scene) -> Result<u32> {
        let chapter = self.chapter_mut(chapter)?;
        scene.number = chapter.scenes.len() as u32 + 1;
        scene.word_count = count_words(&scene.content);
        let number = scene.number;
        chapter.scenes.push(scene);
        Ok(number)
    }

    /// Remove the scene at `index` (0-based position in the list)
    pub fn remove_scene(&mut self, chapter: u32, index: usize) -> Result<Scene> {
        let chapter = self.chapter_mut(chapter)?;
        if index >= chapter.scenes.len() {
            return Err(Error::Validation(format!(
                "scene (no scene at position {index})"
            )));
        }
        Ok(chapter.scenes.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Metadata;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn novel() -> Novel {
        let mut novel = Novel::new("T", "A", vec!["Fantasy".into()], "English");
        novel.metadata = Some(Metadata::default());
        novel
    }

    #[test]
    fn test_new_chapters_number_max_plus_one() {
        let mut novel = novel();
        assert_eq!(novel.save_chapter(ChapterDraft::new("One", ""), None, at(9)), 1);
        assert_eq!(novel.save_chapter(ChapterDraft::new("Five", ""), Some(5), at(9)), 5);
        assert_eq!(novel.save_chapter(ChapterDraft::new("Six", ""), None, at(9)), 6);

        novel.delete_chapter(6).unwrap();
        assert_eq!(novel.next_chapter_number(), 6);
        let numbers: Vec<u32> = novel.chapters.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 5]);
    }

    #[test]
    fn test_update_in_place_keeps_created_and_scenes() {
        let mut novel = novel();
        let n = novel.save_chapter(ChapterDraft::new("Opening", "a b"), None, at(9));
        novel
            .add_scene(n, Scene { title: "Arrival".into(), ..Default::default() })
            .unwrap();
        let created = novel.chapter(n).unwrap().created;

        let mut draft = ChapterDraft::new("Opening (rev)", "a b c d");
        draft.status = ChapterStatus::Revised;
        novel.save_chapter(draft, Some(n), at(11));

        assert_eq!(novel.chapters.len(), 1);
        let chapter = novel.chapter(n).unwrap();
        assert_eq!(chapter.title, "Opening (rev)");
        assert_eq!(chapter.created, created);
        assert_eq!(chapter.created, Some(at(9)));
        assert_eq!(chapter.modified, Some(at(11)));
        assert_eq!(chapter.scenes.len(), 1);
        assert_eq!(novel.metadata.as_ref().unwrap().word_count, 4);
        assert_eq!(novel.metadata.as_ref().unwrap().chapter_count, 1);
    }

    #[test]
    fn test_update_in_place_keeps_unknown_keys() {
        let mut novel: Novel = serde_json::from_value(serde_json::json!({
            "title": "T",
            "chapters": [{
                "number": 1,
                "title": "Old",
                "notes": "keep me",
                "scenes": [{"number": 1, "title": "s", "mood": "tense"}]
            }]
        }))
        .unwrap();

        novel.save_chapter(ChapterDraft::new("New", "x"), Some(1), at(10));

        let out = serde_json::to_value(&novel).unwrap();
        assert_eq!(out["chapters"][0]["title"], "New");
        assert_eq!(out["chapters"][0]["notes"], "keep me");
        assert_eq!(out["chapters"][0]["scenes"][0]["mood"], "tense");
    }

    #[test]
    fn test_chapter_without_number_reads_as_first() {
        let chapter: Chapter = serde_json::from_str(r#"{"title": "Loose"}"#).unwrap();
        assert_eq!(chapter.number, 1);
        assert!(chapter.extra.is_empty());
    }

    #[test]
    fn test_delete_missing_chapter() {
        let mut novel = novel();
        assert!(matches!(novel.delete_chapter(3), Err(Error::ChapterNotFound(3))));
    }

    #[test]
    fn test_scenes_numbered_and_removed() {
        let mut novel = novel();
        let n = novel.save_chapter(ChapterDraft::new("One", ""), None, at(9));
        let scene = |title: &str| Scene {
            title: title.into(),
            content: "x y z".into(),
            ..Default::default()
        };
        assert_eq!(novel.add_scene(n, scene("a")).unwrap(), 1);
        assert_eq!(novel.add_scene(n, scene("b")).unwrap(), 2);
        assert_eq!(novel.chapter(n).unwrap().scenes[1].word_count, 3);

        let removed = novel.remove_scene(n, 0).unwrap();
        assert_eq!(removed.title, "a");
        assert!(novel.remove_scene(n, 5).is_err());
        assert!(novel.add_scene(99, scene("c")).is_err());
    }

    #[test]
    fn test_outline_progress() {
        let mut novel = novel();
        for status in [
            ChapterStatus::Outline,
            ChapterStatus::Draft,
            ChapterStatus::Revised,
            ChapterStatus::Final,
        ] {
            let mut draft = ChapterDraft::new("c", "");
            draft.status = status;
            novel.save_chapter(draft, None, at(9));
        }
        assert_eq!(
            novel.outline_progress(),
            OutlineProgress { completed: 1, in_progress: 2, outlined: 1 }
        );
        assert_eq!(novel.chapters_with_status(ChapterStatus::Final).len(), 1);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Final".parse::<ChapterStatus>().unwrap(), ChapterStatus::Final);
        assert!("writing".parse::<ChapterStatus>().is_err());
    }
}
