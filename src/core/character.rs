//! Characters and their relationships
//!
//! Relationships are stored on both sides: a link between A and B lives in A's list
//! (`with == B`) and in B's list (`with == A`). Every mutation here keeps the two
//! records in step.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::Novel;
use super::error::{Error, Result};

/// A character profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub name: String,
    pub alias: String,
    pub role: String,
    pub archetype: String,
    pub age: Option<u32>,
    pub gender: String,
    pub species: String,
    pub occupation: String,
    pub description: String,
    pub appearance: Appearance,
    pub personality: Personality,
    pub background: Background,
    pub motivations: Motivations,
    pub character_arc: CharacterArc,
    pub importance: u8,
    pub added_date: Option<NaiveDateTime>,
    /// Chapter appearances tracked during development
    pub appearances: Vec<Value>,
    pub relationships: Vec<Relationship>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Appearance {
    pub height: String,
    pub build: String,
    pub hair_color: String,
    pub hair_style: String,
    pub eye_color: String,
    pub skin_tone: String,
    pub distinguishing_features: String,
    pub clothing_style: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personality {
    pub mbti: String,
    pub enneagram: String,
    pub virtues: Vec<String>,
    pub flaws: Vec<String>,
    pub traits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Background {
    pub backstory: String,
    pub birthplace: String,
    pub education: String,
    pub family: String,
    pub trauma: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Motivations {
    pub external_goal: String,
    pub internal_need: String,
    pub fear: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterArc {
    #[serde(rename = "type")]
    pub kind: String,
    pub starting_point: String,
    pub development: String,
    pub end_point: String,
}

/// One side of a relationship between two characters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relationship {
    pub with: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// -10 (hostile) to 10 (devoted)
    pub strength: i8,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Character {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            importance: 5,
            ..Default::default()
        }
    }
}

impl Novel {
    fn character_index(&self, name: &str) -> Result<usize> {
        self.characters
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::CharacterNotFound(name.to_string()))
    }

    pub fn character(&self, name: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.name == name)
    }

    /// Add a character; the name is required but not enforced unique.
    /// `now` becomes `added_date` unless one is already set.
    pub fn add_character(&mut self, mut character: Character, now: NaiveDateTime) -> Result<()> {
        if character.name.trim().is_empty() {
            return Err(Error::validation("name"));
        }
        if character.added_date.is_none() {
            character.added_date = Some(now);
        }
        self.characters.push(character);
        self.refresh_counts();
        Ok(())
    }

    /// Remove the first character called `name` and every relationship pointing at it
    pub fn remove_character(&mut self, name: &str) -> Result<Character> {
        let index = self.character_index(name)?;
        let removed = self.characters.remove(index);
        for other in &mut self.characters {
            other.relationships.retain(|r| r.with != name);
        }
        self.refresh_counts();
        Ok(removed)
    }

    /// Link `a` and `b`, replacing any existing link between them on both sides
    pub fn set_relationship(
        &mut self,
        a: &str,
        b: &str,
        kind: &str,
        strength: i8,
        description: &str,
        now: NaiveDateTime,
    ) -> Result<()> {
        if a == b {
            return Err(Error::Validation(
                "relationship (a character cannot relate to itself)".to_string(),
            ));
        }
        let ia = self.character_index(a)?;
        let ib = self.character_index(b)?;

        let forward = Relationship {
            with: b.to_string(),
            kind: kind.to_string(),
            strength: strength.clamp(-10, 10),
            description: description.to_string(),
            updated: Some(now),
            extra: Map::new(),
        };
        let reverse = Relationship {
            with: a.to_string(),
            ..forward.clone()
        };

        let links = &mut self.characters[ia].relationships;
        links.retain(|r| r.with != b);
        links.push(forward);

        let links = &mut self.characters[ib].relationships;
        links.retain(|r| r.with != a);
        links.push(reverse);
        Ok(())
    }

    /// Remove the link between `a` and `b` from both sides
    pub fn clear_relationship(&mut self, a: &str, b: &str) -> Result<()> {
        let ia = self.character_index(a)?;
        let ib = self.character_index(b)?;
        self.characters[ia].relationships.retain(|r| r.with != b);
        self.characters[ib].relationships.retain(|r| r.with != a);
        Ok(())
    }

    pub fn relationships_of(&self, name: &str) -> &[Relationship] {
        self.character(name)
            .map(|c| c.relationships.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Metadata;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    fn cast() -> Novel {
        let mut novel = Novel::new("T", "A", vec!["Drama".into()], "English");
        novel.metadata = Some(Metadata::default());
        for name in ["Ann", "Ben", "Cal"] {
            novel.add_character(Character::new(name, "Supporting"), at(8)).unwrap();
        }
        novel
    }

    fn links_with<'a>(novel: &'a Novel, from: &str, to: &str) -> Vec<&'a Relationship> {
        novel
            .relationships_of(from)
            .iter()
            .filter(|r| r.with == to)
            .collect()
    }

    #[test]
    fn test_set_relationship_is_symmetric() {
        let mut novel = cast();
        novel.set_relationship("Ann", "Ben", "Siblings", 7, "twins", at(8)).unwrap();
        novel.set_relationship("Ann", "Ben", "Rivals", -3, "feud", at(14)).unwrap();

        let forward = links_with(&novel, "Ann", "Ben");
        let reverse = links_with(&novel, "Ben", "Ann");
        assert_eq!(forward.len(), 1);
        assert_eq!(reverse.len(), 1);
        assert_eq!(forward[0].kind, "Rivals");
        assert_eq!(reverse[0].strength, -3);
        assert_eq!(forward[0].updated, Some(at(14)));
        assert_eq!(reverse[0].updated, Some(at(14)));
        assert_eq!(novel.character("Ann").unwrap().added_date, Some(at(8)));
    }

    #[test]
    fn test_clear_relationship_removes_both_sides() {
        let mut novel = cast();
        novel.set_relationship("Ann", "Ben", "Friends", 5, "", at(8)).unwrap();
        novel.set_relationship("Ann", "Cal", "Mentor", 8, "", at(8)).unwrap();
        novel.clear_relationship("Ben", "Ann").unwrap();

        assert!(links_with(&novel, "Ann", "Ben").is_empty());
        assert!(links_with(&novel, "Ben", "Ann").is_empty());
        assert_eq!(links_with(&novel, "Ann", "Cal").len(), 1);
    }

    #[test]
    fn test_relationship_requires_known_characters() {
        let mut novel = cast();
        let err = novel.set_relationship("Ann", "Zed", "Friends", 1, "", at(8)).unwrap_err();
        assert!(matches!(err, Error::CharacterNotFound(ref n) if n == "Zed"));
        assert!(novel.set_relationship("Ann", "Ann", "Self", 1, "", at(8)).is_err());
    }

    #[test]
    fn test_remove_character_drops_dangling_links() {
        let mut novel = cast();
        novel.set_relationship("Ann", "Ben", "Friends", 5, "", at(8)).unwrap();
        novel.remove_character("Ben").unwrap();

        assert!(novel.relationships_of("Ann").is_empty());
        assert_eq!(novel.metadata.as_ref().unwrap().character_count, 2);
    }

    #[test]
    fn test_add_character_requires_name() {
        let mut novel = cast();
        assert!(matches!(
            novel.add_character(Character::new(" ", "Minor"), at(8)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_relationship_json_shape() {
        let rel = Relationship {
            with: "Ben".into(),
            kind: "Friends".into(),
            strength: 4,
            description: "school".into(),
            updated: None,
            extra: Map::new(),
        };
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"with": "Ben", "type": "Friends", "strength": 4, "description": "school"})
        );
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let json = serde_json::json!({
            "name": "Ann",
            "quirk": "hums",
            "relationships": [{"with": "Ben", "type": "Friends", "since": "school"}]
        });
        let character: Character = serde_json::from_value(json).unwrap();
        assert_eq!(character.extra["quirk"], "hums");

        let out = serde_json::to_value(&character).unwrap();
        assert_eq!(out["quirk"], "hums");
        assert_eq!(out["relationships"][0]["since"], "school");
    }
}
