//! Activity content model shared by the player and content adapters
//!
//! Records are authored by the admin content tool and stored in the hosted
//! document database. Field names follow the stored documents (camelCase
//! step fields, `imagepath` gallery list).

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Activity category shown in the browsing screens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Guided physical or breathing exercise
    #[default]
    Exercise,
    /// Guided reading
    Reading,
    /// Music listening session
    Music,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityKind::Exercise => write!(f, "exercise"),
            ActivityKind::Reading => write!(f, "reading"),
            ActivityKind::Music => write!(f, "music"),
        }
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exercise" => Ok(ActivityKind::Exercise),
            "reading" => Ok(ActivityKind::Reading),
            "music" => Ok(ActivityKind::Music),
            other => Err(Error::InvalidInput(format!("Unknown activity kind: {other}"))),
        }
    }
}

/// One unit of an activity's guided sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStep {
    /// 1-based position within the activity
    pub step_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-text duration such as `"4 seconds"` or `"2 min"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// A step as stored: structured, or a bare legacy string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepEntry {
    Detailed(ActivityStep),
    Plain(String),
}

impl StepEntry {
    /// Display title (the text itself for legacy string steps)
    pub fn title(&self) -> &str {
        match self {
            StepEntry::Detailed(step) => &step.title,
            StepEntry::Plain(text) => text,
        }
    }

    /// Raw duration text, if the step carries one
    pub fn duration_text(&self) -> Option<&str> {
        match self {
            StepEntry::Detailed(step) => step.duration.as_deref(),
            StepEntry::Plain(_) => None,
        }
    }
}

impl From<ActivityStep> for StepEntry {
    fn from(step: ActivityStep) -> Self {
        StepEntry::Detailed(step)
    }
}

impl From<&str> for StepEntry {
    fn from(text: &str) -> Self {
        StepEntry::Plain(text.to_string())
    }
}

/// Content record describing a guided exercise, reading, or music session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: ActivityKind,
    /// Display-only total duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Emotion category ids this activity is listed under
    #[serde(default)]
    pub emotions: Vec<String>,
    /// Gallery images; index 0 is the cover image
    #[serde(default)]
    pub imagepath: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_steps")]
    pub steps: Vec<StepEntry>,
    #[serde(default)]
    pub popularity: u64,
}

impl Activity {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.imagepath.first().map(String::as_str)
    }

    /// Check the step invariants of a stored record
    ///
    /// Structured steps must carry a dense 1-based `stepNumber` matching their
    /// position and at least one instruction; legacy string steps must not be blank.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidInput("Activity id is empty".to_string()));
        }

        for (index, entry) in self.steps.iter().enumerate() {
            let position = index + 1;
            match entry {
                StepEntry::Plain(text) if text.trim().is_empty() => {
                    return Err(Error::InvalidInput(format!(
                        "Activity {}: step {} is blank",
                        self.id, position
                    )));
                }
                StepEntry::Plain(_) => {}
                StepEntry::Detailed(step) => {
                    if step.step_number as usize != position {
                        return Err(Error::InvalidInput(format!(
                            "Activity {}: step at position {} has stepNumber {}",
                            self.id, position, step.step_number
                        )));
                    }
                    if step.instructions.is_empty() {
                        return Err(Error::InvalidInput(format!(
                            "Activity {}: step {} has no instructions",
                            self.id, position
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Stored `steps` is either an array or that array JSON-encoded as a string
#[derive(Deserialize)]
#[serde(untagged)]
enum StepsField {
    List(Vec<StepEntry>),
    Encoded(String),
}

fn deserialize_steps<'de, D>(deserializer: D) -> std::result::Result<Vec<StepEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StepsField>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(StepsField::List(steps)) => Ok(steps),
        Some(StepsField::Encoded(raw)) if raw.trim().is_empty() => Ok(Vec::new()),
        Some(StepsField::Encoded(raw)) => {
            serde_json::from_str(&raw).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(number: u32, duration: Option<&str>) -> ActivityStep {
        ActivityStep {
            step_number: number,
            title: format!("Step {number}"),
            description: String::new(),
            duration: duration.map(str::to_string),
            instructions: vec!["Breathe".to_string()],
        }
    }

    fn activity(steps: Vec<StepEntry>) -> Activity {
        Activity {
            id: "box-breathing".to_string(),
            name: "Box breathing".to_string(),
            description: String::new(),
            kind: ActivityKind::Exercise,
            duration: None,
            difficulty: None,
            tags: Vec::new(),
            emotions: Vec::new(),
            imagepath: Vec::new(),
            steps,
            popularity: 0,
        }
    }

    #[test]
    fn test_step_fields_use_camel_case() {
        let value = serde_json::to_value(step(1, Some("4 seconds"))).unwrap();
        assert_eq!(value["stepNumber"], 1);
        assert_eq!(value["duration"], "4 seconds");
    }

    #[test]
    fn test_steps_accept_mixed_entries() {
        let record = json!({
            "id": "a1",
            "name": "Grounding",
            "kind": "reading",
            "steps": [
                "Find a quiet place",
                { "stepNumber": 2, "title": "Look", "instructions": ["Name five things"] }
            ]
        });

        let parsed: Activity = serde_json::from_value(record).unwrap();
        assert_eq!(parsed.kind, ActivityKind::Reading);
        assert_eq!(parsed.steps.len(), 2);
        assert_eq!(parsed.steps[0], StepEntry::Plain("Find a quiet place".to_string()));
        assert_eq!(parsed.steps[1].title(), "Look");
        assert_eq!(parsed.steps[1].duration_text(), None);
    }

    #[test]
    fn test_steps_accept_json_encoded_string() {
        let encoded = r#"[{"stepNumber":1,"title":"Inhale","duration":"4 seconds","instructions":["In"]}]"#;
        let record = json!({ "id": "a2", "name": "Breath", "steps": encoded });

        let parsed: Activity = serde_json::from_value(record).unwrap();
        assert_eq!(parsed.steps.len(), 1);
        assert_eq!(parsed.steps[0].duration_text(), Some("4 seconds"));
    }

    #[test]
    fn test_missing_or_null_steps_are_empty() {
        let missing: Activity = serde_json::from_value(json!({ "id": "a", "name": "n" })).unwrap();
        assert!(missing.steps.is_empty());

        let null: Activity =
            serde_json::from_value(json!({ "id": "a", "name": "n", "steps": null })).unwrap();
        assert!(null.steps.is_empty());

        let blank: Activity =
            serde_json::from_value(json!({ "id": "a", "name": "n", "steps": "  " })).unwrap();
        assert!(blank.steps.is_empty());
    }

    #[test]
    fn test_malformed_encoded_steps_rejected() {
        let result = serde_json::from_value::<Activity>(json!({
            "id": "a", "name": "n", "steps": "[{not json"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_accepts_dense_steps() {
        let record = activity(vec![step(1, None).into(), "Rest".into(), step(3, None).into()]);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_gap_in_step_numbers() {
        let record = activity(vec![step(1, None).into(), step(3, None).into()]);
        let err = record.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("stepNumber 3")));
    }

    #[test]
    fn test_validate_rejects_empty_instructions() {
        let mut first = step(1, None);
        first.instructions.clear();
        let record = activity(vec![first.into()]);
        assert!(matches!(record.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_blank_plain_step() {
        let record = activity(vec![" ".into()]);
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_activity_kind_parse_and_display() {
        assert_eq!("Music".parse::<ActivityKind>().unwrap(), ActivityKind::Music);
        assert_eq!(ActivityKind::Reading.to_string(), "reading");
        assert!("chat".parse::<ActivityKind>().is_err());
    }

    #[test]
    fn test_cover_image_is_first_gallery_entry() {
        let mut record = activity(Vec::new());
        assert_eq!(record.cover_image(), None);
        record.imagepath = vec!["cover.png".to_string(), "step1.png".to_string()];
        assert_eq!(record.cover_image(), Some("cover.png"));
    }
}
