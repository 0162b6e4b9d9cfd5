//! File-backed activity catalog
//!
//! Loads a JSON array of activity records, validates them, and serves them
//! from memory. Popularity increments are kept in memory only.

use super::{CompletionSink, ContentRepository};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serene_common::Activity;
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// In-memory catalog loaded from JSON
#[derive(Debug)]
pub struct JsonCatalog {
    activities: RwLock<Vec<Activity>>,
}

impl JsonCatalog {
    /// Build from records, rejecting invalid steps and duplicate ids
    pub fn from_activities(activities: Vec<Activity>) -> Result<Self> {
        let mut seen = HashSet::new();
        for activity in &activities {
            activity.validate()?;
            if !seen.insert(activity.id.as_str()) {
                return Err(serene_common::Error::InvalidInput(format!(
                    "Duplicate activity id: {}",
                    activity.id
                ))
                .into());
            }
        }

        Ok(Self {
            activities: RwLock::new(activities),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let activities: Vec<Activity> =
            serde_json::from_str(json).map_err(serene_common::Error::from)?;
        Self::from_activities(activities)
    }

    /// Load a catalog file
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Content(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json_str(&json)?;
        info!(
            "Loaded {} activities from {}",
            catalog.len().await,
            path.display()
        );
        Ok(catalog)
    }

    pub async fn len(&self) -> usize {
        self.activities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.activities.read().await.is_empty()
    }

    /// Current popularity count for an activity
    pub async fn popularity(&self, id: &str) -> Option<u64> {
        self.activities
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.popularity)
    }
}

#[async_trait]
impl ContentRepository for JsonCatalog {
    async fn get_activity_by_id(&self, id: &str) -> Result<Activity> {
        self.activities
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn list_activities(&self) -> Result<Vec<Activity>> {
        Ok(self.activities.read().await.clone())
    }
}

#[async_trait]
impl CompletionSink for JsonCatalog {
    async fn increment_popularity(&self, id: &str) -> Result<()> {
        let mut activities = self.activities.write().await;
        let activity = activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        activity.popularity = activity.popularity.saturating_add(1);
        debug!("Popularity of {} is now {}", id, activity.popularity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {
            "id": "box-breathing",
            "name": "Box breathing",
            "kind": "exercise",
            "imagepath": ["cover.png", "inhale.png"],
            "steps": [
                { "stepNumber": 1, "title": "Inhale", "duration": "4 seconds", "instructions": ["Breathe in"] }
            ],
            "popularity": 3
        },
        { "id": "rain", "name": "Rain sounds", "kind": "music" }
    ]"#;

    #[tokio::test]
    async fn test_get_activity_by_id() {
        let catalog = JsonCatalog::from_json_str(CATALOG).unwrap();
        let activity = catalog.get_activity_by_id("box-breathing").await.unwrap();
        assert_eq!(activity.name, "Box breathing");
        assert_eq!(activity.steps.len(), 1);
        assert_eq!(catalog.len().await, 2);
    }

    #[tokio::test]
    async fn test_missing_activity_is_not_found() {
        let catalog = JsonCatalog::from_json_str(CATALOG).unwrap();
        let err = catalog.get_activity_by_id("nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_increment_popularity() {
        let catalog = JsonCatalog::from_json_str(CATALOG).unwrap();
        catalog.increment_popularity("box-breathing").await.unwrap();
        catalog.increment_popularity("rain").await.unwrap();
        catalog.increment_popularity("rain").await.unwrap();

        assert_eq!(catalog.popularity("box-breathing").await, Some(4));
        assert_eq!(catalog.popularity("rain").await, Some(2));
        assert!(catalog.increment_popularity("nope").await.is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[{ "id": "a", "name": "A" }, { "id": "a", "name": "B" }]"#;
        let err = JsonCatalog::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("Duplicate activity id"));
    }

    #[test]
    fn test_invalid_steps_rejected() {
        let json = r#"[{ "id": "a", "name": "A", "steps": [
            { "stepNumber": 2, "title": "Out of order", "instructions": ["x"] }
        ] }]"#;
        assert!(matches!(
            JsonCatalog::from_json_str(json),
            Err(Error::Common(serene_common::Error::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            JsonCatalog::from_json_str("{ not a list"),
            Err(Error::Common(serene_common::Error::Json(_)))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_content_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonCatalog::load(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Content(_)));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activities.json");
        std::fs::write(&path, CATALOG).unwrap();

        let catalog = JsonCatalog::load(&path).await.unwrap();
        assert_eq!(catalog.list_activities().await.unwrap().len(), 2);
        assert!(!catalog.is_empty().await);
    }
}
