//! Client-side search over an already fetched activity list

use serene_common::{Activity, ActivityKind};

/// Browse filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    /// Case-insensitive substring of name, description, or a tag
    pub query: Option<String>,
    pub kind: Option<ActivityKind>,
    /// Emotion category id (case-insensitive)
    pub emotion: Option<String>,
    pub tag: Option<String>,
}

impl ActivityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_kind(mut self, kind: ActivityKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn matches(&self, activity: &Activity) -> bool {
        if let Some(kind) = self.kind {
            if activity.kind != kind {
                return false;
            }
        }

        if let Some(emotion) = non_blank(&self.emotion) {
            if !activity.emotions.iter().any(|e| e.eq_ignore_ascii_case(emotion)) {
                return false;
            }
        }

        if let Some(tag) = non_blank(&self.tag) {
            if !activity.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }

        match non_blank(&self.query) {
            Some(query) => {
                let needle = query.to_lowercase();
                activity.name.to_lowercase().contains(&needle)
                    || activity.description.to_lowercase().contains(&needle)
                    || activity
                        .tags
                        .iter()
                        .any(|t| t.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// Matching activities, in input order
    pub fn apply<'a>(&self, activities: &'a [Activity]) -> Vec<&'a Activity> {
        activities.iter().filter(|a| self.matches(a)).collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Most popular first; ties ordered by name
pub fn sort_by_popularity(activities: &mut [&Activity]) {
    activities.sort_by(|a, b| {
        b.popularity
            .cmp(&a.popularity)
            .then_with(|| a.name.cmp(&b.name))
    });
}
