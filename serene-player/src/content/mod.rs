//! Content repository and completion sink interfaces
//!
//! The hosted document store is an external collaborator; the player only
//! sees these traits. `JsonCatalog` is the file-backed adapter used by the
//! CLI and tests.

pub mod catalog;
pub mod search;

use crate::error::Result;
use async_trait::async_trait;
use serene_common::Activity;

pub use catalog::JsonCatalog;
pub use search::{sort_by_popularity, ActivityFilter};

/// Read access to activity records
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fetch one activity; `Error::NotFound` when no record has this id
    async fn get_activity_by_id(&self, id: &str) -> Result<Activity>;

    async fn list_activities(&self) -> Result<Vec<Activity>>;
}

/// Best-effort popularity / completion recording
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn increment_popularity(&self, id: &str) -> Result<()>;
}
