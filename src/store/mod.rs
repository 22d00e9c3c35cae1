// src/store/mod.rs
//! Capability traits for the external collaborators.
//!
//! The engine holds no global state: every read and write goes through one of
//! these traits, so tests can swap in [`memory::InMemoryCatalog`] and
//! [`crate::history::RecommendationHistory`].

pub mod memory;

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::model::{ContentItem, RecommendationRow, UserSummary};

/// Which items a tag-overlap query must leave out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// Skip everything owned by this user.
    Owner(String),
    /// Skip these item ids.
    Ids(Vec<String>),
}

impl Exclusion {
    pub fn excludes(&self, item: &ContentItem) -> bool {
        match self {
            Exclusion::Owner(owner) => item.owner_id == *owner,
            Exclusion::Ids(ids) => ids.iter().any(|id| *id == item.id),
        }
    }
}

/// Read-only access to content, likes and follow relations.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Up to `limit` items owned by `user_id`, public or not.
    async fn list_own_items(&self, user_id: &str, limit: usize) -> Result<Vec<ContentItem>>;

    /// Up to `limit` public items sharing at least one tag with `tags`.
    async fn list_public_items_by_tag_overlap(
        &self,
        tags: &[String],
        exclusion: &Exclusion,
        limit: usize,
    ) -> Result<Vec<ContentItem>>;

    /// Up to `limit` public items created at or after `since`, newest first.
    async fn list_public_recent_items(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ContentItem>>;

    /// Like counts keyed by item id. Missing ids mean zero likes.
    async fn count_likes_by_item_ids(&self, ids: &[String]) -> Result<HashMap<String, u64>>;

    /// Up to `limit` user ids followed by `user_id`.
    async fn list_follows(&self, user_id: &str, limit: usize) -> Result<Vec<String>>;
}

/// Display information for users.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_user_summaries(&self, user_ids: &[String])
        -> Result<HashMap<String, UserSummary>>;
}

/// Write side: computed batches are appended, never replaced.
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn append_recommendations(&self, user_id: &str, rows: &[RecommendationRow])
        -> Result<()>;

    /// Drop all but the newest `keep_batches` batches for `user_id`.
    /// Returns how many batches were removed. Stores without history
    /// management keep everything.
    async fn prune_recommendations(&self, _user_id: &str, _keep_batches: usize) -> Result<usize> {
        Ok(0)
    }
}
