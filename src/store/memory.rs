// src/store/memory.rs
//! In-memory content + profile store, used by tests and the demo binary.
//!
//! JSON shape accepted by [`InMemoryCatalog::from_json_str`]:
//! ```json
//! {
//!   "items":   [{ "id": "b1", "owner_id": "u2", "title": "...", "tags": ["rust"],
//!                 "created_at": "2024-05-01T10:00:00Z", "like_count": 3 }],
//!   "follows": { "u1": ["u2"] },
//!   "users":   [{ "user_id": "u2", "display_name": "Ada" }]
//! }
//! ```
//! Queries return items in insertion order unless the trait says otherwise.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ContentStore, Exclusion, ProfileStore};
use crate::model::{ContentItem, UserSummary};

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<ContentItem>,
    #[serde(default)]
    follows: HashMap<String, Vec<String>>,
    #[serde(default)]
    users: Vec<UserSummary>,
}

#[derive(Debug, Default)]
struct Inner {
    items: Vec<ContentItem>,
    follows: HashMap<String, Vec<String>>,
    users: HashMap<String, UserSummary>,
}

/// Thread-safe catalog of items, follow relations and user summaries.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<Inner>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from JSON (see module docs for the shape).
    pub fn from_json_str(s: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(s).context("parsing catalog json")?;
        let users = file
            .users
            .into_iter()
            .map(|u| (u.user_id.clone(), u))
            .collect();
        Ok(Self {
            inner: RwLock::new(Inner {
                items: file.items,
                follows: file.follows,
                users,
            }),
        })
    }

    /// Load a catalog from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading catalog from {}", path.display()))?;
        Self::from_json_str(&content)
    }

    pub fn add_item(&self, item: ContentItem) -> Result<()> {
        self.write()?.items.push(item);
        Ok(())
    }

    pub fn add_follow(&self, follower: &str, followee: &str) -> Result<()> {
        self.write()?
            .follows
            .entry(follower.to_string())
            .or_default()
            .push(followee.to_string());
        Ok(())
    }

    pub fn add_user(&self, summary: UserSummary) -> Result<()> {
        self.write()?.users.insert(summary.user_id.clone(), summary);
        Ok(())
    }

    pub fn item_count(&self) -> Result<usize> {
        Ok(self.read()?.items.len())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("catalog lock poisoned"))
    }
}

#[async_trait::async_trait]
impl ContentStore for InMemoryCatalog {
    async fn list_own_items(&self, user_id: &str, limit: usize) -> Result<Vec<ContentItem>> {
        let inner = self.read()?;
        Ok(inner
            .items
            .iter()
            .filter(|it| it.owner_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_public_items_by_tag_overlap(
        &self,
        tags: &[String],
        exclusion: &Exclusion,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let inner = self.read()?;
        Ok(inner
            .items
            .iter()
            .filter(|it| it.is_public && !exclusion.excludes(it))
            .filter(|it| it.tags.iter().any(|t| tags.contains(t)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_public_recent_items(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let inner = self.read()?;
        let mut recent: Vec<ContentItem> = inner
            .items
            .iter()
            .filter(|it| it.is_public && it.created_at >= since)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        Ok(recent)
    }

    async fn count_likes_by_item_ids(&self, ids: &[String]) -> Result<HashMap<String, u64>> {
        let inner = self.read()?;
        Ok(inner
            .items
            .iter()
            .filter(|it| ids.contains(&it.id))
            .map(|it| (it.id.clone(), it.like_count))
            .collect())
    }

    async fn list_follows(&self, user_id: &str, limit: usize) -> Result<Vec<String>> {
        let inner = self.read()?;
        Ok(inner
            .follows
            .get(user_id)
            .map(|v| v.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl ProfileStore for InMemoryCatalog {
    async fn get_user_summaries(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, UserSummary>> {
        let inner = self.read()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| inner.users.get(id).map(|u| (id.clone(), u.clone())))
            .collect())
    }
}
