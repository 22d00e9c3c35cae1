//! history.rs — in-memory append log of computed recommendation batches.
//!
//! Every engine run appends a new batch; nothing is replaced. A global cap
//! bounds memory (oldest batches go first) and `prune_recommendations` trims
//! a single user's history on request.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::model::RecommendationRow;
use crate::store::RecommendationStore;

#[derive(Debug, Clone)]
pub struct StoredBatch {
    pub user_id: String,
    pub stored_at: DateTime<Utc>,
    pub rows: Vec<RecommendationRow>,
}

#[derive(Debug)]
pub struct RecommendationHistory {
    inner: Mutex<Vec<StoredBatch>>,
    cap: usize,
}

impl Default for RecommendationHistory {
    fn default() -> Self {
        Self::with_capacity(10_000)
    }
}

impl RecommendationHistory {
    /// `cap` is the maximum number of batches kept across all users.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(1_024))),
            cap: cap.max(1),
        }
    }

    /// All batches stored for `user_id`, oldest first.
    pub fn batches_for(&self, user_id: &str) -> Result<Vec<StoredBatch>> {
        let v = self.lock()?;
        Ok(v.iter().filter(|b| b.user_id == user_id).cloned().collect())
    }

    /// Total number of stored batches.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<StoredBatch>>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("history mutex poisoned"))
    }
}

#[async_trait::async_trait]
impl RecommendationStore for RecommendationHistory {
    async fn append_recommendations(
        &self,
        user_id: &str,
        rows: &[RecommendationRow],
    ) -> Result<()> {
        let batch = StoredBatch {
            user_id: user_id.to_string(),
            stored_at: Utc::now(),
            rows: rows.to_vec(),
        };

        let mut v = self.lock()?;
        v.push(batch);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
        Ok(())
    }

    async fn prune_recommendations(&self, user_id: &str, keep_batches: usize) -> Result<usize> {
        let mut v = self.lock()?;
        let total = v.iter().filter(|b| b.user_id == user_id).count();
        let mut to_drop = total.saturating_sub(keep_batches);
        if to_drop == 0 {
            return Ok(0);
        }
        let removed = to_drop;
        v.retain(|b| {
            if to_drop > 0 && b.user_id == user_id {
                to_drop -= 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CandidateKind;

    fn row(id: &str) -> RecommendationRow {
        RecommendationRow {
            kind: CandidateKind::ContentItem,
            id: id.into(),
            score: 0.5,
            confidence_percent: 50.0,
            reason: "r".into(),
        }
    }

    #[tokio::test]
    async fn appends_never_replace() {
        let h = RecommendationHistory::default();
        h.append_recommendations("u1", &[row("a")]).await.unwrap();
        h.append_recommendations("u1", &[row("a")]).await.unwrap();
        h.append_recommendations("u2", &[row("b")]).await.unwrap();
        assert_eq!(h.batches_for("u1").unwrap().len(), 2);
        assert_eq!(h.len().unwrap(), 3);
    }

    #[tokio::test]
    async fn global_cap_drops_oldest() {
        let h = RecommendationHistory::with_capacity(2);
        for id in ["a", "b", "c"] {
            h.append_recommendations("u1", &[row(id)]).await.unwrap();
        }
        let kept = h.batches_for("u1").unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].rows[0].id, "b");
    }

    #[tokio::test]
    async fn prune_keeps_newest_for_one_user_only() {
        let h = RecommendationHistory::default();
        for id in ["a", "b", "c"] {
            h.append_recommendations("u1", &[row(id)]).await.unwrap();
        }
        h.append_recommendations("u2", &[row("x")]).await.unwrap();

        let removed = h.prune_recommendations("u1", 1).await.unwrap();
        assert_eq!(removed, 2);
        let kept = h.batches_for("u1").unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].rows[0].id, "c");
        assert_eq!(h.batches_for("u2").unwrap().len(), 1);
    }
}
