// src/scoring/trending.rs
//! Recency/popularity signal, independent of personalization.
//!
//! Only the newest `candidate_limit` items inside the window are scored, so the
//! result is "popular among the most recent", not "globally most popular".
//! The score grows with the raw like count and is therefore unbounded above.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use anyhow::{Context, Result};

use crate::config::TrendingConfig;
use crate::model::ScoredCandidate;
use crate::store::ContentStore;

pub async fn score_by_trending(
    store: &dyn ContentStore,
    user_id: &str,
    limit: usize,
    now: DateTime<Utc>,
    cfg: &TrendingConfig,
) -> Result<Vec<ScoredCandidate>> {
    let window = Duration::try_milliseconds((cfg.window_hours * 3_600_000.0) as i64)
        .unwrap_or(Duration::MAX);
    let since = now
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let items: Vec<_> = store
        .list_public_recent_items(since, cfg.candidate_limit)
        .await
        .context("trending: listing recent items")?
        .into_iter()
        .filter(|it| it.owner_id != user_id)
        .collect();
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = items.iter().map(|it| it.id.clone()).collect();
    let likes = match store.count_likes_by_item_ids(&ids).await {
        Ok(m) => m,
        Err(e) => {
            warn!(target: "recommender", error = ?e, "trending: like counts unavailable, using 0");
            Default::default()
        }
    };

    let mut out: Vec<ScoredCandidate> = items
        .iter()
        .map(|it| {
            let like_count = likes.get(&it.id).copied().unwrap_or(0);
            let age_hours = age_hours(now, it.created_at);
            let recency = recency_factor(age_hours, cfg.window_hours);
            let score = trending_score(like_count, recency, cfg);
            ScoredCandidate::for_item(it, score, format!("Trending: {like_count} likes this week"))
                .with_metadata(serde_json::json!({
                    "source": "trending",
                    "like_count": like_count,
                    "age_hours": age_hours,
                }))
        })
        .collect();

    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out.truncate(limit);
    Ok(out)
}

/// Fractional hours between `created_at` and `now`.
pub fn age_hours(now: DateTime<Utc>, created_at: DateTime<Utc>) -> f64 {
    (now - created_at).num_milliseconds() as f64 / 3_600_000.0
}

/// Linear decay over the window, clamped to `[0, 1]`.
pub fn recency_factor(age_hours: f64, window_hours: f64) -> f64 {
    (1.0 - age_hours / window_hours).clamp(0.0, 1.0)
}

pub fn trending_score(like_count: u64, recency: f64, cfg: &TrendingConfig) -> f64 {
    (like_count as f64 * cfg.like_weight + recency * cfg.recency_weight) * cfg.weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentItem;
    use crate::store::memory::InMemoryCatalog;

    fn item(id: &str, owner: &str, created_at: DateTime<Utc>, likes: u64) -> ContentItem {
        ContentItem {
            id: id.into(),
            owner_id: owner.into(),
            title: id.into(),
            url: None,
            tags: vec![],
            is_public: true,
            created_at,
            like_count: likes,
        }
    }

    #[test]
    fn day_old_item_with_ten_likes() {
        let cfg = TrendingConfig::default();
        let r = recency_factor(24.0, cfg.window_hours);
        assert!((r - (1.0 - 24.0 / 168.0)).abs() < 1e-12);
        let s = trending_score(10, r, &cfg);
        assert!((s - 3.257).abs() < 1e-3, "got {s}");
        // well above the 0.8 / 0.7 ceilings of the other signals
        assert!(s > 1.0);
    }

    #[test]
    fn recency_is_clamped() {
        assert_eq!(recency_factor(500.0, 168.0), 0.0);
        assert_eq!(recency_factor(-3.0, 168.0), 1.0);
        assert_eq!(recency_factor(0.0, 168.0), 1.0);
    }

    #[tokio::test]
    async fn sorts_by_score_and_skips_own_and_stale() {
        let now = Utc::now();
        let cat = InMemoryCatalog::new();
        cat.add_item(item("fresh", "o1", now - Duration::hours(1), 0))
            .unwrap();
        cat.add_item(item("liked", "o2", now - Duration::hours(100), 4))
            .unwrap();
        cat.add_item(item("mine", "u", now - Duration::hours(2), 50))
            .unwrap();
        cat.add_item(item("stale", "o3", now - Duration::hours(200), 99))
            .unwrap();

        let out = score_by_trending(&cat, "u", 5, now, &TrendingConfig::default())
            .await
            .unwrap();
        let ids: Vec<_> = out.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["liked", "fresh"]);
        assert_eq!(out[0].metadata["like_count"], 4);
    }

    #[tokio::test]
    async fn oversized_window_reaches_back_to_the_earliest_date() {
        let now = Utc::now();
        let cat = InMemoryCatalog::new();
        cat.add_item(item("old", "o1", now - Duration::days(3_650), 2))
            .unwrap();
        let cfg = TrendingConfig {
            window_hours: 1e10,
            ..Default::default()
        };
        let out = score_by_trending(&cat, "u", 5, now, &cfg).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "old");
    }

    #[tokio::test]
    async fn candidate_cap_applies_before_scoring() {
        let now = Utc::now();
        let cat = InMemoryCatalog::new();
        // older but very popular item falls outside the newest-N cap
        cat.add_item(item("popular", "o1", now - Duration::hours(50), 1_000))
            .unwrap();
        cat.add_item(item("new", "o2", now - Duration::hours(1), 0))
            .unwrap();
        let cfg = TrendingConfig {
            candidate_limit: 1,
            ..Default::default()
        };
        let out = score_by_trending(&cat, "u", 5, now, &cfg).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "new");
    }
}
