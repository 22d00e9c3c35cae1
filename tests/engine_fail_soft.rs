// tests/engine_fail_soft.rs
//
// One broken or slow data source must never abort the other scorers.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hybrid_recommender::{
    ContentItem, ContentStore, EngineConfig, Exclusion, InMemoryCatalog, RecommendationEngine,
    RecommendationHistory, RecommendationRow, RecommendationStore,
};
use parking_lot::Mutex;

#[derive(Default, Clone, Copy)]
struct Faults {
    own_items: bool,
    overlap: bool,
    recent: bool,
    likes: bool,
    slow_recent: bool,
    slow_overlap: bool,
}

struct FlakyStore {
    inner: InMemoryCatalog,
    faults: Faults,
    calls: Mutex<Vec<&'static str>>,
}

impl FlakyStore {
    fn new(inner: InMemoryCatalog, faults: Faults) -> Self {
        Self {
            inner,
            faults,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn called(&self, name: &'static str) -> usize {
        self.calls.lock().iter().filter(|c| **c == name).count()
    }
}

#[async_trait]
impl ContentStore for FlakyStore {
    async fn list_own_items(&self, user_id: &str, limit: usize) -> Result<Vec<ContentItem>> {
        self.calls.lock().push("own");
        if self.faults.own_items {
            return Err(anyhow!("own items: connection reset"));
        }
        self.inner.list_own_items(user_id, limit).await
    }

    async fn list_public_items_by_tag_overlap(
        &self,
        tags: &[String],
        exclusion: &Exclusion,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        self.calls.lock().push("overlap");
        if self.faults.slow_overlap {
            tokio::time::sleep(StdDuration::from_secs(60)).await;
        }
        if self.faults.overlap {
            return Err(anyhow!("overlap: query failed"));
        }
        self.inner
            .list_public_items_by_tag_overlap(tags, exclusion, limit)
            .await
    }

    async fn list_public_recent_items(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        self.calls.lock().push("recent");
        if self.faults.slow_recent {
            tokio::time::sleep(StdDuration::from_secs(60)).await;
        }
        if self.faults.recent {
            return Err(anyhow!("recent: timeout from replica"));
        }
        self.inner.list_public_recent_items(since, limit).await
    }

    async fn count_likes_by_item_ids(&self, ids: &[String]) -> Result<HashMap<String, u64>> {
        self.calls.lock().push("likes");
        if self.faults.likes {
            return Err(anyhow!("likes: table locked"));
        }
        self.inner.count_likes_by_item_ids(ids).await
    }

    async fn list_follows(&self, user_id: &str, limit: usize) -> Result<Vec<String>> {
        self.calls.lock().push("follows");
        self.inner.list_follows(user_id, limit).await
    }
}

struct FailingSink;

#[async_trait]
impl RecommendationStore for FailingSink {
    async fn append_recommendations(
        &self,
        _user_id: &str,
        _rows: &[RecommendationRow],
    ) -> Result<()> {
        Err(anyhow!("disk full"))
    }
}

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn item(id: &str, owner: &str, tags: &[&str], age_h: i64, likes: u64) -> ContentItem {
    ContentItem {
        id: id.into(),
        owner_id: owner.into(),
        title: id.into(),
        url: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        is_public: true,
        created_at: now() - Duration::hours(age_h),
        like_count: likes,
    }
}

fn catalog() -> InMemoryCatalog {
    let cat = InMemoryCatalog::new();
    for it in [
        item("own", "u", &["vue", "frontend"], 900, 0),
        item("peer", "o1", &["vue", "frontend"], 900, 0),
        item("content", "o2", &["vue", "backend", "db"], 900, 0),
        item("hot", "o3", &["cooking"], 24, 10),
    ] {
        cat.add_item(it).unwrap();
    }
    cat
}

fn engine_with(store: Arc<FlakyStore>, cfg: EngineConfig) -> RecommendationEngine {
    let profiles = Arc::new(InMemoryCatalog::new());
    RecommendationEngine::new(store, profiles, Arc::new(RecommendationHistory::default()))
        .with_config(cfg)
}

fn ids(batch: &hybrid_recommender::RecommendationBatch) -> Vec<&str> {
    batch.items.iter().map(|c| c.id.as_str()).collect()
}

#[tokio::test]
async fn baseline_uses_all_three_sources() {
    let store = Arc::new(FlakyStore::new(catalog(), Faults::default()));
    let batch = engine_with(store, EngineConfig::default())
        .compute_recommendations_at("u", 20, now())
        .await;
    assert_eq!(batch.sources.peers, 2);
    assert_eq!(batch.sources.trending, 1);
    assert!(ids(&batch).contains(&"hot"));
    assert!(ids(&batch).contains(&"peer"));
}

#[tokio::test]
async fn failing_recent_read_only_drops_trending() {
    let faults = Faults {
        recent: true,
        ..Default::default()
    };
    let store = Arc::new(FlakyStore::new(catalog(), faults));
    let batch = engine_with(store, EngineConfig::default())
        .compute_recommendations_at("u", 20, now())
        .await;
    assert_eq!(batch.sources.trending, 0);
    assert!(batch.sources.peers > 0);
    assert!(!ids(&batch).contains(&"hot"));
}

#[tokio::test]
async fn failing_like_counts_score_items_as_unliked() {
    let faults = Faults {
        likes: true,
        ..Default::default()
    };
    let store = Arc::new(FlakyStore::new(catalog(), faults));
    let batch = engine_with(store, EngineConfig::default())
        .compute_recommendations_at("u", 20, now())
        .await;
    let hot = batch.items.iter().find(|c| c.id == "hot").unwrap();
    // (0 * 0.5 + (1 - 24/168) * 0.5) * 0.6
    assert!((hot.score - 0.2571).abs() < 1e-3, "got {}", hot.score);
}

#[tokio::test]
async fn failing_overlap_query_keeps_trending() {
    let faults = Faults {
        overlap: true,
        ..Default::default()
    };
    let store = Arc::new(FlakyStore::new(catalog(), faults));
    let batch = engine_with(store, EngineConfig::default())
        .compute_recommendations_at("u", 20, now())
        .await;
    assert_eq!(batch.sources.peers, 0);
    assert_eq!(batch.sources.content, 0);
    assert_eq!(ids(&batch), vec!["hot"]);
}

#[tokio::test]
async fn failing_own_items_short_circuits_personal_scorers() {
    let faults = Faults {
        own_items: true,
        ..Default::default()
    };
    let store = Arc::new(FlakyStore::new(catalog(), faults));
    let batch = engine_with(store.clone(), EngineConfig::default())
        .compute_recommendations_at("u", 20, now())
        .await;
    // empty profile and empty own tag set: no overlap query is ever issued
    assert_eq!(store.called("overlap"), 0);
    assert_eq!(ids(&batch), vec!["hot"]);
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out_without_stalling_others() {
    let faults = Faults {
        slow_recent: true,
        ..Default::default()
    };
    let store = Arc::new(FlakyStore::new(catalog(), faults));
    let mut cfg = EngineConfig::default();
    cfg.fusion.scorer_timeout_ms = 500;

    let started = tokio::time::Instant::now();
    let batch = engine_with(store, cfg)
        .compute_recommendations_at("u", 20, now())
        .await;

    assert!(started.elapsed() < StdDuration::from_secs(60));
    assert_eq!(batch.sources.trending, 0);
    assert!(batch.sources.peers > 0);
    assert!(batch.sources.content > 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_scorers_time_out_together() {
    // peers and content stall on the overlap query, trending on the recent read;
    // the profile build stays fast
    let faults = Faults {
        slow_overlap: true,
        slow_recent: true,
        ..Default::default()
    };
    let store = Arc::new(FlakyStore::new(catalog(), faults));
    let mut cfg = EngineConfig::default();
    cfg.fusion.scorer_timeout_ms = 500;

    let started = tokio::time::Instant::now();
    let batch = engine_with(store.clone(), cfg)
        .compute_recommendations_at("u", 20, now())
        .await;
    let elapsed = started.elapsed();

    assert_eq!(store.called("overlap"), 2);
    assert_eq!(store.called("recent"), 1);
    assert!(batch.items.is_empty());
    // sequential scorers would need three timeouts
    assert!(elapsed >= StdDuration::from_millis(500), "{elapsed:?}");
    assert!(elapsed < StdDuration::from_millis(1_000), "{elapsed:?}");
}

#[tokio::test]
async fn persistence_failure_is_reported_not_raised() {
    let cat = Arc::new(catalog());
    let eng = RecommendationEngine::new(cat.clone(), cat, Arc::new(FailingSink));
    let batch = eng.compute_recommendations_at("u", 20, now()).await;
    assert!(!batch.items.is_empty());
    let err = batch.persist_error.expect("persist error should be reported");
    assert!(err.contains("disk full"), "{err}");
}
