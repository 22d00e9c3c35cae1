//! # Recommendation Engine
//! Orchestrates one recommendation run for a user:
//! profile → three scorers concurrently → fusion → append to the store.
//!
//! Policy: every scorer is fail-soft. An error or a timeout in one source is
//! logged, counted, and treated as "no candidates"; it never aborts the other
//! sources or the run. A failed append is reported on the returned batch but
//! the ranked list is still handed back.
//!
//! The engine holds only injected store handles and an immutable config, so
//! it is cheap to clone and safe to share between concurrent calls.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::fusion;
use crate::metrics::{
    ensure_metrics_described, CANDIDATES_TOTAL, COMPUTE_MS, PERSIST_FAILURES_TOTAL,
    RESULTS_TOTAL, RUNS_TOTAL, SCORER_FAILURES_TOTAL,
};
use crate::model::{
    InterestProfile, RecommendationBatch, RecommendationRow, ScoredCandidate, SimilarUser,
    Source, SourceCounts,
};
use crate::profile;
use crate::scoring::{rank_peers, score_by_content, score_by_peers, score_by_trending};
use crate::store::{ContentStore, ProfileStore, RecommendationStore};

#[derive(Clone)]
pub struct RecommendationEngine {
    content: Arc<dyn ContentStore>,
    profiles: Arc<dyn ProfileStore>,
    sink: Arc<dyn RecommendationStore>,
    cfg: Arc<EngineConfig>,
}

impl RecommendationEngine {
    pub fn new(
        content: Arc<dyn ContentStore>,
        profiles: Arc<dyn ProfileStore>,
        sink: Arc<dyn RecommendationStore>,
    ) -> Self {
        Self {
            content,
            profiles,
            sink,
            cfg: Arc::new(EngineConfig::default()),
        }
    }

    pub fn with_config(mut self, cfg: EngineConfig) -> Self {
        self.cfg = Arc::new(cfg);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Ranked recommendations using the configured default limit (20).
    pub async fn recommend(&self, user_id: &str) -> Vec<ScoredCandidate> {
        self.compute_recommendations(user_id, self.cfg.fusion.default_limit)
            .await
    }

    /// Ranked, deduplicated recommendations; at most `limit` entries.
    /// The same slice is appended to the recommendation store.
    pub async fn compute_recommendations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Vec<ScoredCandidate> {
        self.compute_recommendations_detailed(user_id, limit)
            .await
            .items
    }

    /// Like [`Self::compute_recommendations`] but also reports source counts
    /// and a persistence failure, if any.
    pub async fn compute_recommendations_detailed(
        &self,
        user_id: &str,
        limit: usize,
    ) -> RecommendationBatch {
        self.compute_recommendations_at(user_id, limit, Utc::now())
            .await
    }

    /// Run against an explicit clock (used for trending age).
    pub async fn compute_recommendations_at(
        &self,
        user_id: &str,
        limit: usize,
        now: DateTime<Utc>,
    ) -> RecommendationBatch {
        ensure_metrics_described();
        counter!(RUNS_TOTAL).increment(1);
        let t0 = Instant::now();
        let cfg = &*self.cfg;
        let timeout = cfg.fusion.scorer_timeout();
        let store = &*self.content;

        // (1) Profile
        let profile = self.build_profile_within(user_id, timeout).await;

        // (2) Fan out
        let (peers, content, trending) = tokio::join!(
            fail_soft(
                Source::Peers,
                user_id,
                timeout,
                score_by_peers(store, user_id, cfg.fusion.peers_limit, &cfg.peers),
            ),
            fail_soft(
                Source::Content,
                user_id,
                timeout,
                score_by_content(store, user_id, &profile, cfg.fusion.content_limit, &cfg.content),
            ),
            fail_soft(
                Source::Trending,
                user_id,
                timeout,
                score_by_trending(store, user_id, cfg.fusion.trending_limit, now, &cfg.trending),
            ),
        );

        let sources = SourceCounts {
            peers: peers.len(),
            content: content.len(),
            trending: trending.len(),
        };

        // (3)-(5) Fuse
        let items = fusion::fuse(peers, content, trending, limit);

        // (6) Persist
        let persist_error = if items.is_empty() {
            None
        } else {
            match self.persist(user_id, &items, timeout).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(
                        target: "recommender",
                        error = ?e,
                        user_id,
                        "persisting recommendations failed"
                    );
                    counter!(PERSIST_FAILURES_TOTAL).increment(1);
                    Some(format!("{e:#}"))
                }
            }
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!(COMPUTE_MS).record(ms);
        counter!(RESULTS_TOTAL).increment(items.len() as u64);
        info!(
            target: "recommender",
            user_id,
            peers = sources.peers,
            content = sources.content,
            trending = sources.trending,
            returned = items.len(),
            persisted = persist_error.is_none(),
            elapsed_ms = ms,
            "recommendations computed"
        );

        RecommendationBatch {
            user_id: user_id.to_string(),
            generated_at: now,
            items,
            sources,
            persist_error,
        }
    }

    /// Interest profile for `user_id` (never fails).
    pub async fn build_profile(&self, user_id: &str) -> InterestProfile {
        profile::build_profile(&*self.content, user_id, &self.cfg.profile).await
    }

    /// Users ranked by accumulated tag similarity, with display info when available.
    /// Shares its ranking with the peer scorer, so both agree on owner order.
    pub async fn get_similar_users(&self, user_id: &str, limit: usize) -> Vec<SimilarUser> {
        let timeout = self.cfg.fusion.scorer_timeout();
        let ranking = match tokio::time::timeout(
            timeout,
            rank_peers(&*self.content, user_id, &self.cfg.peers),
        )
        .await
        {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!(target: "recommender", error = ?e, user_id, "similar users: ranking failed");
                return Vec::new();
            }
            Err(_) => {
                warn!(target: "recommender", user_id, "similar users: ranking timed out");
                return Vec::new();
            }
        };

        let top: Vec<(String, f64)> = ranking.owners.into_iter().take(limit).collect();
        if top.is_empty() {
            return Vec::new();
        }

        let ids: Vec<String> = top.iter().map(|(id, _)| id.clone()).collect();
        let mut summaries = match self.profiles.get_user_summaries(&ids).await {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    target: "recommender",
                    error = ?e,
                    "similar users: profile store unavailable"
                );
                Default::default()
            }
        };

        top.into_iter()
            .map(|(user_id, score)| SimilarUser {
                display_info: summaries.remove(&user_id),
                user_id,
                score,
            })
            .collect()
    }

    async fn build_profile_within(&self, user_id: &str, timeout: Duration) -> InterestProfile {
        match tokio::time::timeout(timeout, self.build_profile(user_id)).await {
            Ok(p) => p,
            Err(_) => {
                warn!(target: "recommender", user_id, "profile: timed out, using empty profile");
                InterestProfile::default()
            }
        }
    }

    async fn persist(
        &self,
        user_id: &str,
        items: &[ScoredCandidate],
        timeout: Duration,
    ) -> Result<()> {
        let rows: Vec<RecommendationRow> = items.iter().map(RecommendationRow::from).collect();
        tokio::time::timeout(timeout, self.sink.append_recommendations(user_id, &rows))
            .await
            .map_err(|_| anyhow!("append timed out after {}ms", timeout.as_millis()))?
            .context("appending recommendations")?;

        if let Some(keep) = self.cfg.fusion.keep_batches {
            match self.sink.prune_recommendations(user_id, keep).await {
                Ok(removed) => {
                    debug!(target: "recommender", user_id, removed, keep, "pruned old batches")
                }
                Err(e) => {
                    warn!(target: "recommender", error = ?e, user_id, "pruning old batches failed")
                }
            }
        }
        Ok(())
    }
}

/// Await a scorer under `limit`; errors and timeouts become an empty list.
async fn fail_soft<F>(
    source: Source,
    user_id: &str,
    limit: Duration,
    fut: F,
) -> Vec<ScoredCandidate>
where
    F: Future<Output = Result<Vec<ScoredCandidate>>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(v)) => {
            counter!(CANDIDATES_TOTAL, "source" => source.as_str()).increment(v.len() as u64);
            debug!(
                target: "recommender",
                source = source.as_str(),
                user_id,
                n = v.len(),
                "scorer done"
            );
            v
        }
        Ok(Err(e)) => {
            warn!(
                target: "recommender",
                source = source.as_str(),
                user_id,
                error = ?e,
                "scorer failed, treating as empty"
            );
            counter!(SCORER_FAILURES_TOTAL, "source" => source.as_str(), "cause" => "error")
                .increment(1);
            Vec::new()
        }
        Err(_) => {
            warn!(
                target: "recommender",
                source = source.as_str(),
                user_id,
                timeout_ms = limit.as_millis() as u64,
                "scorer timed out, treating as empty"
            );
            counter!(SCORER_FAILURES_TOTAL, "source" => source.as_str(), "cause" => "timeout")
                .increment(1);
            Vec::new()
        }
    }
}
