// src/scoring/peers.rs
//! Collaborative filtering: find owners whose public items overlap the user's
//! own tags, then surface those owners' items.
//!
//! An owner's score is the **sum** of Jaccard similarities over all of their
//! overlapping items, so many moderate matches can outrank one strong match.
//! Every item of a top owner inherits that owner's aggregate score.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};

use crate::config::PeersConfig;
use crate::model::{ContentItem, ScoredCandidate};
use crate::similarity::jaccard;
use crate::store::{ContentStore, Exclusion};

/// Owners ranked by accumulated similarity, plus the candidate items they own.
#[derive(Debug, Clone, Default)]
pub struct PeerRanking {
    /// `(owner_id, score)`, score descending, ties in first-encounter order.
    pub owners: Vec<(String, f64)>,
    /// Candidate items in store order.
    pub items: Vec<ContentItem>,
}

/// Rank other users by tag overlap with `user_id`'s own items.
///
/// Shared by recommendation scoring and the similar-users lookup so both
/// always agree on owner order.
pub async fn rank_peers(
    store: &dyn ContentStore,
    user_id: &str,
    cfg: &PeersConfig,
) -> Result<PeerRanking> {
    let own = store
        .list_own_items(user_id, cfg.own_items_limit)
        .await
        .context("peers: listing own items")?;

    let user_tags: HashSet<&str> = own
        .iter()
        .flat_map(|it| it.tags.iter().map(String::as_str))
        .collect();
    if user_tags.is_empty() {
        return Ok(PeerRanking::default());
    }

    let query_tags: Vec<String> = user_tags.iter().map(|t| t.to_string()).collect();
    let items = store
        .list_public_items_by_tag_overlap(
            &query_tags,
            &Exclusion::Owner(user_id.to_string()),
            cfg.candidate_limit,
        )
        .await
        .context("peers: listing overlapping items")?;

    let owners = owner_scores(user_id, &user_tags, &items);
    Ok(PeerRanking { owners, items })
}

/// Sum per-owner Jaccard similarity, ranked descending (ties by first encounter).
fn owner_scores(
    user_id: &str,
    user_tags: &HashSet<&str>,
    items: &[ContentItem],
) -> Vec<(String, f64)> {
    let mut owners: Vec<(String, f64)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for it in items {
        // the store query already excludes the user; keep the invariant locally too
        if it.owner_id == user_id {
            continue;
        }
        let item_tags: HashSet<&str> = it.tags.iter().map(String::as_str).collect();
        let sim = jaccard(user_tags, &item_tags);
        if sim <= 0.0 {
            continue;
        }
        match slot.get(it.owner_id.as_str()) {
            Some(&i) => owners[i].1 += sim,
            None => {
                slot.insert(it.owner_id.as_str(), owners.len());
                owners.push((it.owner_id.clone(), sim));
            }
        }
    }

    owners.sort_by(|a, b| b.1.total_cmp(&a.1));
    owners
}

/// Score candidates from the top similar owners.
pub async fn score_by_peers(
    store: &dyn ContentStore,
    user_id: &str,
    limit: usize,
    cfg: &PeersConfig,
) -> Result<Vec<ScoredCandidate>> {
    let ranking = rank_peers(store, user_id, cfg).await?;
    Ok(candidates_from_ranking(&ranking, limit, cfg))
}

/// Emit items of the top owners in owner-rank order, truncated without re-sorting.
pub fn candidates_from_ranking(
    ranking: &PeerRanking,
    limit: usize,
    cfg: &PeersConfig,
) -> Vec<ScoredCandidate> {
    let mut out = Vec::new();
    for (owner, owner_score) in ranking.owners.iter().take(cfg.top_users) {
        let score = owner_score * cfg.weight;
        for it in ranking.items.iter().filter(|it| it.owner_id == *owner) {
            out.push(
                ScoredCandidate::for_item(it, score, "Shared by someone with similar interests")
                    .with_metadata(serde_json::json!({
                        "source": "peers",
                        "owner_id": owner,
                        "owner_similarity": owner_score,
                    })),
            );
        }
    }
    out.truncate(limit);
    out
}
