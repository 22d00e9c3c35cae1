// src/scoring/content.rs
//! Content-based filtering: other users' public items whose tags overlap the
//! interest profile.
//!
//! score = |item ∩ profile| / |profile| * weight
//!
//! The denominator is the profile size, so this is a recall-style ratio
//! against the user's interests rather than a symmetric similarity.

use anyhow::{Context, Result};

use crate::config::ContentConfig;
use crate::model::{InterestProfile, ScoredCandidate};
use crate::similarity::matching_tags;
use crate::store::{ContentStore, Exclusion};

pub async fn score_by_content(
    store: &dyn ContentStore,
    user_id: &str,
    profile: &InterestProfile,
    limit: usize,
    cfg: &ContentConfig,
) -> Result<Vec<ScoredCandidate>> {
    if profile.tags.is_empty() {
        return Ok(Vec::new());
    }

    let own_ids: Vec<String> = store
        .list_own_items(user_id, cfg.exclusion_limit)
        .await
        .context("content: listing own item ids")?
        .into_iter()
        .map(|it| it.id)
        .collect();

    let items = store
        .list_public_items_by_tag_overlap(
            &profile.tags,
            &Exclusion::Ids(own_ids),
            cfg.candidate_limit,
        )
        .await
        .context("content: listing overlapping items")?;
    // the id exclusion is capped at `exclusion_limit`; ownership is checked here as well
    let items: Vec<_> = items
        .into_iter()
        .filter(|it| it.owner_id != user_id)
        .collect();

    let denom = profile.tags.len() as f64;
    let mut out: Vec<ScoredCandidate> = items
        .iter()
        .filter_map(|it| {
            let matching = matching_tags(&it.tags, &profile.tags);
            if matching.is_empty() {
                return None;
            }
            let score = matching.len() as f64 / denom * cfg.weight;
            let named = matching
                .iter()
                .take(cfg.reason_tags)
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            Some(
                ScoredCandidate::for_item(it, score, format!("Matches your interests: {named}"))
                    .with_metadata(serde_json::json!({
                        "source": "content",
                        "matched_tags": matching,
                    })),
            )
        })
        .collect();

    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out.truncate(limit);
    Ok(out)
}
