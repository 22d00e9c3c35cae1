//! # Preference profile
//! Derives a compact interest signature from a user's own items.
//!
//! Never fails: a store error is logged and treated like "no data", so the
//! caller always gets a (possibly empty) profile.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::ProfileConfig;
use crate::model::InterestProfile;
use crate::store::ContentStore;

/// Build the interest profile for `user_id`.
pub async fn build_profile(
    store: &dyn ContentStore,
    user_id: &str,
    cfg: &ProfileConfig,
) -> InterestProfile {
    let items = match store.list_own_items(user_id, cfg.own_items_limit).await {
        Ok(v) => v,
        Err(e) => {
            warn!(target: "recommender", error = ?e, user_id, "profile: own items unavailable");
            Vec::new()
        }
    };

    let tags = top_tags(items.iter().flat_map(|it| it.tags.iter()), cfg.max_tags);

    let followed_user_ids = match store.list_follows(user_id, cfg.follows_limit).await {
        Ok(v) => v,
        Err(e) => {
            warn!(target: "recommender", error = ?e, user_id, "profile: follows unavailable");
            Vec::new()
        }
    };

    debug!(
        target: "recommender",
        user_id,
        items = items.len(),
        tags = tags.len(),
        follows = followed_user_ids.len(),
        "profile built"
    );

    InterestProfile {
        tags,
        followed_user_ids,
        avg_engagement: 0.0,
    }
}

/// Rank tags by frequency (desc), ties in first-encounter order, keep `max`.
pub fn top_tags<'a>(tags: impl IntoIterator<Item = &'a String>, max: usize) -> Vec<String> {
    let mut order: Vec<&'a str> = Vec::new();
    let mut freq: HashMap<&'a str, usize> = HashMap::new();
    for t in tags {
        let n = freq.entry(t.as_str()).or_insert(0);
        if *n == 0 {
            order.push(t.as_str());
        }
        *n += 1;
    }

    // stable sort keeps encounter order for equal counts
    order.sort_by(|a, b| freq[b].cmp(&freq[a]));
    order.into_iter().take(max).map(str::to_string).collect()
}
