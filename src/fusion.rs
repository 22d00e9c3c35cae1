//! # Fusion
//! Pure, testable merge logic: concatenate source lists in priority order,
//! drop later duplicates, sort by score, truncate. No I/O.
//!
//! Policy: the first occurrence of a `(kind, id)` key wins regardless of score,
//! so peer results shadow content results, which shadow trending results.
//! Scores from different sources are compared as-is (no calibration).

use std::collections::HashSet;

use crate::model::ScoredCandidate;

/// Keep the first candidate seen for each `(kind, id)`, preserving order.
pub fn dedup_first_wins<I>(lists: I) -> Vec<ScoredCandidate>
where
    I: IntoIterator<Item = Vec<ScoredCandidate>>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for c in lists.into_iter().flatten() {
        if seen.insert((c.kind, c.id.clone())) {
            out.push(c);
        }
    }
    out
}

/// Stable sort by score (desc), then truncate to `limit`.
pub fn rank_and_truncate(mut items: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
    items.truncate(limit);
    items
}

/// Full fusion step: peers → content → trending, dedup, rank, truncate.
pub fn fuse(
    peers: Vec<ScoredCandidate>,
    content: Vec<ScoredCandidate>,
    trending: Vec<ScoredCandidate>,
    limit: usize,
) -> Vec<ScoredCandidate> {
    rank_and_truncate(dedup_first_wins([peers, content, trending]), limit)
}
