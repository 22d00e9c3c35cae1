//! Set-similarity helpers shared by the scorers.
//!
//! Tags are compared case-sensitively, without stemming; duplicates inside a
//! tag list count once.

use std::collections::HashSet;
use std::hash::Hash;

/// Jaccard similarity `|A∩B| / |A∪B|`; `0.0` when both sets are empty.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        return 0.0;
    }
    inter as f64 / union as f64
}

/// Jaccard over tag slices (duplicates collapsed).
pub fn jaccard_tags(a: &[String], b: &[String]) -> f64 {
    let sa: HashSet<&str> = a.iter().map(String::as_str).collect();
    let sb: HashSet<&str> = b.iter().map(String::as_str).collect();
    jaccard(&sa, &sb)
}

/// Tags of `item_tags` that appear in `profile_tags`, in item order, no duplicates.
pub fn matching_tags<'a>(item_tags: &'a [String], profile_tags: &[String]) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    item_tags
        .iter()
        .map(String::as_str)
        .filter(|t| profile_tags.iter().any(|p| p == t))
        .filter(|t| seen.insert(*t))
        .collect()
}

/// Recall against a fixed interest set: `|B ∩ P| / |P|`. Not symmetric.
pub fn profile_coverage(item_tags: &[String], profile_tags: &[String]) -> f64 {
    if profile_tags.is_empty() {
        return 0.0;
    }
    matching_tags(item_tags, profile_tags).len() as f64 / profile_tags.len() as f64
}
