//! # Data model
//! Plain data shared by the scorers, the orchestrator and the stores.
//!
//! Scores are `f64`, non-negative and **not** normalised across sources:
//! peer and content scores stay below their weights for typical inputs, while
//! trending scores grow with the raw like count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A content item as exposed by the content store. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Tags are compared case-sensitively; duplicates count once.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub like_count: u64,
}

fn default_public() -> bool {
    true
}

/// Interest signature derived from a user's own content. Rebuilt per call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InterestProfile {
    /// Most frequent first, ties in encounter order.
    pub tags: Vec<String>,
    /// Reserved signal, not consumed by any scorer yet.
    pub followed_user_ids: Vec<String>,
    /// Reserved, always zero.
    pub avg_engagement: f64,
}

impl InterestProfile {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.followed_user_ids.is_empty()
    }
}

/// What a candidate points at. Only `ContentItem` has a producer today; the
/// remaining variants are part of the public result shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKind {
    ContentItem,
    Collection,
    User,
    Tag,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentItem => "content-item",
            Self::Collection => "collection",
            Self::User => "user",
            Self::Tag => "tag",
        }
    }
}

/// Which scorer produced a candidate. Order of the variants is the dedup priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Peers,
    Content,
    Trending,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Peers => "peers",
            Self::Content => "content",
            Self::Trending => "trending",
        }
    }
}

/// One scored suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub id: String,
    pub kind: CandidateKind,
    pub title: String,
    pub score: f64,
    pub reason: String,
    /// Free-form side data (source url, matched tags, like count, ...).
    pub metadata: serde_json::Value,
}

impl ScoredCandidate {
    /// Candidate for a content item, carrying its url in `metadata`.
    pub fn for_item(item: &ContentItem, score: f64, reason: impl Into<String>) -> Self {
        Self {
            id: item.id.clone(),
            kind: CandidateKind::ContentItem,
            title: item.title.clone(),
            score,
            reason: reason.into(),
            metadata: serde_json::json!({ "url": item.url }),
        }
    }

    /// Merge extra fields into `metadata` (object keys overwrite).
    pub fn with_metadata(mut self, extra: serde_json::Value) -> Self {
        if let (Some(dst), serde_json::Value::Object(src)) = (self.metadata.as_object_mut(), extra)
        {
            dst.extend(src);
        }
        self
    }

    /// Composite dedup key.
    pub fn key(&self) -> (CandidateKind, &str) {
        (self.kind, self.id.as_str())
    }
}

/// Display data for a user, supplied by the profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A peer ranked by accumulated tag similarity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarUser {
    pub user_id: String,
    /// Sum of Jaccard similarities over the peer's overlapping items.
    pub score: f64,
    pub display_info: Option<UserSummary>,
}

/// Row written to the recommendation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRow {
    pub kind: CandidateKind,
    pub id: String,
    pub score: f64,
    /// `score * 100`, a linear rescale rather than a probability.
    pub confidence_percent: f64,
    pub reason: String,
}

impl From<&ScoredCandidate> for RecommendationRow {
    fn from(c: &ScoredCandidate) -> Self {
        Self {
            kind: c.kind,
            id: c.id.clone(),
            score: c.score,
            confidence_percent: c.score * 100.0,
            reason: c.reason.clone(),
        }
    }
}

/// Per-source candidate counts before dedup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub peers: usize,
    pub content: usize,
    pub trending: usize,
}

/// Detailed outcome of one engine run.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationBatch {
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    pub items: Vec<ScoredCandidate>,
    pub sources: SourceCounts,
    /// Set when the append to the recommendation store failed. Non-fatal.
    pub persist_error: Option<String>,
}
