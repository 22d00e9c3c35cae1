// src/config/engine.rs
//! Tunable limits and weights for the engine, loaded from TOML.
//!
//! Resolution order in [`EngineConfig::load_default`]:
//! 1) `$RECOMMENDER_CONFIG_PATH` (must exist)
//! 2) `config/recommender.toml` (if present)
//! 3) built-in defaults
//!
//! `$RECOMMENDER_SCORER_TIMEOUT_MS` overrides `fusion.scorer_timeout_ms` afterwards.
//! Every field is optional in the file; missing ones keep their default.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "RECOMMENDER_CONFIG_PATH";
pub const ENV_SCORER_TIMEOUT_MS: &str = "RECOMMENDER_SCORER_TIMEOUT_MS";
pub const DEFAULT_CONFIG_PATH: &str = "config/recommender.toml";
/// Ten years; anything longer is not a trending window.
pub const MAX_WINDOW_HOURS: f64 = 87_600.0;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub profile: ProfileConfig,
    pub peers: PeersConfig,
    pub content: ContentConfig,
    pub trending: TrendingConfig,
    pub fusion: FusionConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub own_items_limit: usize,
    pub max_tags: usize,
    pub follows_limit: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            own_items_limit: 100,
            max_tags: 20,
            follows_limit: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PeersConfig {
    pub own_items_limit: usize,
    pub candidate_limit: usize,
    pub top_users: usize,
    pub weight: f64,
}

impl Default for PeersConfig {
    fn default() -> Self {
        Self {
            own_items_limit: 50,
            candidate_limit: 100,
            top_users: 5,
            weight: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// How many own item ids are read to build the exclusion set.
    pub exclusion_limit: usize,
    pub candidate_limit: usize,
    pub weight: f64,
    /// Matching tags named in the reason string.
    pub reason_tags: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            exclusion_limit: 100,
            candidate_limit: 50,
            weight: 0.7,
            reason_tags: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendingConfig {
    pub window_hours: f64,
    pub candidate_limit: usize,
    pub weight: f64,
    pub like_weight: f64,
    pub recency_weight: f64,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            window_hours: 168.0,
            candidate_limit: 20,
            weight: 0.6,
            like_weight: 0.5,
            recency_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub default_limit: usize,
    pub peers_limit: usize,
    pub content_limit: usize,
    pub trending_limit: usize,
    pub scorer_timeout_ms: u64,
    /// When set, older batches beyond this count are pruned after each append.
    pub keep_batches: Option<usize>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            peers_limit: 10,
            content_limit: 10,
            trending_limit: 5,
            scorer_timeout_ms: 2_000,
            keep_batches: None,
        }
    }
}

impl FusionConfig {
    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_millis(self.scorer_timeout_ms)
    }
}

impl EngineConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: EngineConfig = toml::from_str(s).context("parsing recommender config")?;
        cfg.validated()
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading recommender config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks (see module docs).
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };

        if let Some(ms) = parse_timeout_env(std::env::var(ENV_SCORER_TIMEOUT_MS).ok()) {
            cfg.fusion.scorer_timeout_ms = ms;
        }
        Ok(cfg)
    }

    fn validated(self) -> Result<Self> {
        for (name, w) in [
            ("peers.weight", self.peers.weight),
            ("content.weight", self.content.weight),
            ("trending.weight", self.trending.weight),
            ("trending.like_weight", self.trending.like_weight),
            ("trending.recency_weight", self.trending.recency_weight),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(anyhow!("{name} must be a finite, non-negative number"));
            }
        }
        let wh = self.trending.window_hours;
        if !wh.is_finite() || wh <= 0.0 || wh > MAX_WINDOW_HOURS {
            return Err(anyhow!(
                "trending.window_hours must be in (0, {MAX_WINDOW_HOURS}]"
            ));
        }
        Ok(self)
    }
}

fn parse_timeout_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
}
