// src/config/mod.rs
pub mod engine;

pub use engine::{
    ContentConfig, EngineConfig, FusionConfig, PeersConfig, ProfileConfig, TrendingConfig,
};
