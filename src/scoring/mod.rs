// src/scoring/mod.rs
//! The three independent scorers. Each returns `anyhow::Result`; the engine
//! turns errors into empty lists so one failing source never aborts the others.

pub mod content;
pub mod peers;
pub mod trending;

pub use content::score_by_content;
pub use peers::{rank_peers, score_by_peers, PeerRanking};
pub use trending::score_by_trending;
