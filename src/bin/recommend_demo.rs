//! Demo that runs the engine against a JSON catalog and prints the results.
//!
//! Usage: `recommend_demo [catalog.json] [user_id] [limit]`
//! Defaults: `fixtures/demo_catalog.json`, `u1`, config `fusion.default_limit`.
//! Set `RECOMMENDER_PRINT_METRICS=1` to dump Prometheus text at the end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use hybrid_recommender::metrics::Metrics;
use hybrid_recommender::{
    logging, EngineConfig, InMemoryCatalog, RecommendationEngine, RecommendationHistory,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    logging::init();

    let mut args = std::env::args().skip(1);
    let catalog_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("fixtures/demo_catalog.json"));
    let user_id = args.next().unwrap_or_else(|| "u1".to_string());

    let cfg = EngineConfig::load_default()?;
    let limit = match args.next() {
        Some(s) => s.parse::<usize>().context("limit must be a non-negative integer")?,
        None => cfg.fusion.default_limit,
    };

    let metrics = if std::env::var("RECOMMENDER_PRINT_METRICS").ok().as_deref() == Some("1") {
        Some(Metrics::init(cfg.fusion.scorer_timeout_ms)?)
    } else {
        None
    };

    let catalog = Arc::new(InMemoryCatalog::load_from_file(&catalog_path)?);
    let history = Arc::new(RecommendationHistory::default());
    let engine = RecommendationEngine::new(catalog.clone(), catalog, history.clone())
        .with_config(cfg);

    let batch = engine.compute_recommendations_detailed(&user_id, limit).await;
    println!("{}", serde_json::to_string_pretty(&batch)?);

    let similar = engine.get_similar_users(&user_id, 5).await;
    println!("{}", serde_json::to_string_pretty(&similar)?);

    tracing::info!(stored_batches = history.len()?, "recommend-demo done");

    if let Some(m) = metrics {
        println!("{}", m.render());
    }
    Ok(())
}
