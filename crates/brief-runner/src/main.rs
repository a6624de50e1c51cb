use std::sync::Arc;

use anyhow::Result;
use brief_core::{MarketDataSource, RunClock};
use gemini_client::GeminiClient;
use notification_service::{BriefDigest, NotificationConfig, NotificationService};
use session_engine::{BriefPipeline, SnapshotStore};

mod config;

use config::BriefConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Panic hook: log panic info before crashing
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    // 2. Configuration is the only fatal failure
    let config = BriefConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Model: {} ({} req/min)", config.gemini_model, config.gemini_rate_limit);
    tracing::info!("  Snapshot: {}", config.snapshot_path.display());
    tracing::info!("  Broadcast: {}", config.broadcast_enabled);

    // 3. One clock for the whole run
    let clock = RunClock::now();
    tracing::info!(
        "Nifty brief run at {} {} IST ({})",
        clock.date_label(),
        clock.time_label(),
        clock.session().label()
    );

    // 4. Previous snapshot
    let store = SnapshotStore::new(&config.snapshot_path);
    let previous = store.load();

    // 5. Fetch, merge, narrate
    let source: Arc<dyn MarketDataSource> = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_rate_limit,
    ));
    tracing::info!("Market data source: {}", source.name());

    let pipeline = BriefPipeline::new(source);
    let outcome = pipeline.run(&previous, &clock).await;

    if let Some(accuracy) = &outcome.snapshot.accuracy {
        tracing::info!(
            "Morning call {}: {} ({} pts)",
            accuracy.morning_bias,
            accuracy.verdict,
            accuracy.move_pts
        );
    }
    for alert in &outcome.snapshot.pivot_alerts {
        tracing::info!("Pivot alert: {} {} {}", alert.kind, alert.level, alert.value.grouped(2));
    }

    // 6. Persist; an unsaved snapshot is never broadcast
    if let Err(e) = store.save(&outcome.snapshot) {
        tracing::warn!("{} - skipping broadcast", e);
        return Ok(());
    }

    // 7. Broadcast
    if !config.broadcast_enabled {
        tracing::info!("Broadcast disabled, done");
        return Ok(());
    }

    let notifier = NotificationService::new(&NotificationConfig::from_env());
    let digest = BriefDigest::from_snapshot(&outcome.snapshot, config.dashboard_url.as_deref());
    let delivered = notifier.broadcast(&digest).await;
    tracing::info!(
        "Run complete: {} channel(s) delivered, {} topic(s) degraded",
        delivered,
        outcome.degraded.len()
    );

    Ok(())
}
