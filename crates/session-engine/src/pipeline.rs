use brief_core::{MarketDataSource, NarrativeKind, RunClock, Snapshot, Topic, DEFAULT_BRIEF};
use std::sync::Arc;

use crate::fetch::collect_fresh;
use crate::merge::merge_snapshot;

/// Output of one scheduled run, before persistence.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub snapshot: Snapshot,
    /// Topics that fell back to their defaults.
    pub degraded: Vec<Topic>,
}

/// Fetch, merge and narrate one run.
pub struct BriefPipeline {
    source: Arc<dyn MarketDataSource>,
}

impl BriefPipeline {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    /// Never fails: every fetch or narrative problem degrades to defaults.
    pub async fn run(&self, previous: &Snapshot, clock: &RunClock) -> RunOutcome {
        let session = clock.session();
        tracing::info!(
            "Session: {} | {} {} IST",
            session,
            clock.date_label(),
            clock.time_label()
        );

        let fresh = collect_fresh(self.source.as_ref(), session, clock).await;
        let degraded = fresh.degraded();

        let mut snapshot = merge_snapshot(previous, clock, fresh);

        if session.is_morning() {
            snapshot.brief = self
                .narrate(NarrativeKind::MorningBrief, &snapshot, clock)
                .await
                .unwrap_or_else(|| DEFAULT_BRIEF.to_string());
        } else {
            snapshot.intraday_analysis = self
                .narrate(NarrativeKind::IntradayUpdate, &snapshot, clock)
                .await;
        }

        if degraded.is_empty() {
            tracing::info!("All topics fetched fresh");
        } else {
            let names: Vec<&str> = degraded.iter().map(|t| t.key()).collect();
            tracing::warn!("{} topic(s) degraded to defaults: {}", names.len(), names.join(", "));
        }

        RunOutcome { snapshot, degraded }
    }

    async fn narrate(
        &self,
        kind: NarrativeKind,
        context: &Snapshot,
        clock: &RunClock,
    ) -> Option<String> {
        match self.source.narrate(kind, context, clock).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!("{:?} narrative came back empty", kind);
                None
            }
            Err(e) => {
                tracing::warn!("{:?} narrative failed: {}", kind, e);
                None
            }
        }
    }
}
