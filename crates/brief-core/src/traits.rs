use async_trait::async_trait;
use serde_json::Value;

use crate::{BriefError, RunClock, Snapshot};

/// A fetchable market topic. Each maps to one top-level Snapshot field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Nifty,
    Vix,
    News,
    Gift,
    Crude,
    Inr,
    FiiDii,
    Pivot,
    Oi,
    GlobalMarkets,
    Sentiment,
    Perspectives,
}

impl Topic {
    /// Refreshed on every run.
    pub const INTRADAY: [Topic; 3] = [Topic::Nifty, Topic::Vix, Topic::News];

    /// Refreshed only by the morning run, carried forward otherwise.
    pub const MORNING: [Topic; 9] = [
        Topic::Gift,
        Topic::Crude,
        Topic::Inr,
        Topic::FiiDii,
        Topic::Pivot,
        Topic::Oi,
        Topic::GlobalMarkets,
        Topic::Sentiment,
        Topic::Perspectives,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Topic::Nifty => "nifty",
            Topic::Vix => "vix",
            Topic::News => "news",
            Topic::Gift => "gift",
            Topic::Crude => "crude",
            Topic::Inr => "inr",
            Topic::FiiDii => "fiidii",
            Topic::Pivot => "pivot",
            Topic::Oi => "oi",
            Topic::GlobalMarkets => "global_markets",
            Topic::Sentiment => "sentiment",
            Topic::Perspectives => "perspectives",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Topic::Nifty => "Nifty Live",
            Topic::Vix => "India VIX",
            Topic::News => "Breaking News",
            Topic::Gift => "Gift Nifty",
            Topic::Crude => "Crude Oil",
            Topic::Inr => "USD/INR",
            Topic::FiiDii => "FII/DII",
            Topic::Pivot => "Pivots",
            Topic::Oi => "OI/Max Pain",
            Topic::GlobalMarkets => "Global Markets",
            Topic::Sentiment => "Sentiment",
            Topic::Perspectives => "3-View Analysis",
        }
    }
}

/// Free-text commentary requested alongside the structured topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrativeKind {
    /// Sectioned pre-open brief, written by the morning run.
    MorningBrief,
    /// Short commentary on how the day is tracking, written by later runs.
    IntradayUpdate,
}

/// Supplier of raw market data for one run.
///
/// Implementations return the topic's JSON as received; decoding into typed
/// records and falling back to defaults happens at the merge boundary.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_topic(&self, topic: Topic, clock: &RunClock) -> Result<Value, BriefError>;

    /// `context` is the snapshot assembled so far for this run.
    async fn narrate(
        &self,
        kind: NarrativeKind,
        context: &Snapshot,
        clock: &RunClock,
    ) -> Result<String, BriefError>;

    fn name(&self) -> &str;
}
