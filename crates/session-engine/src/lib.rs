//! Per-run state transitions for the market brief: which topics are fetched
//! fresh, what is carried forward from the previous snapshot, and the derived
//! accuracy, pivot-alert and timeline bookkeeping.

pub mod accuracy;
pub mod fetch;
pub mod merge;
pub mod pipeline;
pub mod pivots;
pub mod store;
pub mod timeline;

#[cfg(test)]
mod tests;

pub use fetch::{collect_fresh, fetch_or_default, Fetched, FreshData, IntradayData, MorningData};
pub use merge::merge_snapshot;
pub use pipeline::{BriefPipeline, RunOutcome};
pub use store::SnapshotStore;
