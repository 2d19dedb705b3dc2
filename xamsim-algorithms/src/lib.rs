//! xamsim-algorithms: Hit clustering for detector simulations.
//!
//! This crate provides:
//! - **Seeded clustering** - Compton/photoelectric hits seed clusters, the
//!   rest are assigned greedily, then close clusters are merged
//! - **Event processing** - per-collection thresholds, output rows, and
//!   parallel processing of many events
//!
#![warn(missing_docs)]

mod event;
mod processing;
mod seeded;

pub use event::{ClusterRow, CollectionSummary, EventHits, EventRecord, RunSummary};
pub use processing::{cluster_rows, summarize, CollectionRegistry, EventProcessor};
pub use seeded::{
    cluster_hits, merge_single_sweep, merge_transitive, ClusterSet, SeededClustering, SeededState,
};

// Re-export core clustering types
pub use xamsim_core::clustering::{Cluster, ClusteringConfig, ClusteringStatistics, MergeStrategy};
pub use xamsim_core::thresholds::{ClusterThresholds, ThresholdPair};
