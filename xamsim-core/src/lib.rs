//! xamsim-core: Core types for detector hit clustering.
//!
//! This crate provides the data model shared by the clustering engine,
//! the event orchestrator, and the I/O layer: hits, clusters, and the
//! per-collection threshold table.
//!

pub mod clustering;
pub mod error;
pub mod hit;
pub mod thresholds;

pub use clustering::{Cluster, ClusteringConfig, ClusteringStatistics, MergeStrategy};
pub use error::{Error, Result, ThresholdKind};
pub use hit::{earliest_time, normalize_times, Hit, InteractionProcess, Position};
pub use thresholds::{ClusterThresholds, ThresholdPair};
