//! xamsim-io: File I/O for xamsim.
//!
//! This crate provides:
//! - **Geometry** - active volumes and their clustering thresholds
//! - **Hit streams** - JSON-lines event input
//! - **Writers** - cluster rows (CSV or binary), per-collection summaries,
//!   and per-event rows
//!

mod error;
pub mod geometry;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use geometry::{DetectorSetup, GeometryConfig, VolumeConfig};
pub use reader::{read_hit_stream, HitStreamReader};
pub use writer::{
    ClusterRowWriter, EventWriter, RowFormat, SummaryWriter, CLUSTER_CSV_HEADER,
    CLUSTER_RECORD_SIZE, EVENT_CSV_HEADER, SUMMARY_CSV_HEADER,
};
