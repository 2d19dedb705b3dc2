//! Per-event input and output records.

use std::collections::BTreeMap;
use xamsim_core::hit::{Hit, Position};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raw hits of one simulated event, grouped by collection name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EventHits {
    /// Event number.
    pub event_id: u64,
    /// Event weight, copied onto every output row.
    pub weight: f64,
    /// Generator-defined event class (0 when unset).
    pub event_type: i32,
    /// Primary vertex (mm), if known.
    pub primary_vertex: Option<Position>,
    /// Hits per sensitive collection.
    pub collections: BTreeMap<String, Vec<Hit>>,
}

impl Default for EventHits {
    fn default() -> Self {
        Self {
            event_id: 0,
            weight: 1.0,
            event_type: 0,
            primary_vertex: None,
            collections: BTreeMap::new(),
        }
    }
}

impl EventHits {
    /// Creates an event with unit weight and no hits.
    #[must_use]
    pub fn new(event_id: u64) -> Self {
        Self {
            event_id,
            ..Default::default()
        }
    }

    /// Sets the event weight.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the event class and primary vertex.
    #[must_use]
    pub fn with_primary(mut self, event_type: i32, vertex: Position) -> Self {
        self.event_type = event_type;
        self.primary_vertex = Some(vertex);
        self
    }

    /// Adds hits to a collection.
    #[must_use]
    pub fn with_hits(mut self, collection: impl Into<String>, hits: Vec<Hit>) -> Self {
        self.collections
            .entry(collection.into())
            .or_default()
            .extend(hits);
        self
    }

    /// Hits recorded for a collection.
    #[must_use]
    pub fn hits_for(&self, collection: &str) -> Option<&[Hit]> {
        self.collections.get(collection).map(Vec::as_slice)
    }

    /// Total number of hits across collections.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }
}

/// One output row per cluster with energy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterRow {
    /// Event number.
    pub event_id: u64,
    /// Cluster energy (keV).
    pub energy_kev: f64,
    /// Centroid X (mm).
    pub x: f64,
    /// Centroid Y (mm).
    pub y: f64,
    /// Centroid Z (mm).
    pub z: f64,
    /// Collection the cluster came from.
    pub collection_id: i32,
    /// Event weight.
    pub weight: f64,
}

/// Per-collection totals for one event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionSummary {
    /// Collection tag.
    pub collection_id: i32,
    /// Collection name.
    pub name: String,
    /// Hits clustered.
    pub nhits: usize,
    /// Energy summed over clusters with energy (keV).
    pub edet_kev: f64,
    /// Clusters with energy.
    pub ndet: usize,
    /// Photoelectric seed hits.
    pub nphot: usize,
    /// Compton seed hits.
    pub ncomp: usize,
    /// All clusters, including those without energy.
    pub nclusters: usize,
}

/// Everything produced for one event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventRecord {
    /// Event number.
    pub event_id: u64,
    /// Event weight.
    pub weight: f64,
    /// Generator-defined event class.
    pub event_type: i32,
    /// Primary vertex (mm), if known.
    pub primary_vertex: Option<Position>,
    /// Cluster rows, collection by collection.
    pub rows: Vec<ClusterRow>,
    /// One summary per registered collection.
    pub summaries: Vec<CollectionSummary>,
}

impl EventRecord {
    /// Total deposited energy over all collections (keV).
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.summaries.iter().map(|s| s.edet_kev).sum()
    }
}

/// Totals over a run of events.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    /// Events processed.
    pub events: usize,
    /// Hits clustered.
    pub hits: usize,
    /// Clusters with energy.
    pub clusters: usize,
    /// Events with at least one cluster with energy.
    pub events_with_clusters: usize,
    /// Deposited energy (keV).
    pub energy_kev: f64,
}

impl RunSummary {
    /// Adds one event.
    pub fn accumulate(&mut self, record: &EventRecord) {
        self.events += 1;
        self.hits += record.summaries.iter().map(|s| s.nhits).sum::<usize>();
        self.clusters += record.rows.len();
        if !record.rows.is_empty() {
            self.events_with_clusters += 1;
        }
        self.energy_kev += record.total_energy();
    }
}

impl<'a> FromIterator<&'a EventRecord> for RunSummary {
    fn from_iter<I: IntoIterator<Item = &'a EventRecord>>(iter: I) -> Self {
        let mut summary = Self::default();
        for record in iter {
            summary.accumulate(record);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_event_hits_builder() {
        let event = EventHits::new(7)
            .with_weight(0.5)
            .with_hits("LXeCollection", vec![Hit::default(), Hit::default()])
            .with_hits("LXeCollection", vec![Hit::default()])
            .with_hits("GXeCollection", vec![Hit::default()]);

        assert_eq!(event.event_id, 7);
        assert_relative_eq!(event.weight, 0.5);
        assert_relative_eq!(EventHits::new(1).weight, 1.0);
        assert_eq!(EventHits::new(1).event_type, 0);

        let typed = EventHits::new(2).with_primary(3, Position::new(1.0, 2.0, 3.0));
        assert_eq!(typed.event_type, 3);
        assert_eq!(typed.primary_vertex, Some(Position::new(1.0, 2.0, 3.0)));
        assert_eq!(event.hits_for("LXeCollection").map(<[Hit]>::len), Some(3));
        assert!(event.hits_for("Other").is_none());
        assert_eq!(event.hit_count(), 4);
    }

    #[test]
    fn test_run_summary() {
        let row = ClusterRow {
            event_id: 0,
            energy_kev: 10.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            collection_id: 0,
            weight: 0.0,
        };
        let summary = CollectionSummary {
            nhits: 4,
            edet_kev: 10.0,
            ndet: 1,
            nclusters: 2,
            ..Default::default()
        };
        let hit_event = EventRecord {
            rows: vec![row],
            summaries: vec![summary],
            ..Default::default()
        };
        let empty_event = EventRecord::default();

        let run: RunSummary = [&hit_event, &empty_event, &hit_event].into_iter().collect();
        assert_eq!(run.events, 3);
        assert_eq!(run.hits, 8);
        assert_eq!(run.clusters, 2);
        assert_eq!(run.events_with_clusters, 2);
        assert_relative_eq!(run.energy_kev, 20.0);
    }
}
