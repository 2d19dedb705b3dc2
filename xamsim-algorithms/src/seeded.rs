//! Seeded hit clustering.
//!
//! Key characteristics:
//! - Hit times are taken relative to the earliest hit of the batch
//! - Compton and photoelectric hits seed their own clusters first
//! - Remaining hits join the first nearby cluster in creation order
//! - Clusters still close after assignment are merged
//!
//! The merge pass is a single forward sweep by default, so the result can
//! depend on cluster order. [`MergeStrategy::Transitive`] repeats the sweep
//! until nothing merges.

use log::trace;
use xamsim_core::clustering::{Cluster, ClusteringConfig, ClusteringStatistics, MergeStrategy};
use xamsim_core::hit::{earliest_time, Hit, InteractionProcess};
use xamsim_core::thresholds::ThresholdPair;

/// Clusters produced from one hit batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterSet {
    /// Clusters in creation order (after merging).
    pub clusters: Vec<Cluster>,
    /// Earliest hit time of the batch (ns); cluster times are relative to it.
    pub time_origin: f64,
    /// Pass statistics.
    pub statistics: ClusteringStatistics,
}

impl ClusterSet {
    /// Returns the number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns true if no cluster was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Returns an iterator over the clusters.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    /// Total energy over all clusters (keV).
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.clusters.iter().map(|c| c.energy_deposit).sum()
    }
}

/// Reusable per-call buffers.
///
/// Holds the claimed flags and origin-relative times so hits stay
/// untouched. One state per worker thread.
#[derive(Debug, Default)]
pub struct SeededState {
    claimed: Vec<bool>,
    times: Vec<f64>,
}

impl SeededState {
    /// Clears all buffers.
    pub fn reset(&mut self) {
        self.claimed.clear();
        self.times.clear();
    }

    fn prepare(&mut self, hits: &[Hit], origin: f64) {
        self.reset();
        self.claimed.resize(hits.len(), false);
        self.times.extend(hits.iter().map(|hit| hit.time - origin));
    }
}

/// Seeded clustering algorithm.
#[derive(Debug, Clone, Default)]
pub struct SeededClustering {
    config: ClusteringConfig,
}

impl SeededClustering {
    /// Create with custom configuration.
    #[must_use]
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// Returns the algorithm name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        "Seeded"
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Creates an empty state sized for nothing in particular.
    #[must_use]
    pub fn create_state(&self) -> SeededState {
        SeededState::default()
    }

    /// Clusters hits with the configured fallback thresholds.
    pub fn cluster_default(
        &self,
        hits: &[Hit],
        collection_id: i32,
        state: &mut SeededState,
    ) -> ClusterSet {
        self.cluster(hits, &self.config.thresholds, collection_id, state)
    }

    /// Clusters one collection's hits.
    ///
    /// Empty input yields an empty set. Zero or negative thresholds never
    /// match, so every hit ends up in its own cluster.
    pub fn cluster(
        &self,
        hits: &[Hit],
        thresholds: &ThresholdPair,
        collection_id: i32,
        state: &mut SeededState,
    ) -> ClusterSet {
        let Some(time_origin) = earliest_time(hits) else {
            return ClusterSet::default();
        };
        state.prepare(hits, time_origin);

        let mut statistics = ClusteringStatistics {
            hits_processed: hits.len(),
            ..Default::default()
        };

        let mut clusters = seed_clusters(hits, collection_id, state, &mut statistics);
        statistics.seed_clusters = clusters.len();

        assign_remaining(hits, thresholds, collection_id, state, &mut clusters);

        statistics.merges = match self.config.merge {
            MergeStrategy::SingleSweep => merge_single_sweep(&mut clusters, thresholds),
            MergeStrategy::Transitive => merge_transitive(&mut clusters, thresholds),
        };
        statistics.clusters_found = clusters.len();

        trace!(
            "collection {collection_id}: {} hits, {} seeds, {} merges, {} clusters",
            statistics.hits_processed,
            statistics.seed_clusters,
            statistics.merges,
            statistics.clusters_found
        );

        ClusterSet {
            clusters,
            time_origin,
            statistics,
        }
    }
}

fn seed_clusters(
    hits: &[Hit],
    collection_id: i32,
    state: &mut SeededState,
    statistics: &mut ClusteringStatistics,
) -> Vec<Cluster> {
    let mut clusters = Vec::new();
    for (index, hit) in hits.iter().enumerate() {
        match hit.process() {
            InteractionProcess::Compton => statistics.compton_seeds += 1,
            InteractionProcess::Photoelectric => statistics.photoelectric_seeds += 1,
            InteractionProcess::Other => continue,
        }
        clusters.push(Cluster::seed(index, hit, state.times[index], collection_id));
        state.claimed[index] = true;
    }
    clusters
}

fn assign_remaining(
    hits: &[Hit],
    thresholds: &ThresholdPair,
    collection_id: i32,
    state: &mut SeededState,
    clusters: &mut Vec<Cluster>,
) {
    for (index, hit) in hits.iter().enumerate() {
        if state.claimed[index] {
            continue;
        }
        let time = state.times[index];

        // A hit without energy never updates a cluster, even when it is close,
        // and a cluster without energy never attracts one.
        let target = if hit.has_energy() {
            clusters.iter().position(|cluster| {
                !cluster.is_inert()
                    && cluster.collection_id == collection_id
                    && cluster.is_near(&hit.position, time, thresholds)
            })
        } else {
            None
        };

        match target {
            Some(cluster_idx) => clusters[cluster_idx].absorb(index, hit, time),
            None => clusters.push(Cluster::seed(index, hit, time, collection_id)),
        }
        state.claimed[index] = true;
    }
}

/// Merges close clusters in one forward sweep over pairs `(i, j)`, `i < j`.
///
/// After a merge the same `j` is tested again against the grown cluster
/// `i`. Clusters before `i` are never revisited. Clusters without energy
/// take part on neither side. Returns the number of merges performed.
pub fn merge_single_sweep(clusters: &mut Vec<Cluster>, thresholds: &ThresholdPair) -> usize {
    let mut merges = 0;
    let mut i = 0;
    while i < clusters.len() {
        if clusters[i].is_inert() {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < clusters.len() {
            let close = {
                let (a, b) = (&clusters[i], &clusters[j]);
                !b.is_inert()
                    && a.collection_id == b.collection_id
                    && a.is_near(&b.position, b.time, thresholds)
            };
            if close {
                let other = clusters.remove(j);
                clusters[i].merge(other);
                merges += 1;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
    merges
}

/// Repeats [`merge_single_sweep`] until a sweep merges nothing.
pub fn merge_transitive(clusters: &mut Vec<Cluster>, thresholds: &ThresholdPair) -> usize {
    let mut merges = 0;
    loop {
        let merged = merge_single_sweep(clusters, thresholds);
        if merged == 0 {
            return merges;
        }
        merges += merged;
    }
}

/// Clusters hits with the default single-sweep engine.
#[must_use]
pub fn cluster_hits(
    hits: &[Hit],
    spatial_threshold_mm: f64,
    time_threshold_ns: f64,
    collection_id: i32,
) -> ClusterSet {
    let algo = SeededClustering::new(
        ClusteringConfig::new()
            .with_spatial_threshold(spatial_threshold_mm)
            .with_time_threshold(time_threshold_ns),
    );
    let mut state = algo.create_state();
    algo.cluster_default(hits, collection_id, &mut state)
}
