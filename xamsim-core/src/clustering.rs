//! Cluster types and clustering configuration.
#![allow(clippy::cast_precision_loss)]

use crate::hit::{Hit, Position};
use crate::thresholds::ThresholdPair;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A group of hits believed to come from one physical interaction.
///
/// Members are stored as indices into the hit slice the cluster was built
/// from; the cluster never owns hits.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    /// Running centroid (mm).
    pub position: Position,
    /// Summed energy deposit (keV).
    pub energy_deposit: f64,
    /// Running mean time (ns, relative to the batch time origin).
    pub time: f64,
    /// Indices of member hits, in insertion order.
    pub hits: Vec<usize>,
    /// Tag of the hit collection the cluster was built from.
    pub collection_id: i32,
    /// Number of energy-carrying members behind `position` and `time`.
    weight: usize,
}

impl Cluster {
    /// Creates a singleton cluster from one hit.
    ///
    /// `time` is the hit time already expressed relative to the batch origin.
    #[must_use]
    pub fn seed(index: usize, hit: &Hit, time: f64, collection_id: i32) -> Self {
        Self {
            position: hit.position,
            energy_deposit: hit.energy_deposit,
            time,
            hits: vec![index],
            collection_id,
            weight: usize::from(hit.has_energy()),
        }
    }

    /// Adds a hit, updating the running centroid, time, and energy.
    ///
    /// Hits without energy join the member list but leave the statistics
    /// untouched.
    pub fn absorb(&mut self, index: usize, hit: &Hit, time: f64) {
        if hit.has_energy() {
            let w = self.weight as f64;
            self.position = self.position.weighted_mean(w, &hit.position, 1.0);
            self.time = weighted_time(self.time, w, time, 1.0);
            self.energy_deposit += hit.energy_deposit;
            self.weight += 1;
        }
        self.hits.push(index);
    }

    /// Folds another cluster into this one.
    pub fn merge(&mut self, other: Cluster) {
        let (w_self, w_other) = (self.weight as f64, other.weight as f64);
        self.position = self.position.weighted_mean(w_self, &other.position, w_other);
        self.time = weighted_time(self.time, w_self, other.time, w_other);
        self.energy_deposit += other.energy_deposit;
        self.weight += other.weight;
        self.hits.extend(other.hits);
    }

    /// Returns true if both centroids and mean times are within `thresholds`.
    #[inline]
    #[must_use]
    pub fn is_near(&self, position: &Position, time: f64, thresholds: &ThresholdPair) -> bool {
        thresholds.accepts(self.position.distance(position), (self.time - time).abs())
    }

    /// Returns the number of member hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the cluster has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of energy-carrying members.
    #[must_use]
    pub fn weight(&self) -> usize {
        self.weight
    }

    /// Returns true if no member carries energy.
    ///
    /// Such a cluster takes no further hits and never merges.
    #[inline]
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.weight == 0
    }

    /// Returns an iterator over member indices.
    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.hits.iter()
    }

    /// Resolves member indices against the hit slice the cluster came from.
    pub fn members<'a>(&'a self, hits: &'a [Hit]) -> impl Iterator<Item = &'a Hit> + 'a {
        self.hits.iter().filter_map(move |&index| hits.get(index))
    }
}

fn weighted_time(a: f64, wa: f64, b: f64, wb: f64) -> f64 {
    let total = wa + wb;
    if total <= 0.0 {
        a
    } else {
        (a * wa + b * wb) / total
    }
}

/// How clusters that remain close after assignment are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MergeStrategy {
    /// One forward sweep over cluster pairs; result depends on cluster order.
    #[default]
    SingleSweep,
    /// Repeat the sweep until no pair merges.
    Transitive,
}

/// Configuration for the clustering engine.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringConfig {
    /// Fallback thresholds when none are supplied per collection.
    pub thresholds: ThresholdPair,
    /// Merge pass behaviour.
    pub merge: MergeStrategy,
}

impl ClusteringConfig {
    /// Creates a new clustering configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the spatial threshold (mm).
    #[must_use]
    pub fn with_spatial_threshold(mut self, spatial_mm: f64) -> Self {
        self.thresholds.spatial_mm = spatial_mm;
        self
    }

    /// Sets the time threshold (ns).
    #[must_use]
    pub fn with_time_threshold(mut self, time_ns: f64) -> Self {
        self.thresholds.time_ns = time_ns;
        self
    }

    /// Sets the merge strategy.
    #[must_use]
    pub fn with_merge_strategy(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }
}

/// Statistics from one clustering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringStatistics {
    /// Hits consumed.
    pub hits_processed: usize,
    /// Clusters created by the seed pass.
    pub seed_clusters: usize,
    /// Compton seeds among them.
    pub compton_seeds: usize,
    /// Photoelectric seeds among them.
    pub photoelectric_seeds: usize,
    /// Clusters removed by the merge pass.
    pub merges: usize,
    /// Clusters left after merging.
    pub clusters_found: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hit(x: f64, energy: f64) -> Hit {
        Hit::new(Position::new(x, 0.0, 0.0), 0.0, energy, "eIoni")
    }

    #[test]
    fn test_cluster_absorb() {
        let mut cluster = Cluster::seed(0, &hit(0.0, 10.0), 0.0, 3);
        cluster.absorb(1, &hit(3.0, 20.0), 3.0);
        cluster.absorb(2, &hit(6.0, 30.0), 6.0);

        assert_eq!(cluster.len(), 3);
        assert_eq!(cluster.weight(), 3);
        assert_eq!(cluster.collection_id, 3);
        assert_relative_eq!(cluster.position.x, 3.0);
        assert_relative_eq!(cluster.time, 3.0);
        assert_relative_eq!(cluster.energy_deposit, 60.0);
    }

    #[test]
    fn test_zero_energy_member_keeps_statistics() {
        let mut cluster = Cluster::seed(0, &hit(0.0, 10.0), 0.0, 0);
        cluster.absorb(1, &hit(8.0, 0.0), 4.0);

        assert_eq!(cluster.len(), 2);
        assert_eq!(cluster.weight(), 1);
        assert!(!cluster.is_inert());
        assert!(Cluster::seed(2, &hit(8.0, 0.0), 4.0, 0).is_inert());
        assert_relative_eq!(cluster.position.x, 0.0);
        assert_relative_eq!(cluster.time, 0.0);
        assert_relative_eq!(cluster.energy_deposit, 10.0);
    }

    #[test]
    fn test_cluster_merge_weights_by_members() {
        let mut a = Cluster::seed(0, &hit(0.0, 1.0), 0.0, 0);
        a.absorb(1, &hit(0.0, 1.0), 0.0);
        a.absorb(2, &hit(0.0, 1.0), 0.0);
        let b = Cluster::seed(3, &hit(4.0, 5.0), 8.0, 0);

        a.merge(b);
        assert_eq!(a.hits, vec![0, 1, 2, 3]);
        assert_relative_eq!(a.position.x, 1.0);
        assert_relative_eq!(a.time, 2.0);
        assert_relative_eq!(a.energy_deposit, 8.0);
    }

    #[test]
    fn test_merge_into_empty_weight_cluster() {
        let mut a = Cluster::seed(0, &hit(9.0, 0.0), 9.0, 0);
        let b = Cluster::seed(1, &hit(2.0, 4.0), 1.0, 0);
        a.merge(b);
        assert_relative_eq!(a.position.x, 2.0);
        assert_relative_eq!(a.time, 1.0);
        assert_eq!(a.weight(), 1);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_members_resolve_indices() {
        let hits = vec![hit(0.0, 1.0), hit(1.0, 2.0)];
        let mut cluster = Cluster::seed(1, &hits[1], 0.0, 0);
        cluster.absorb(0, &hits[0], 0.0);
        let energies: Vec<f64> = cluster.members(&hits).map(|h| h.energy_deposit).collect();
        assert_eq!(energies, vec![2.0, 1.0]);
    }

    #[test]
    fn test_clustering_config() {
        let config = ClusteringConfig::new()
            .with_spatial_threshold(2.5)
            .with_time_threshold(5.0)
            .with_merge_strategy(MergeStrategy::Transitive);

        assert_relative_eq!(config.thresholds.spatial_mm, 2.5);
        assert_relative_eq!(config.thresholds.time_ns, 5.0);
        assert_eq!(config.merge, MergeStrategy::Transitive);
        assert_eq!(ClusteringConfig::default().merge, MergeStrategy::SingleSweep);
    }
}
