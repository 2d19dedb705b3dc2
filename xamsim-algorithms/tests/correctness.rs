#![allow(clippy::uninlined_format_args)]
use approx::assert_relative_eq;
use xamsim_algorithms::{cluster_hits, ClusterSet};
use xamsim_core::hit::{Hit, Position};

fn hit_at(x: f64, time: f64, energy: f64, process: &str) -> Hit {
    Hit::new(Position::new(x, 0.0, 0.0), time, energy, process)
}

#[test]
fn test_same_point_collapses_to_one_cluster() {
    let hits = vec![
        hit_at(0.0, 0.0, 10.0, "other"),
        hit_at(0.0, 1.0, 20.0, "other"),
        hit_at(0.0, 2.0, 30.0, "other"),
    ];
    let set = cluster_hits(&hits, 5.0, 5.0, 0);

    assert_eq!(set.len(), 1, "Found {} clusters, expected 1", set.len());
    let cluster = &set.clusters[0];
    assert_relative_eq!(cluster.energy_deposit, 60.0);
    // Stepwise update: 0 -> (0 + 1) / 2 -> (0.5 * 2 + 2) / 3
    assert_relative_eq!(cluster.time, 1.0);
    assert_eq!(cluster.hits, vec![0, 1, 2]);
}

#[test]
fn test_incremental_time_update_order() {
    // Second hit is 4 ns after the first, third 4 ns after the second: the
    // third is only close to the running mean, not to the first hit.
    let hits = vec![
        hit_at(0.0, 0.0, 1.0, "eIoni"),
        hit_at(0.0, 4.0, 1.0, "eIoni"),
        hit_at(0.0, 6.5, 1.0, "eIoni"),
    ];
    let set = cluster_hits(&hits, 5.0, 5.0, 0);
    assert_eq!(set.len(), 1);
    assert_relative_eq!(set.clusters[0].time, 3.5);
}

#[test]
fn test_distant_hits_stay_apart() {
    let hits = vec![
        hit_at(0.0, 0.0, 10.0, "eIoni"),
        hit_at(100.0, 0.0, 10.0, "eIoni"),
    ];
    let set = cluster_hits(&hits, 10.0, 100.0, 0);
    assert_eq!(set.len(), 2);
    assert_relative_eq!(set.clusters[1].position.x, 100.0);
}

#[test]
fn test_late_hits_stay_apart() {
    let hits = vec![
        hit_at(0.0, 0.0, 10.0, "eIoni"),
        hit_at(0.0, 500.0, 10.0, "eIoni"),
    ];
    let set = cluster_hits(&hits, 10.0, 100.0, 0);
    assert_eq!(set.len(), 2);
    assert_relative_eq!(set.clusters[1].time, 500.0);
}

#[test]
fn test_single_compton_hit() {
    let hits = vec![hit_at(3.0, 42.0, 500.0, "compt")];
    let set = cluster_hits(&hits, 10.0, 100.0, 7);

    assert_eq!(set.len(), 1);
    let cluster = &set.clusters[0];
    assert_eq!(cluster.hits, vec![0]);
    assert_eq!(cluster.collection_id, 7);
    assert_relative_eq!(cluster.energy_deposit, 500.0);
    assert_relative_eq!(cluster.time, 0.0);
    assert_relative_eq!(set.time_origin, 42.0);
    assert_eq!(set.statistics.compton_seeds, 1);
}

/// `(x, energy)` of every cluster that carries energy, in cluster order.
fn energetic(set: &ClusterSet) -> Vec<(f64, f64)> {
    set.iter()
        .filter(|c| c.energy_deposit > 0.0)
        .map(|c| (c.position.x, c.energy_deposit))
        .collect()
}

#[test]
fn test_zero_energy_hits_do_not_shift_statistics() {
    let mixed = vec![
        hit_at(0.0, 0.0, 10.0, "eIoni"),
        hit_at(1.0, 0.0, 0.0, "eIoni"),
        hit_at(2.0, 1.0, 20.0, "eIoni"),
        hit_at(0.5, 0.0, 0.0, "eIoni"),
    ];
    let nonzero: Vec<Hit> = mixed.iter().filter(|h| h.has_energy()).cloned().collect();

    let with_zeros = cluster_hits(&mixed, 5.0, 5.0, 0);
    let reference = cluster_hits(&nonzero, 5.0, 5.0, 0);

    assert_eq!(reference.len(), 1);
    assert_eq!(energetic(&with_zeros), energetic(&reference));
    let a = &with_zeros.clusters[0];
    let b = &reference.clusters[0];
    assert_relative_eq!(a.time, b.time);
    assert_relative_eq!(a.position.x, 1.0);
    assert_relative_eq!(a.time, 0.5);
    assert_eq!(a.hits, vec![0, 2]);

    // Each zero-energy hit stays on its own, so every hit is still accounted for.
    assert_eq!(with_zeros.len(), 3);
    assert_eq!(with_zeros.clusters[1].hits, vec![1]);
    assert_eq!(with_zeros.clusters[2].hits, vec![3]);
}

#[test]
fn test_zero_energy_hit_does_not_attract_later_hits() {
    // The first hit carries no energy and sits between the others. It must
    // not become a cluster the later hits join.
    let hits = vec![
        hit_at(6.0, 0.0, 0.0, "eIoni"),
        hit_at(0.0, 0.0, 10.0, "eIoni"),
        hit_at(3.0, 0.0, 10.0, "eIoni"),
        hit_at(7.9, 0.0, 10.0, "eIoni"),
    ];
    let with_zero = cluster_hits(&hits, 5.0, 5.0, 0);
    let without_zero = cluster_hits(&hits[1..], 5.0, 5.0, 0);

    assert_eq!(energetic(&with_zero), vec![(1.5, 20.0), (7.9, 10.0)]);
    assert_eq!(energetic(&with_zero), energetic(&without_zero));
    assert_eq!(with_zero.clusters[0].hits, vec![0]);
    assert_eq!(with_zero.statistics.merges, 0);
}

#[test]
fn test_zero_energy_seed_stays_alone() {
    let hits = vec![
        hit_at(0.0, 0.0, 0.0, "compt"),
        hit_at(0.5, 0.0, 10.0, "eIoni"),
        hit_at(1.0, 0.0, 5.0, "phot"),
    ];
    let set = cluster_hits(&hits, 5.0, 5.0, 0);
    assert_eq!(set.len(), 2);
    assert_eq!(set.clusters[0].hits, vec![0]);
    assert_eq!(set.clusters[1].hits, vec![2, 1]);
    assert_relative_eq!(set.clusters[1].energy_deposit, 15.0);
}

#[test]
fn test_empty_input() {
    let set = cluster_hits(&[], 10.0, 100.0, 0);
    assert!(set.is_empty());
    assert_eq!(set, ClusterSet::default());
}

#[test]
fn test_seed_owns_cluster_of_earlier_hit() {
    // The ionisation hit comes first in the batch but joins the Compton
    // seed rather than the seed joining it.
    let hits = vec![
        hit_at(0.0, 0.0, 2.0, "eIoni"),
        hit_at(0.0, 0.0, 50.0, "compt"),
        hit_at(50.0, 0.0, 80.0, "phot"),
    ];
    let set = cluster_hits(&hits, 5.0, 5.0, 0);
    assert_eq!(set.len(), 2);
    assert_eq!(set.clusters[0].hits, vec![1, 0]);
    assert_eq!(set.clusters[1].hits, vec![2]);
    assert_eq!(set.statistics.seed_clusters, 2);
}

#[test]
fn test_merge_joins_seeds_close_together() {
    let hits = vec![
        hit_at(0.0, 0.0, 50.0, "compt"),
        hit_at(1.0, 1.0, 30.0, "phot"),
    ];
    let set = cluster_hits(&hits, 5.0, 5.0, 0);
    assert_eq!(set.statistics.seed_clusters, 2);
    assert_eq!(set.statistics.merges, 1);
    assert_eq!(set.len(), 1);
    assert_relative_eq!(set.clusters[0].position.x, 0.5);
    assert_relative_eq!(set.clusters[0].energy_deposit, 80.0);
}

#[test]
fn test_negative_thresholds_never_match() {
    let hits = vec![
        hit_at(0.0, 0.0, 1.0, "eIoni"),
        hit_at(0.0, 0.0, 1.0, "eIoni"),
    ];
    let set = cluster_hits(&hits, -1.0, -1.0, 0);
    assert_eq!(set.len(), 2);
}
