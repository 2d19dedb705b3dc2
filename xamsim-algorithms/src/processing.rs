//! Event processing: cluster every registered collection of an event.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use crate::event::{ClusterRow, CollectionSummary, EventHits, EventRecord};
use crate::seeded::{ClusterSet, SeededClustering, SeededState};
use log::{debug, warn};
use rayon::prelude::*;
use xamsim_core::clustering::ClusteringConfig;
use xamsim_core::error::{Error, Result};
use xamsim_core::hit::Hit;
use xamsim_core::thresholds::ClusterThresholds;

/// Ordered list of sensitive hit collections.
///
/// The collection id of a name is its registration index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionRegistry {
    names: Vec<String>,
}

impl CollectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from names in order.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateCollection`] if a name repeats.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.register(name)?;
        }
        Ok(registry)
    }

    /// Registers a collection and returns its id.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateCollection`] if the name is already known.
    pub fn register(&mut self, name: impl Into<String>) -> Result<i32> {
        let name = name.into();
        if self.id_of(&name).is_some() {
            return Err(Error::DuplicateCollection(name));
        }
        debug!("registering hits collection {name}");
        self.names.push(name);
        Ok((self.names.len() - 1) as i32)
    }

    /// Id of a registered collection.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<i32> {
        self.names.iter().position(|n| n == name).map(|i| i as i32)
    }

    /// Name of a collection id.
    #[must_use]
    pub fn name_of(&self, id: i32) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    /// Iterates `(id, name)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (i as i32, name.as_str()))
    }

    /// Number of registered collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Clusters the hits of each event collection by collection.
///
/// Shared read-only between workers; each worker keeps its own
/// [`SeededState`].
#[derive(Debug, Clone)]
pub struct EventProcessor {
    registry: CollectionRegistry,
    thresholds: ClusterThresholds,
    engine: SeededClustering,
}

impl EventProcessor {
    /// Creates a processor.
    ///
    /// The fallback pair of `config` is ignored; `thresholds` carries its own.
    #[must_use]
    pub fn new(
        registry: CollectionRegistry,
        thresholds: ClusterThresholds,
        config: ClusteringConfig,
    ) -> Self {
        Self {
            registry,
            thresholds,
            engine: SeededClustering::new(config),
        }
    }

    /// Registered collections.
    #[must_use]
    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Threshold table.
    #[must_use]
    pub fn thresholds(&self) -> &ClusterThresholds {
        &self.thresholds
    }

    /// Clusters one collection's hits with its resolved thresholds.
    ///
    /// # Errors
    /// Returns [`Error::UnknownCollection`] for unregistered names.
    pub fn process_collection(&self, name: &str, hits: &[Hit]) -> Result<ClusterSet> {
        let id = self
            .registry
            .id_of(name)
            .ok_or_else(|| Error::UnknownCollection(name.to_string()))?;
        let mut state = self.engine.create_state();
        Ok(self.cluster_collection(id, name, hits, &mut state))
    }

    fn cluster_collection(
        &self,
        id: i32,
        name: &str,
        hits: &[Hit],
        state: &mut SeededState,
    ) -> ClusterSet {
        let thresholds = self.thresholds.resolve(name);
        self.engine.cluster(hits, &thresholds, id, state)
    }

    /// Processes one event.
    #[must_use]
    pub fn process_event(&self, event: &EventHits) -> EventRecord {
        let mut state = self.engine.create_state();
        self.process_event_with(event, &mut state)
    }

    /// Processes one event reusing `state`.
    pub fn process_event_with(&self, event: &EventHits, state: &mut SeededState) -> EventRecord {
        let mut record = EventRecord {
            event_id: event.event_id,
            weight: event.weight,
            event_type: event.event_type,
            primary_vertex: event.primary_vertex,
            ..Default::default()
        };

        if event.collections.is_empty() {
            warn!("event {}: no hits collection found", event.event_id);
            return record;
        }

        for (id, name) in self.registry.iter() {
            let Some(hits) = event.hits_for(name) else {
                warn!("event {}: hits collection {name} missing", event.event_id);
                record.summaries.push(CollectionSummary {
                    collection_id: id,
                    name: name.to_string(),
                    ..Default::default()
                });
                continue;
            };
            debug!("event {}: {name} has {} hits", event.event_id, hits.len());

            let set = self.cluster_collection(id, name, hits, state);
            let summary = summarize(id, name, hits.len(), &set);
            record
                .rows
                .extend(cluster_rows(event.event_id, event.weight, &set));
            record.summaries.push(summary);
        }
        record
    }

    /// Processes events in parallel, keeping input order.
    #[must_use]
    pub fn process_events(&self, events: &[EventHits]) -> Vec<EventRecord> {
        events
            .par_iter()
            .map_init(SeededState::default, |state, event| {
                self.process_event_with(event, state)
            })
            .collect()
    }
}

/// Summarizes one collection's clusters.
#[must_use]
pub fn summarize(collection_id: i32, name: &str, nhits: usize, set: &ClusterSet) -> CollectionSummary {
    let with_energy = set.iter().filter(|c| c.energy_deposit > 0.0);
    let (ndet, edet_kev) = with_energy.fold((0, 0.0), |(n, e), c| (n + 1, e + c.energy_deposit));
    CollectionSummary {
        collection_id,
        name: name.to_string(),
        nhits,
        edet_kev,
        ndet,
        nphot: set.statistics.photoelectric_seeds,
        ncomp: set.statistics.compton_seeds,
        nclusters: set.len(),
    }
}

/// Output rows for clusters with energy; clusters without energy are dropped.
pub fn cluster_rows(
    event_id: u64,
    weight: f64,
    set: &ClusterSet,
) -> impl Iterator<Item = ClusterRow> + '_ {
    set.iter()
        .filter(|c| c.energy_deposit > 0.0)
        .map(move |c| ClusterRow {
            event_id,
            energy_kev: c.energy_deposit,
            x: c.position.x,
            y: c.position.y,
            z: c.position.z,
            collection_id: c.collection_id,
            weight,
        })
}
