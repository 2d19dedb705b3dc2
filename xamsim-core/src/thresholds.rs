//! Per-collection clustering thresholds.

use crate::error::{Error, Result, ThresholdKind};
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Spatial and temporal proximity limits for one hit collection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdPair {
    /// Maximum centroid distance (mm).
    pub spatial_mm: f64,
    /// Maximum mean-time difference (ns).
    pub time_ns: f64,
}

impl ThresholdPair {
    /// Default spatial threshold (mm).
    pub const DEFAULT_SPATIAL_MM: f64 = 10.0;
    /// Default time threshold (ns).
    pub const DEFAULT_TIME_NS: f64 = 100.0;

    /// Creates a threshold pair.
    #[must_use]
    pub fn new(spatial_mm: f64, time_ns: f64) -> Self {
        Self {
            spatial_mm,
            time_ns,
        }
    }

    /// Returns true if a separation lies strictly inside both limits.
    #[inline]
    #[must_use]
    pub fn accepts(&self, distance_mm: f64, time_diff_ns: f64) -> bool {
        distance_mm < self.spatial_mm && time_diff_ns < self.time_ns
    }

    /// Checks both limits are finite and non-negative.
    ///
    /// # Errors
    /// Returns [`Error::InvalidThreshold`] naming the offending half.
    pub fn validate(&self, collection: &str) -> Result<()> {
        for (kind, value) in [
            (ThresholdKind::Spatial, self.spatial_mm),
            (ThresholdKind::Time, self.time_ns),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidThreshold {
                    collection: collection.to_string(),
                    kind,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for ThresholdPair {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SPATIAL_MM, Self::DEFAULT_TIME_NS)
    }
}

/// Threshold lookup keyed by collection name.
///
/// Built once while the detector configuration is loaded and then shared
/// read-only with every event worker.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterThresholds {
    default: ThresholdPair,
    per_collection: HashMap<String, ThresholdPair>,
}

impl ClusterThresholds {
    /// Creates an empty table with the standard default pair.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback pair used for unknown collections.
    #[must_use]
    pub fn with_default(mut self, default: ThresholdPair) -> Self {
        self.default = default;
        self
    }

    /// Adds or replaces the pair for a collection.
    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>, pair: ThresholdPair) -> Self {
        self.insert(name, pair);
        self
    }

    /// Adds or replaces the pair for a collection.
    pub fn insert(&mut self, name: impl Into<String>, pair: ThresholdPair) {
        self.per_collection.insert(name.into(), pair);
    }

    /// Overrides the spatial half of the fallback pair.
    pub fn set_default_spatial(&mut self, spatial_mm: f64) {
        self.default.spatial_mm = spatial_mm;
    }

    /// Overrides the time half of the fallback pair.
    pub fn set_default_time(&mut self, time_ns: f64) {
        self.default.time_ns = time_ns;
    }

    /// Returns the fallback pair.
    #[must_use]
    pub fn default_pair(&self) -> ThresholdPair {
        self.default
    }

    /// Resolves the thresholds for a collection, falling back to the default.
    #[must_use]
    pub fn resolve(&self, collection: &str) -> ThresholdPair {
        self.per_collection
            .get(collection)
            .copied()
            .unwrap_or(self.default)
    }

    /// Returns the explicitly configured pair for a collection, if any.
    #[must_use]
    pub fn get(&self, collection: &str) -> Option<ThresholdPair> {
        self.per_collection.get(collection).copied()
    }

    /// Number of explicitly configured collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.per_collection.len()
    }

    /// Returns true if no collection has an explicit entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.per_collection.is_empty()
    }

    /// Explicit entries sorted by collection name.
    #[must_use]
    pub fn entries(&self) -> Vec<(&str, ThresholdPair)> {
        let mut entries: Vec<_> = self
            .per_collection
            .iter()
            .map(|(name, pair)| (name.as_str(), *pair))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Validates the default pair and every entry.
    ///
    /// # Errors
    /// Returns the first invalid threshold found.
    pub fn validate(&self) -> Result<()> {
        self.default.validate("<default>")?;
        for (name, pair) in self.entries() {
            pair.validate(name)?;
        }
        Ok(())
    }
}
