//! Detector geometry configuration.
//!
//! Only the parts the clustering stage needs are read: which volumes are
//! active (sensitive) and their clustering thresholds. Solids, materials,
//! and placements are left to the simulation toolkit and ignored here.

use crate::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use xamsim_algorithms::CollectionRegistry;
use xamsim_core::thresholds::{ClusterThresholds, ThresholdPair};

/// Suffix appended to an active volume name to form its collection name.
pub const COLLECTION_SUFFIX: &str = "Collection";

/// Top-level geometry document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// World volume settings.
    #[serde(default)]
    pub world: Option<WorldConfig>,
    /// Volumes in placement order.
    #[serde(default)]
    pub volumes: Vec<VolumeConfig>,
}

/// World volume settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Edge length of the world cube (m).
    #[serde(default)]
    pub size: f64,
}

/// One volume definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Volume name.
    pub name: String,
    /// Material name.
    #[serde(default)]
    pub material: Option<String>,
    /// Whether the volume records hits.
    #[serde(default)]
    pub active: bool,
    /// Clustering thresholds for the volume's hits.
    #[serde(default)]
    pub clustering: Option<ClusteringSection>,
}

/// Per-volume clustering thresholds; missing values use the defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringSection {
    /// Spatial threshold (mm).
    pub spatial_threshold: Option<f64>,
    /// Time threshold (ns).
    pub time_threshold: Option<f64>,
}

impl VolumeConfig {
    /// Name of the hit collection for this volume.
    #[must_use]
    pub fn collection_name(&self) -> String {
        format!("{}{COLLECTION_SUFFIX}", self.name)
    }

    /// Thresholds for this volume, filling gaps from `default`.
    #[must_use]
    pub fn thresholds(&self, default: ThresholdPair) -> ThresholdPair {
        let section = self.clustering.unwrap_or_default();
        ThresholdPair::new(
            section.spatial_threshold.unwrap_or(default.spatial_mm),
            section.time_threshold.unwrap_or(default.time_ns),
        )
    }
}

/// Sensitive collections and their thresholds derived from a geometry.
#[derive(Debug, Clone, Default)]
pub struct DetectorSetup {
    /// Collections in volume order.
    pub registry: CollectionRegistry,
    /// Thresholds keyed by collection name.
    pub thresholds: ClusterThresholds,
}

impl GeometryConfig {
    /// Loads a geometry document from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        info!("loaded geometry from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parses a geometry document from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid geometry document.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Active volumes in order.
    pub fn active_volumes(&self) -> impl Iterator<Item = &VolumeConfig> {
        self.volumes.iter().filter(|v| v.active)
    }

    /// Registers every active volume's collection and threshold pair.
    ///
    /// `default` fills thresholds a volume leaves unset and answers lookups
    /// for unknown collections.
    ///
    /// # Errors
    /// Returns an error on duplicate active volume names or negative
    /// thresholds.
    pub fn detector_setup(&self, default: ThresholdPair) -> Result<DetectorSetup> {
        let mut setup = DetectorSetup {
            registry: CollectionRegistry::new(),
            thresholds: ClusterThresholds::new().with_default(default),
        };
        for volume in self.active_volumes() {
            let collection = volume.collection_name();
            let pair = volume.thresholds(default);
            pair.validate(&collection)?;
            info!(
                "making volume {} sensitive: {collection} ({} mm, {} ns)",
                volume.name, pair.spatial_mm, pair.time_ns
            );
            setup.registry.register(collection.as_str())?;
            setup.thresholds.insert(collection, pair);
        }
        Ok(setup)
    }
}
