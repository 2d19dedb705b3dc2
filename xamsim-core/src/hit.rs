//! Hit types for energy deposits recorded in sensitive volumes.
//!
//! Units follow the detector convention used across xamsim: lengths in
//! millimetres, times in nanoseconds, energies in keV.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Point (or vector) in detector coordinates, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Computes the squared Euclidean distance to another position.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Computes the Euclidean distance to another position.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Weighted mean of two positions.
    ///
    /// Returns `self` unchanged when both weights are zero.
    #[inline]
    #[must_use]
    pub fn weighted_mean(&self, self_weight: f64, other: &Self, other_weight: f64) -> Self {
        let total = self_weight + other_weight;
        if total <= 0.0 {
            return *self;
        }
        Self {
            x: (self.x * self_weight + other.x * other_weight) / total,
            y: (self.y * self_weight + other.y * other_weight) / total,
            z: (self.z * self_weight + other.z * other_weight) / total,
        }
    }
}

/// Physics process that produced a step, classified for seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionProcess {
    /// Compton scatter (`"compt"`).
    Compton,
    /// Photoelectric absorption (`"phot"`).
    Photoelectric,
    /// Any other process (ionisation, transport, ...).
    Other,
}

impl InteractionProcess {
    /// Process tag for Compton scattering.
    pub const COMPTON_TAG: &'static str = "compt";
    /// Process tag for photoelectric absorption.
    pub const PHOTOELECTRIC_TAG: &'static str = "phot";

    /// Classifies a process tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            Self::COMPTON_TAG => Self::Compton,
            Self::PHOTOELECTRIC_TAG => Self::Photoelectric,
            _ => Self::Other,
        }
    }

    /// Returns true if hits from this process seed their own cluster.
    #[inline]
    #[must_use]
    pub fn is_seed(self) -> bool {
        matches!(self, Self::Compton | Self::Photoelectric)
    }
}

/// A single energy deposit recorded during one simulation step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Hit {
    /// Post-step position (mm).
    pub position: Position,
    /// Global time of the step (ns).
    pub time: f64,
    /// Deposited energy (keV).
    pub energy_deposit: f64,
    /// Track that made the step.
    pub track_id: i32,
    /// Parent of the track (-1 for primaries).
    pub parent_id: i32,
    /// Pre-step momentum (keV).
    pub momentum: Position,
    /// Particle name, e.g. `"gamma"` or `"e-"`.
    pub particle_type: String,
    /// Name of the process that limited the step.
    pub process_type: String,
    /// Kinetic energy before the step (keV).
    pub particle_energy_pre: f64,
    /// Kinetic energy after the step (keV).
    pub particle_energy_post: f64,
}

impl Default for Hit {
    fn default() -> Self {
        Self {
            position: Position::default(),
            time: 0.0,
            energy_deposit: 0.0,
            track_id: -1,
            parent_id: -1,
            momentum: Position::default(),
            particle_type: String::new(),
            process_type: String::new(),
            particle_energy_pre: 0.0,
            particle_energy_post: 0.0,
        }
    }
}

impl Hit {
    /// Creates a hit with the fields the clustering engine reads.
    #[must_use]
    pub fn new(position: Position, time: f64, energy_deposit: f64, process_type: &str) -> Self {
        Self {
            position,
            time,
            energy_deposit,
            process_type: process_type.to_string(),
            ..Default::default()
        }
    }

    /// Sets the track and parent identifiers.
    #[must_use]
    pub fn with_track(mut self, track_id: i32, parent_id: i32) -> Self {
        self.track_id = track_id;
        self.parent_id = parent_id;
        self
    }

    /// Sets the particle name.
    #[must_use]
    pub fn with_particle(mut self, particle_type: &str) -> Self {
        self.particle_type = particle_type.to_string();
        self
    }

    /// Classifies the process tag of this hit.
    #[inline]
    #[must_use]
    pub fn process(&self) -> InteractionProcess {
        InteractionProcess::from_tag(&self.process_type)
    }

    /// Returns true if the hit deposited a strictly positive energy.
    #[inline]
    #[must_use]
    pub fn has_energy(&self) -> bool {
        self.energy_deposit > 0.0
    }

    /// Returns true if the track is a primary particle.
    #[inline]
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.parent_id <= 0
    }
}

impl std::fmt::Display for Hit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ID: {}, parent: {}, proc: {}, ptcl: {}, E0: {} keV, E1: {} keV, dE: {} keV, \
             pos: ({}, {}, {}) mm, t: {} ns",
            self.track_id,
            self.parent_id,
            self.process_type,
            self.particle_type,
            self.particle_energy_pre,
            self.particle_energy_post,
            self.energy_deposit,
            self.position.x,
            self.position.y,
            self.position.z,
            self.time
        )
    }
}

/// Finds the earliest hit time in a batch.
#[must_use]
pub fn earliest_time(hits: &[Hit]) -> Option<f64> {
    hits.iter().map(|hit| hit.time).reduce(f64::min)
}

/// Shifts hit times in place so the earliest hit sits at zero.
///
/// Returns the subtracted origin, or `None` for an empty slice.
pub fn normalize_times(hits: &mut [Hit]) -> Option<f64> {
    let origin = earliest_time(hits)?;
    for hit in hits.iter_mut() {
        hit.time -= origin;
    }
    Some(origin)
}
