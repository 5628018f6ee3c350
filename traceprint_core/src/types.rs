//! Common data types for trajectories in geo- and cell-space.

use serde::{Deserialize, Serialize};

/// A continuous geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A discrete cell of the uniform grid.
///
/// Indices are signed so neighborhood arithmetic can step outside the
/// grid and be rejected by a range check, rather than wrap.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One position of a cell-space trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub cell: GridCell,

    /// Observation time. Strictly increasing along a trajectory and
    /// never perturbed by fingerprinting.
    pub timestamp: f64,
}

impl TrajectoryPoint {
    pub fn new(cell: GridCell, timestamp: f64) -> Self {
        Self { cell, timestamp }
    }
}

/// Time-ordered sequence of cell-space positions for one moving object.
pub type Trajectory = Vec<TrajectoryPoint>;

/// A historical geo-space trajectory, used to build the correlation
/// model before discretization.
pub type GeoTrajectory = Vec<GeoPoint>;
