//! Configuration for the fingerprinting core.
//!
//! One immutable `Config` value is built at initialization and passed
//! into each component's constructor. The core never mutates it.

use serde::{Deserialize, Serialize};

/// Half-open geographic bounding box: `min <= v < max` per axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GpsBounds {
    /// Latitude limits [min, max).
    pub lat: [f64; 2],

    /// Longitude limits [min, max).
    pub lng: [f64; 2],
}

impl GpsBounds {
    /// Bounding box covering central Beijing (GeoLife-style data).
    pub fn beijing() -> Self {
        Self {
            lat: [39.6, 40.4],
            lng: [116.0, 116.8],
        }
    }
}

/// Immutable configuration shared by the core components.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Config {
    /// Geographic bounding box all input points must fall inside.
    pub bounds: GpsBounds,

    /// Cells per axis of the uniform grid.
    pub grid_size: usize,

    /// Chebyshev radius of a cell's local neighborhood, used for the
    /// emission query and the synthetic transition fallback.
    pub neighbor_range: i32,

    /// Default transition-plausibility threshold.
    pub tau: f64,

    /// Default feedback-controller adjustment factor.
    pub theta: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bounds: GpsBounds::beijing(),
            grid_size: 40,
            neighbor_range: 2,
            tau: 0.0,
            theta: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_sane() {
        let config = Config::default();
        assert!(config.grid_size > 0);
        assert!(config.neighbor_range >= 1);
        assert!(config.bounds.lat[0] < config.bounds.lat[1]);
        assert!(config.bounds.lng[0] < config.bounds.lng[1]);
        assert!((0.0..=1.0).contains(&config.tau));
    }
}
