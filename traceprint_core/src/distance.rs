//! Distance functions over cells and geo-coordinates.

use crate::error::CoreError;
use crate::types::{GeoPoint, GridCell};

/// Squared Euclidean distance between two cells.
pub fn sq_euclidean(a: GridCell, b: GridCell) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx * dx + dy * dy
}

/// Euclidean distance between two cells.
pub fn euclidean(a: GridCell, b: GridCell) -> f64 {
    sq_euclidean(a, b).sqrt()
}

/// Great-circle distance between two coordinates in meters.
pub fn haversine(a: GeoPoint, b: GeoPoint) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_372_800.0;

    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();

    let h = (dphi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Jensen-Shannon divergence between two histograms.
///
/// Not implemented; erroring here keeps the missing metric from
/// being mistaken for a zero divergence.
pub fn jsd(_hist_a: &[f64], _hist_b: &[f64]) -> Result<f64, CoreError> {
    Err(CoreError::NotImplemented("Jensen-Shannon divergence"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sq_euclidean() {
        assert_relative_eq!(
            sq_euclidean(GridCell::new(0, 0), GridCell::new(3, 4)),
            25.0
        );
        assert_relative_eq!(
            sq_euclidean(GridCell::new(2, 2), GridCell::new(2, 2)),
            0.0
        );
    }

    #[test]
    fn test_euclidean() {
        assert_relative_eq!(euclidean(GridCell::new(0, 0), GridCell::new(3, 4)), 5.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Paris to London, roughly 344 km.
        let paris = GeoPoint::new(48.8566, 2.3522);
        let london = GeoPoint::new(51.5074, -0.1278);
        let d = haversine(paris, london);
        assert!((d - 344_000.0).abs() < 5_000.0, "got {}", d);
    }

    #[test]
    fn test_haversine_zero() {
        let p = GeoPoint::new(40.0, 116.4);
        assert_relative_eq!(haversine(p, p), 0.0);
    }

    #[test]
    fn test_jsd_not_implemented() {
        assert!(matches!(
            jsd(&[0.5, 0.5], &[0.9, 0.1]),
            Err(CoreError::NotImplemented(_))
        ));
    }
}
