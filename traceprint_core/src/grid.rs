//! Uniform grid mapping between continuous geo-coordinates and
//! discrete cells.
//!
//! Discretizing the bounding box into a finite grid is what makes a
//! tractable Markov model over cell transitions feasible. The mapping
//! is pure and stateless beyond the configured bounds.

use crate::config::{Config, GpsBounds};
use crate::error::CoreError;
use crate::types::{GeoPoint, GridCell};

/// Geo ⇄ cell conversion over a configured bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Grid {
    bounds: GpsBounds,
    grid_size: usize,
}

impl Grid {
    pub fn new(config: &Config) -> Self {
        Self {
            bounds: config.bounds,
            grid_size: config.grid_size,
        }
    }

    /// Cells per axis.
    pub fn size(&self) -> usize {
        self.grid_size
    }

    /// True iff the point falls inside the half-open bounding box.
    pub fn in_range(&self, point: GeoPoint) -> bool {
        let lat_ok = self.bounds.lat[0] <= point.lat && point.lat < self.bounds.lat[1];
        let lng_ok = self.bounds.lng[0] <= point.lng && point.lng < self.bounds.lng[1];
        lat_ok && lng_ok
    }

    /// True iff both cell indices fall inside [0, grid_size).
    pub fn in_range_cell(&self, cell: GridCell) -> bool {
        let size = self.grid_size as i32;
        (0..size).contains(&cell.x) && (0..size).contains(&cell.y)
    }

    /// Maps a geo-point to its grid cell.
    ///
    /// Fails on out-of-range input; never clamps.
    pub fn to_cell(&self, point: GeoPoint) -> Result<GridCell, CoreError> {
        self.to_cell_sized(point, self.grid_size)
    }

    /// Maps a geo-point to its cell on a grid of `grid_size` cells per
    /// axis over the same bounding box. Some utility metrics evaluate
    /// on a coarser grid than the model's.
    pub fn to_cell_sized(&self, point: GeoPoint, grid_size: usize) -> Result<GridCell, CoreError> {
        if !self.in_range(point) {
            return Err(CoreError::PointOutOfRange {
                lat: point.lat,
                lng: point.lng,
            });
        }

        let lat_step = (self.bounds.lat[1] - self.bounds.lat[0]) / grid_size as f64;
        let lng_step = (self.bounds.lng[1] - self.bounds.lng[0]) / grid_size as f64;

        let x = ((point.lat - self.bounds.lat[0]) / lat_step).floor() as i32;
        let y = ((point.lng - self.bounds.lng[0]) / lng_step).floor() as i32;

        Ok(GridCell::new(x, y))
    }

    /// Maps a cell back to its lower-bound corner coordinate.
    ///
    /// This is an asymmetric inverse of `to_cell`: the corner is not
    /// the centroid, so `to_corner(to_cell(p))` generally differs from
    /// `p`, while the cell-level round trip is exact.
    pub fn to_corner(&self, cell: GridCell) -> Result<GeoPoint, CoreError> {
        if !self.in_range_cell(cell) {
            return Err(CoreError::CellOutOfRange {
                x: cell.x,
                y: cell.y,
                grid_size: self.grid_size,
            });
        }

        let lat_step = (self.bounds.lat[1] - self.bounds.lat[0]) / self.grid_size as f64;
        let lng_step = (self.bounds.lng[1] - self.bounds.lng[0]) / self.grid_size as f64;

        Ok(GeoPoint::new(
            self.bounds.lat[0] + lat_step * cell.x as f64,
            self.bounds.lng[0] + lng_step * cell.y as f64,
        ))
    }

    /// All in-range cells within Chebyshev distance `radius` of
    /// `center` (the center itself included when in range).
    pub fn neighborhood(&self, center: GridCell, radius: i32) -> Vec<GridCell> {
        let mut cells = Vec::new();
        for x in (center.x - radius)..=(center.x + radius) {
            for y in (center.y - radius)..=(center.y + radius) {
                let cell = GridCell::new(x, y);
                if self.in_range_cell(cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GpsBounds;

    fn unit_grid() -> Grid {
        let config = Config {
            bounds: GpsBounds {
                lat: [0.0, 10.0],
                lng: [0.0, 10.0],
            },
            grid_size: 10,
            ..Config::default()
        };
        Grid::new(&config)
    }

    #[test]
    fn test_to_cell_concrete() {
        let grid = unit_grid();
        let cell = grid.to_cell(GeoPoint::new(5.5, 3.2)).unwrap();
        assert_eq!(cell, GridCell::new(5, 3));
    }

    #[test]
    fn test_to_corner_concrete() {
        let grid = unit_grid();
        let corner = grid.to_corner(GridCell::new(5, 3)).unwrap();
        assert_eq!(corner, GeoPoint::new(5.0, 3.0));
    }

    #[test]
    fn test_out_of_range_point_rejected() {
        let grid = unit_grid();
        assert!(matches!(
            grid.to_cell(GeoPoint::new(10.0, 5.0)),
            Err(CoreError::PointOutOfRange { .. })
        ));
        assert!(matches!(
            grid.to_cell(GeoPoint::new(-0.1, 5.0)),
            Err(CoreError::PointOutOfRange { .. })
        ));
    }

    #[test]
    fn test_out_of_range_cell_rejected() {
        let grid = unit_grid();
        assert!(matches!(
            grid.to_corner(GridCell::new(10, 0)),
            Err(CoreError::CellOutOfRange { .. })
        ));
        assert!(matches!(
            grid.to_corner(GridCell::new(0, -1)),
            Err(CoreError::CellOutOfRange { .. })
        ));
    }

    #[test]
    fn test_cell_round_trip_idempotent() {
        let grid = unit_grid();
        for &(lat, lng) in &[(0.0, 0.0), (5.5, 3.2), (9.99, 9.99), (2.5, 7.5)] {
            let point = GeoPoint::new(lat, lng);
            let cell = grid.to_cell(point).unwrap();
            let corner = grid.to_corner(cell).unwrap();
            assert_eq!(grid.to_cell(corner).unwrap(), cell);
            assert!(grid.in_range_cell(cell));
        }
    }

    #[test]
    fn test_neighborhood_clipped_at_border() {
        let grid = unit_grid();
        let cells = grid.neighborhood(GridCell::new(0, 0), 1);
        // 2x2 corner instead of the full 3x3 block.
        assert_eq!(cells.len(), 4);
        assert!(cells.iter().all(|c| grid.in_range_cell(*c)));
    }

    #[test]
    fn test_neighborhood_interior() {
        let grid = unit_grid();
        let cells = grid.neighborhood(GridCell::new(5, 5), 2);
        assert_eq!(cells.len(), 25);
    }
}
