//! Seeded synthetic trajectory generation.
//!
//! Stands in for a real dataset loader: correlated random walks over
//! the configured grid, generated from an injected generator so every
//! experiment is reproducible from its seed.

use rand::Rng;
use traceprint_core::{Config, GeoPoint, GeoTrajectory, Grid, GridCell, Trajectory, TrajectoryPoint};

/// Seconds between consecutive synthetic observations.
const SAMPLE_INTERVAL_SECS: f64 = 30.0;

/// Synthetic trajectory generator over one grid.
pub struct DatasetGenerator {
    grid: Grid,
}

impl DatasetGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            grid: Grid::new(config),
        }
    }

    /// Generates `count` cell-space random walks of `length` positions
    /// with strictly increasing timestamps.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        count: usize,
        length: usize,
        rng: &mut R,
    ) -> Vec<Trajectory> {
        (0..count)
            .map(|_| self.walk(length, rng))
            .collect()
    }

    /// Generates geo-space trajectories for correlation-model
    /// construction: the same walks, placed at a uniform offset inside
    /// each cell.
    pub fn generate_geo<R: Rng + ?Sized>(
        &self,
        count: usize,
        length: usize,
        rng: &mut R,
    ) -> Vec<GeoTrajectory> {
        (0..count)
            .map(|_| {
                self.walk(length, rng)
                    .into_iter()
                    .map(|point| self.jitter_into_cell(point.cell, rng))
                    .collect()
            })
            .collect()
    }

    fn walk<R: Rng + ?Sized>(&self, length: usize, rng: &mut R) -> Trajectory {
        let size = self.grid.size() as i32;
        let mut cell = GridCell::new(rng.gen_range(0..size), rng.gen_range(0..size));

        // Momentum keeps the walk from dithering in place, so the
        // transition counts carry real directional structure.
        let mut heading = (rng.gen_range(-1..=1), rng.gen_range(-1..=1));

        let mut trajectory = Trajectory::with_capacity(length);
        for i in 0..length {
            trajectory.push(TrajectoryPoint::new(cell, i as f64 * SAMPLE_INTERVAL_SECS));

            if rng.gen_bool(0.2) {
                heading = (rng.gen_range(-1..=1), rng.gen_range(-1..=1));
            }
            let next = GridCell::new(
                (cell.x + heading.0).clamp(0, size - 1),
                (cell.y + heading.1).clamp(0, size - 1),
            );
            if next == cell {
                heading = (rng.gen_range(-1..=1), rng.gen_range(-1..=1));
            }
            cell = next;
        }
        trajectory
    }

    fn jitter_into_cell<R: Rng + ?Sized>(&self, cell: GridCell, rng: &mut R) -> GeoPoint {
        // The walk only produces in-range cells, so the corner lookups
        // cannot fail.
        let corner = self
            .grid
            .to_corner(cell)
            .expect("walk produced an out-of-range cell");
        let origin = self.grid.to_corner(GridCell::new(0, 0)).expect("origin cell");
        let step = self
            .grid
            .to_corner(GridCell::new(1, 1))
            .expect("grids smaller than 2x2 are not generated");
        let (lat_step, lng_step) = (step.lat - origin.lat, step.lng - origin.lng);

        // Offset strictly inside the cell; 0.999 keeps the point off
        // the next cell's lower edge.
        GeoPoint::new(
            corner.lat + rng.gen_range(0.0..0.999) * lat_step,
            corner.lng + rng.gen_range(0.0..0.999) * lng_step,
        )
    }
}
