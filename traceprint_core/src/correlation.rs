//! Cell-to-cell correlation model built from historical trajectories.
//!
//! A grid-discretized Markov model: transition counts over consecutive
//! cell pairs and emission (visit) counts per cell. Built once, then
//! read-only, so a single model can be shared across any number of
//! concurrent fingerprinting or detection calls without locking.

use crate::config::Config;
use crate::distance;
use crate::error::CoreError;
use crate::grid::Grid;
use crate::types::{GeoTrajectory, GridCell};
use std::collections::HashMap;

/// Candidate substitute cells for one fingerprinting step.
#[derive(Debug, Clone)]
pub struct CandidateSets {
    /// Full transition distribution of the previous cell.
    pub all: HashMap<GridCell, f64>,

    /// Candidates with probability at or above tau.
    pub thresholded: HashMap<GridCell, f64>,

    /// Thresholded candidates no farther from the true cell than the
    /// previous cell is (monotonic-approach constraint). Present only
    /// when the distance filter was requested.
    pub distance_filtered: Option<HashMap<GridCell, f64>>,
}

/// Transition/emission model over grid cells.
#[derive(Debug, Clone)]
pub struct CorrelationModel {
    grid: Grid,
    neighbor_range: i32,
    emission: HashMap<GridCell, u64>,
    transition: HashMap<GridCell, HashMap<GridCell, u64>>,
}

impl CorrelationModel {
    /// Builds the model from historical geo trajectories.
    ///
    /// Every consecutive point pair increments one transition count
    /// and one emission count; the final counts are independent of
    /// the order trajectories are processed in.
    pub fn from_trajectories(prior: &[GeoTrajectory], config: &Config) -> Result<Self, CoreError> {
        let grid = Grid::new(config);
        let mut emission: HashMap<GridCell, u64> = HashMap::new();
        let mut transition: HashMap<GridCell, HashMap<GridCell, u64>> = HashMap::new();

        for trajectory in prior {
            for pair in trajectory.windows(2) {
                let prev_cell = grid.to_cell(pair[0])?;
                let curr_cell = grid.to_cell(pair[1])?;
                *transition
                    .entry(prev_cell)
                    .or_default()
                    .entry(curr_cell)
                    .or_insert(0) += 1;
                *emission.entry(curr_cell).or_insert(0) += 1;
            }
        }

        Ok(Self {
            grid,
            neighbor_range: config.neighbor_range,
            emission,
            transition,
        })
    }

    /// The grid this model was discretized on.
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Transition distribution out of `cell`, uniform over its support.
    ///
    /// The support is the set of observed successors, or, when the
    /// cell has no recorded outgoing transitions, every in-range cell
    /// within the neighbor range. The observed frequencies are
    /// normalized and then deliberately flattened to 1/|support|,
    /// hiding true visitation frequency from the candidate draw.
    pub fn transition_distribution(&self, cell: GridCell) -> HashMap<GridCell, f64> {
        let total: u64 = self
            .transition
            .get(&cell)
            .map(|succ| succ.values().sum())
            .unwrap_or(0);

        let local: HashMap<GridCell, f64> = if total == 0 {
            self.grid
                .neighborhood(cell, self.neighbor_range)
                .into_iter()
                .map(|c| (c, 1.0))
                .collect()
        } else {
            self.transition[&cell]
                .iter()
                .map(|(succ, count)| (*succ, *count as f64 / total as f64))
                .collect()
        };

        let uniform = 1.0 / local.len() as f64;
        local.keys().map(|c| (*c, uniform)).collect()
    }

    /// Raw observed transition counts out of `cell`; empty if unseen.
    pub fn raw_transitions(&self, cell: GridCell) -> HashMap<GridCell, u64> {
        self.transition.get(&cell).cloned().unwrap_or_default()
    }

    /// Emission distribution over the neighborhood of `cell`,
    /// proportional to raw visit counts.
    ///
    /// Fails with `NoEmissionData` when the neighborhood was never
    /// visited: normalizing by a zero total is undefined, and a
    /// silent zero distribution would poison the first-position draw.
    pub fn emission_distribution(
        &self,
        cell: GridCell,
    ) -> Result<HashMap<GridCell, f64>, CoreError> {
        let local: HashMap<GridCell, u64> = self
            .grid
            .neighborhood(cell, self.neighbor_range)
            .into_iter()
            .map(|c| (c, self.emission.get(&c).copied().unwrap_or(0)))
            .collect();

        let total: u64 = local.values().sum();
        if total == 0 {
            return Err(CoreError::NoEmissionData {
                x: cell.x,
                y: cell.y,
            });
        }

        Ok(local
            .into_iter()
            .map(|(c, count)| (c, count as f64 / total as f64))
            .collect())
    }

    /// Candidate sets bounding the substitute search space for one
    /// step: the full transition distribution of `prev`, its
    /// tau-thresholded subset, and optionally the subset that does
    /// not move away from the true cell.
    pub fn candidates(
        &self,
        prev: GridCell,
        truth: GridCell,
        tau: f64,
        consider_distance: bool,
    ) -> CandidateSets {
        let all = self.transition_distribution(prev);
        let thresholded: HashMap<GridCell, f64> = all
            .iter()
            .filter(|(_, prob)| **prob >= tau)
            .map(|(c, prob)| (*c, *prob))
            .collect();

        let distance_filtered = if consider_distance {
            let limit = distance::sq_euclidean(prev, truth);
            Some(
                thresholded
                    .iter()
                    .filter(|(c, _)| distance::sq_euclidean(**c, truth) <= limit)
                    .map(|(c, prob)| (*c, *prob))
                    .collect(),
            )
        } else {
            None
        };

        CandidateSets {
            all,
            thresholded,
            distance_filtered,
        }
    }
}
