//! Utility metrics: how much analytical value the fingerprinted
//! dataset retains relative to the original.

use crate::error::EvalError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use traceprint_core::{distance, GridCell, Trajectory};

/// Utility metric selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum UtilityMetric {
    /// Mean per-area error of point-count queries.
    QaPoints,

    /// Mean per-pattern error of consecutive-movement queries.
    QaPatterns,

    /// Kendall rank correlation of area popularity.
    AreaPopularity,

    /// Mean error of start/end trip distributions.
    TripError,

    /// Mean error of per-trajectory diameters.
    DiameterError,

    /// Mean trajectory-alignment (DTW) distance.
    TripSimilarity,
}

impl UtilityMetric {
    pub fn name(&self) -> &'static str {
        match self {
            UtilityMetric::QaPoints => "qa_points",
            UtilityMetric::QaPatterns => "qa_patterns",
            UtilityMetric::AreaPopularity => "area_popularity",
            UtilityMetric::TripError => "trip_error",
            UtilityMetric::DiameterError => "diameter_error",
            UtilityMetric::TripSimilarity => "trip_similarity",
        }
    }
}

/// Evaluates one utility metric over paired original/protected
/// datasets living on a `model_size` grid, aggregated on a coarser
/// `eval_size` grid where the metric is area-based.
pub fn evaluate_utility(
    original: &[Trajectory],
    protected: &[Trajectory],
    metric: UtilityMetric,
    model_size: usize,
    eval_size: usize,
) -> Result<f64, EvalError> {
    if original.len() != protected.len() {
        return Err(EvalError::InvalidParameter(format!(
            "paired datasets differ in size: {} vs {}",
            original.len(),
            protected.len()
        )));
    }
    if eval_size == 0 || eval_size > model_size {
        return Err(EvalError::InvalidParameter(format!(
            "evaluation grid size {} outside [1, {}]",
            eval_size, model_size
        )));
    }

    match metric {
        UtilityMetric::QaPoints => Ok(point_query_error(original, protected, model_size, eval_size)),
        UtilityMetric::QaPatterns => {
            Ok(pattern_query_error(original, protected, model_size, eval_size))
        }
        UtilityMetric::AreaPopularity => {
            popularity_correlation(original, protected, model_size, eval_size)
        }
        UtilityMetric::TripError => Ok(trip_error(original, protected, model_size, eval_size)),
        UtilityMetric::DiameterError => Ok(diameter_error(original, protected)),
        UtilityMetric::TripSimilarity => Ok(mean_dtw(original, protected)),
    }
}

/// Projects a model-grid cell onto the coarser evaluation grid.
fn coarsen(cell: GridCell, model_size: usize, eval_size: usize) -> GridCell {
    GridCell::new(
        (cell.x as i64 * eval_size as i64 / model_size as i64) as i32,
        (cell.y as i64 * eval_size as i64 / model_size as i64) as i32,
    )
}

/// Normalized visit counts per evaluation-grid cell.
fn cell_histogram(
    dataset: &[Trajectory],
    model_size: usize,
    eval_size: usize,
) -> HashMap<GridCell, f64> {
    let mut counts: HashMap<GridCell, f64> = HashMap::new();
    let mut total = 0.0;
    for trajectory in dataset {
        for point in trajectory {
            *counts
                .entry(coarsen(point.cell, model_size, eval_size))
                .or_insert(0.0) += 1.0;
            total += 1.0;
        }
    }
    if total > 0.0 {
        for value in counts.values_mut() {
            *value /= total;
        }
    }
    counts
}

fn point_query_error(
    original: &[Trajectory],
    protected: &[Trajectory],
    model_size: usize,
    eval_size: usize,
) -> f64 {
    let orig = cell_histogram(original, model_size, eval_size);
    let prot = cell_histogram(protected, model_size, eval_size);

    let mut error = 0.0;
    for x in 0..eval_size as i32 {
        for y in 0..eval_size as i32 {
            let cell = GridCell::new(x, y);
            let a = orig.get(&cell).copied().unwrap_or(0.0);
            let b = prot.get(&cell).copied().unwrap_or(0.0);
            error += (a - b).abs();
        }
    }
    error / (eval_size * eval_size) as f64
}

/// Normalized counts of consecutive coarse-cell movement patterns.
fn pattern_histogram(
    dataset: &[Trajectory],
    model_size: usize,
    eval_size: usize,
) -> HashMap<(GridCell, GridCell), f64> {
    let mut counts: HashMap<(GridCell, GridCell), f64> = HashMap::new();
    let mut total = 0.0;
    for trajectory in dataset {
        for pair in trajectory.windows(2) {
            let key = (
                coarsen(pair[0].cell, model_size, eval_size),
                coarsen(pair[1].cell, model_size, eval_size),
            );
            *counts.entry(key).or_insert(0.0) += 1.0;
            total += 1.0;
        }
    }
    if total > 0.0 {
        for value in counts.values_mut() {
            *value /= total;
        }
    }
    counts
}

fn pattern_query_error(
    original: &[Trajectory],
    protected: &[Trajectory],
    model_size: usize,
    eval_size: usize,
) -> f64 {
    let orig = pattern_histogram(original, model_size, eval_size);
    let prot = pattern_histogram(protected, model_size, eval_size);

    let keys: HashSet<_> = orig.keys().chain(prot.keys()).collect();
    if keys.is_empty() {
        return 0.0;
    }
    let error: f64 = keys
        .iter()
        .map(|key| {
            let a = orig.get(*key).copied().unwrap_or(0.0);
            let b = prot.get(*key).copied().unwrap_or(0.0);
            (a - b).abs()
        })
        .sum();
    error / keys.len() as f64
}

fn popularity_correlation(
    original: &[Trajectory],
    protected: &[Trajectory],
    model_size: usize,
    eval_size: usize,
) -> Result<f64, EvalError> {
    let orig = cell_histogram(original, model_size, eval_size);
    let prot = cell_histogram(protected, model_size, eval_size);

    let mut a = Vec::with_capacity(eval_size * eval_size);
    let mut b = Vec::with_capacity(eval_size * eval_size);
    for x in 0..eval_size as i32 {
        for y in 0..eval_size as i32 {
            let cell = GridCell::new(x, y);
            a.push(orig.get(&cell).copied().unwrap_or(0.0));
            b.push(prot.get(&cell).copied().unwrap_or(0.0));
        }
    }
    kendall_tau(&a, &b)
}

/// Kendall tau-a: pairwise concordance over all index pairs.
fn kendall_tau(a: &[f64], b: &[f64]) -> Result<f64, EvalError> {
    let n = a.len();
    if n < 2 {
        return Err(EvalError::InvalidParameter(
            "rank correlation needs at least 2 observations".into(),
        ));
    }

    let mut concordant = 0i64;
    let mut discordant = 0i64;
    for i in 0..n {
        for j in (i + 1)..n {
            let da = a[i] - a[j];
            let db = b[i] - b[j];
            let product = da * db;
            if product > 0.0 {
                concordant += 1;
            } else if product < 0.0 {
                discordant += 1;
            }
        }
    }
    let pairs = (n * (n - 1) / 2) as f64;
    Ok((concordant - discordant) as f64 / pairs)
}

/// Normalized distribution of (first cell, last cell) trips.
fn trip_histogram(
    dataset: &[Trajectory],
    model_size: usize,
    eval_size: usize,
) -> HashMap<(GridCell, GridCell), f64> {
    let mut counts: HashMap<(GridCell, GridCell), f64> = HashMap::new();
    let mut total = 0.0;
    for trajectory in dataset {
        if let (Some(first), Some(last)) = (trajectory.first(), trajectory.last()) {
            let key = (
                coarsen(first.cell, model_size, eval_size),
                coarsen(last.cell, model_size, eval_size),
            );
            *counts.entry(key).or_insert(0.0) += 1.0;
            total += 1.0;
        }
    }
    if total > 0.0 {
        for value in counts.values_mut() {
            *value /= total;
        }
    }
    counts
}

fn trip_error(
    original: &[Trajectory],
    protected: &[Trajectory],
    model_size: usize,
    eval_size: usize,
) -> f64 {
    let orig = trip_histogram(original, model_size, eval_size);
    let prot = trip_histogram(protected, model_size, eval_size);

    let keys: HashSet<_> = orig.keys().chain(prot.keys()).collect();
    if keys.is_empty() {
        return 0.0;
    }
    let error: f64 = keys
        .iter()
        .map(|key| {
            let a = orig.get(*key).copied().unwrap_or(0.0);
            let b = prot.get(*key).copied().unwrap_or(0.0);
            (a - b).abs()
        })
        .sum();
    error / keys.len() as f64
}

/// Largest pairwise distance between any two cells of a trajectory.
fn diameter(trajectory: &Trajectory) -> f64 {
    let mut max = 0.0f64;
    for i in 0..trajectory.len() {
        for j in (i + 1)..trajectory.len() {
            max = max.max(distance::euclidean(trajectory[i].cell, trajectory[j].cell));
        }
    }
    max
}

fn diameter_error(original: &[Trajectory], protected: &[Trajectory]) -> f64 {
    if original.is_empty() {
        return 0.0;
    }
    let total: f64 = original
        .iter()
        .zip(protected)
        .map(|(a, b)| (diameter(a) - diameter(b)).abs())
        .sum();
    total / original.len() as f64
}

/// Dynamic time warping distance between two cell sequences,
/// full O(n·m) dynamic program over Euclidean step costs.
fn dtw(a: &Trajectory, b: &Trajectory) -> f64 {
    if a.is_empty() || b.is_empty() {
        return if a.len() == b.len() { 0.0 } else { f64::INFINITY };
    }

    let n = a.len();
    let m = b.len();
    let mut prev = vec![f64::INFINITY; m + 1];
    let mut curr = vec![f64::INFINITY; m + 1];
    prev[0] = 0.0;

    for i in 1..=n {
        curr[0] = f64::INFINITY;
        for j in 1..=m {
            let cost = distance::euclidean(a[i - 1].cell, b[j - 1].cell);
            curr[j] = cost + prev[j].min(curr[j - 1]).min(prev[j - 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

fn mean_dtw(original: &[Trajectory], protected: &[Trajectory]) -> f64 {
    if original.is_empty() {
        return 0.0;
    }
    let total: f64 = original.iter().zip(protected).map(|(a, b)| dtw(a, b)).sum();
    total / original.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use traceprint_core::TrajectoryPoint;

    fn trajectory(cells: &[(i32, i32)]) -> Trajectory {
        cells
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| TrajectoryPoint::new(GridCell::new(x, y), i as f64))
            .collect()
    }

    #[test]
    fn test_identical_datasets_zero_error() {
        let data = vec![trajectory(&[(0, 0), (1, 1), (2, 2)])];
        for metric in [
            UtilityMetric::QaPoints,
            UtilityMetric::QaPatterns,
            UtilityMetric::TripError,
            UtilityMetric::DiameterError,
            UtilityMetric::TripSimilarity,
        ] {
            let error = evaluate_utility(&data, &data, metric, 10, 5).unwrap();
            assert_eq!(error, 0.0, "metric {:?}", metric);
        }
    }

    #[test]
    fn test_identical_datasets_full_rank_correlation() {
        // Uneven popularity so the ranking is not degenerate.
        let data = vec![trajectory(&[(0, 0), (0, 0), (0, 1), (9, 9)])];
        let tau = evaluate_utility(&data, &data, UtilityMetric::AreaPopularity, 10, 2).unwrap();
        assert!(tau > 0.0);
    }

    #[test]
    fn test_mismatched_datasets_rejected() {
        let a = vec![trajectory(&[(0, 0)])];
        assert!(matches!(
            evaluate_utility(&a, &[], UtilityMetric::QaPoints, 10, 5),
            Err(EvalError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_bad_eval_grid_rejected() {
        let a = vec![trajectory(&[(0, 0)])];
        assert!(matches!(
            evaluate_utility(&a, &a, UtilityMetric::QaPoints, 10, 0),
            Err(EvalError::InvalidParameter(_))
        ));
        assert!(matches!(
            evaluate_utility(&a, &a, UtilityMetric::QaPoints, 10, 20),
            Err(EvalError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_kendall_tau_extremes() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let reversed = [4.0, 3.0, 2.0, 1.0];
        assert_eq!(kendall_tau(&a, &a).unwrap(), 1.0);
        assert_eq!(kendall_tau(&a, &reversed).unwrap(), -1.0);
    }

    #[test]
    fn test_dtw_identity_and_shift() {
        let a = trajectory(&[(0, 0), (1, 0), (2, 0)]);
        let b = trajectory(&[(0, 1), (1, 1), (2, 1)]);
        assert_eq!(dtw(&a, &a), 0.0);
        // Each of the three alignment steps costs exactly 1.
        assert_eq!(dtw(&a, &b), 3.0);
    }

    #[test]
    fn test_diameter() {
        let t = trajectory(&[(0, 0), (3, 4), (1, 1)]);
        assert_eq!(diameter(&t), 5.0);
    }

    #[test]
    fn test_point_query_error_disjoint() {
        let a = vec![trajectory(&[(0, 0), (0, 0)])];
        let b = vec![trajectory(&[(9, 9), (9, 9)])];
        // Mass 1.0 in one coarse cell vs another: total error 2.0
        // spread over the 4 evaluation cells.
        let error = evaluate_utility(&a, &b, UtilityMetric::QaPoints, 10, 2).unwrap();
        assert_eq!(error, 0.5);
    }
}
