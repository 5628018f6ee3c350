//! Leak attribution by positional nearest-match voting.

use crate::distance;
use crate::error::CoreError;
use crate::types::TrajectoryPoint;

/// Outcome of a similarity detection pass.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Index of the accused candidate (highest score, lowest index on
    /// ties).
    pub accused: usize,

    /// Accumulated vote share per candidate. Ties at an index award
    /// the vote to every tying candidate, so the vector need not sum
    /// to 1 and a score can exceed the single-winner maximum.
    pub scores: Vec<f64>,
}

/// Attributes a leaked trajectory to the most similar of the
/// position-aligned candidate copies.
///
/// At every time index the squared-Euclidean distance from the leaked
/// point to each candidate's point is computed; all candidates
/// achieving the minimum receive a vote of `1/L`.
pub fn similarity_detection(
    leak: &[TrajectoryPoint],
    candidates: &[Vec<TrajectoryPoint>],
) -> Result<Detection, CoreError> {
    if candidates.is_empty() {
        return Err(CoreError::NoCandidates);
    }
    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.len() != leak.len() {
            return Err(CoreError::LengthMismatch {
                index,
                got: candidate.len(),
                expected: leak.len(),
            });
        }
    }

    let mut scores = vec![0.0; candidates.len()];
    let length = leak.len();

    for (i, leak_point) in leak.iter().enumerate() {
        let distances: Vec<f64> = candidates
            .iter()
            .map(|candidate| distance::sq_euclidean(leak_point.cell, candidate[i].cell))
            .collect();

        let min_distance = distances.iter().copied().fold(f64::INFINITY, f64::min);
        for (j, d) in distances.iter().enumerate() {
            if *d == min_distance {
                scores[j] += 1.0 / length as f64;
            }
        }
    }

    // Strictly-greater comparison keeps the lowest index on ties.
    let mut accused = 0;
    for (j, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[accused] {
            accused = j;
        }
    }

    Ok(Detection { accused, scores })
}
