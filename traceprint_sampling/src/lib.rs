//! Sampling primitives for trajectory fingerprinting.
//!
//! Every draw in the fingerprinting pipeline flows through this crate,
//! and every entry point takes a caller-supplied `rand::Rng`. By
//! deriving all entropy from injected, seeded generators, any trial
//! becomes reproducible from its seed number, and concurrent trials
//! with distinct generators stay statistically independent.

mod error;

pub use error::SampleError;

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::Rng;
use std::collections::HashMap;
use std::hash::Hash;

/// Outcome of a truth-biased draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw<K> {
    /// The chosen value (the truth, or a substitute).
    pub value: K,

    /// Whether the value was substituted away from the truth.
    pub substituted: bool,
}

/// Draws `k` distinct items from `population` uniformly, without
/// replacement.
pub fn sample_count<T: Clone, R: Rng + ?Sized>(
    population: &[T],
    k: usize,
    rng: &mut R,
) -> Result<Vec<T>, SampleError> {
    let picked = sample_indices(population.len(), k, rng)?;
    Ok(picked.into_iter().map(|i| population[i].clone()).collect())
}

/// Draws `k` distinct indices from `0..n` uniformly, without
/// replacement.
pub fn sample_indices<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    rng: &mut R,
) -> Result<Vec<usize>, SampleError> {
    if k > n {
        return Err(SampleError::NotEnoughItems {
            requested: k,
            available: n,
        });
    }
    Ok(index::sample(rng, n, k).into_vec())
}

/// Truth-biased weighted draw.
///
/// With probability `1 − p` returns `truth` unchanged; with
/// probability `p` draws a value from `distribution`, weighted by its
/// probabilities, and marks it substituted.
///
/// An empty or zero-weight distribution falls back to the truth,
/// unsubstituted: the candidate set handed in by the fingerprinting
/// loop is legitimately empty whenever no transition candidate
/// approaches the true cell, and the draw must stay total there.
///
/// Entries are ordered by key before the weighted draw so that a
/// seeded generator yields the same value regardless of the map's
/// internal iteration order.
pub fn sample_with_truth<K, R>(
    distribution: &HashMap<K, f64>,
    truth: K,
    p: f64,
    rng: &mut R,
) -> Result<Draw<K>, SampleError>
where
    K: Copy + Eq + Ord + Hash,
    R: Rng + ?Sized,
{
    if !(0.0..=1.0).contains(&p) {
        return Err(SampleError::InvalidProbability(p));
    }

    if rng.gen::<f64>() >= p {
        return Ok(Draw {
            value: truth,
            substituted: false,
        });
    }

    let mut entries: Vec<(K, f64)> = distribution
        .iter()
        .map(|(k, w)| (*k, *w))
        .filter(|(_, w)| *w > 0.0)
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    if entries.is_empty() {
        return Ok(Draw {
            value: truth,
            substituted: false,
        });
    }

    let weights = WeightedIndex::new(entries.iter().map(|(_, w)| *w))
        .map_err(|_| SampleError::DegenerateDistribution)?;
    let value = entries[weights.sample(rng)].0;

    Ok(Draw {
        value,
        substituted: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sample_count_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let population: Vec<u32> = (0..100).collect();
        let picked = sample_count(&population, 10, &mut rng).unwrap();

        assert_eq!(picked.len(), 10);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 10, "draws must be distinct");
    }

    #[test]
    fn test_sample_count_too_many() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let population = [1, 2, 3];
        let result = sample_count(&population, 4, &mut rng);
        assert!(matches!(
            result,
            Err(SampleError::NotEnoughItems {
                requested: 4,
                available: 3
            })
        ));
    }

    #[test]
    fn test_sample_indices_full_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut picked = sample_indices(5, 5, &mut rng).unwrap();
        picked.sort_unstable();
        assert_eq!(picked, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_truth_bias_zero_p_always_truth() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut dist = HashMap::new();
        dist.insert(1u32, 0.5);
        dist.insert(2u32, 0.5);

        for _ in 0..100 {
            let draw = sample_with_truth(&dist, 9u32, 0.0, &mut rng).unwrap();
            assert_eq!(draw.value, 9);
            assert!(!draw.substituted);
        }
    }

    #[test]
    fn test_truth_bias_one_p_always_substitutes() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut dist = HashMap::new();
        dist.insert(1u32, 0.25);
        dist.insert(2u32, 0.75);

        for _ in 0..100 {
            let draw = sample_with_truth(&dist, 9u32, 1.0, &mut rng).unwrap();
            assert!(draw.substituted);
            assert!(draw.value == 1 || draw.value == 2);
        }
    }

    #[test]
    fn test_truth_bias_empty_distribution_falls_back() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let dist: HashMap<u32, f64> = HashMap::new();

        let draw = sample_with_truth(&dist, 9u32, 1.0, &mut rng).unwrap();
        assert_eq!(draw.value, 9);
        assert!(!draw.substituted);
    }

    #[test]
    fn test_truth_bias_invalid_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let dist: HashMap<u32, f64> = HashMap::new();
        assert!(matches!(
            sample_with_truth(&dist, 9u32, -0.1, &mut rng),
            Err(SampleError::InvalidProbability(_))
        ));
        assert!(matches!(
            sample_with_truth(&dist, 9u32, 1.5, &mut rng),
            Err(SampleError::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_truth_bias_substitution_rate() {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let mut dist = HashMap::new();
        dist.insert(1u32, 1.0);

        let p = 0.3;
        let trials = 20_000;
        let mut substituted = 0usize;
        for _ in 0..trials {
            if sample_with_truth(&dist, 9u32, p, &mut rng).unwrap().substituted {
                substituted += 1;
            }
        }
        let rate = substituted as f64 / trials as f64;
        assert!((rate - p).abs() < 0.02, "rate {} too far from {}", rate, p);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut dist = HashMap::new();
        for k in 0..50u32 {
            dist.insert(k, 1.0 + k as f64);
        }

        let mut a = ChaCha8Rng::seed_from_u64(99);
        let mut b = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..200 {
            let da = sample_with_truth(&dist, 0u32, 0.8, &mut a).unwrap();
            let db = sample_with_truth(&dist, 0u32, 0.8, &mut b).unwrap();
            assert_eq!(da, db);
        }
    }
}
