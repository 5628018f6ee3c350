//! Adaptive probabilistic fingerprint embedding.
//!
//! Perturbs a subset of a trajectory's cells with plausible
//! substitutes drawn through the correlation model, so independently
//! fingerprinted copies of the same trajectory can later be told
//! apart. A windowed proportional controller keeps the long-run
//! substitution rate close to the target probability despite per-step
//! stochastic variance.

use crate::correlation::CorrelationModel;
use crate::error::CoreError;
use crate::types::{GridCell, Trajectory, TrajectoryPoint};
use rand::Rng;
use traceprint_sampling::{sample_with_truth, Draw};

/// A fingerprinted trajectory plus the per-position substitution flags.
#[derive(Debug, Clone)]
pub struct Fingerprinted {
    /// Same length and timestamps as the input; cells possibly
    /// substituted.
    pub trajectory: Trajectory,

    /// `flags[i]` is true iff position `i` was substituted.
    pub flags: Vec<bool>,
}

impl Fingerprinted {
    /// Number of substituted positions.
    pub fn substitution_count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    /// Fraction of substituted positions (0 for an empty trajectory).
    pub fn substitution_rate(&self) -> f64 {
        if self.flags.is_empty() {
            0.0
        } else {
            self.substitution_count() as f64 / self.flags.len() as f64
        }
    }
}

/// Transient controller state for one fingerprinting run.
struct AdaptiveState {
    p_current: f64,
    block_count: usize,
    fp_count: usize,
}

impl AdaptiveState {
    fn new(p: f64) -> Self {
        Self {
            p_current: p,
            block_count: 0,
            fp_count: 0,
        }
    }

    /// Window-end feedback correction: pull the working probability
    /// down when substitutions run ahead of `p * length`, up when they
    /// lag, reset when exactly on target. Clamped at 1.
    fn recalibrate(&mut self, p: f64, theta: f64, length: usize) {
        let expected = p * length as f64;
        if (self.fp_count as f64) > expected {
            self.p_current = p * (1.0 - theta);
        } else if (self.fp_count as f64) < expected {
            self.p_current = p * (1.0 + theta);
        } else {
            self.p_current = p;
        }

        if self.p_current >= 1.0 {
            self.p_current = 1.0;
        }
        self.block_count = 0;
    }
}

/// Chooses the next cell for one step past the first: builds the
/// distance-filtered candidate set out of the previously chosen cell
/// and applies the truth-biased draw over it.
pub fn sample_candidate<R: Rng + ?Sized>(
    prev: GridCell,
    truth: GridCell,
    p: f64,
    tau: f64,
    model: &CorrelationModel,
    rng: &mut R,
) -> Result<Draw<GridCell>, CoreError> {
    let sets = model.candidates(prev, truth, tau, true);
    let filtered = sets.distance_filtered.unwrap_or_default();
    Ok(sample_with_truth(&filtered, truth, p, rng)?)
}

/// Fingerprint embedder bound to a correlation model and a parameter
/// set.
pub struct Fingerprinter<'a> {
    model: &'a CorrelationModel,
    tau: f64,
    p: f64,
    theta: f64,
}

impl<'a> Fingerprinter<'a> {
    /// Creates an embedder with target substitution probability `p`,
    /// transition threshold `tau`, and controller adjustment `theta`.
    pub fn new(
        model: &'a CorrelationModel,
        tau: f64,
        p: f64,
        theta: f64,
    ) -> Result<Self, CoreError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(CoreError::InvalidProbability(p));
        }
        if !(0.0..=1.0).contains(&theta) {
            return Err(CoreError::InvalidTheta(theta));
        }
        Ok(Self {
            model,
            tau,
            p,
            theta,
        })
    }

    /// Embeds a fingerprint into one trajectory.
    ///
    /// Timestamps are carried through untouched and the flag sequence
    /// always has the trajectory's length. Runs of distinct
    /// trajectories share no state; pass an independent generator per
    /// run to keep concurrent trials reproducible.
    pub fn fingerprint<R: Rng + ?Sized>(
        &self,
        trajectory: &[TrajectoryPoint],
        rng: &mut R,
    ) -> Result<Fingerprinted, CoreError> {
        let mut fp_trajectory = Trajectory::with_capacity(trajectory.len());
        let mut flags = Vec::with_capacity(trajectory.len());

        if self.p == 0.0 || trajectory.is_empty() {
            fp_trajectory.extend_from_slice(trajectory);
            flags.resize(trajectory.len(), false);
            return Ok(Fingerprinted {
                trajectory: fp_trajectory,
                flags,
            });
        }

        let window = (1.0 / self.p).ceil() as usize;
        let mut state = AdaptiveState::new(self.p);

        // First position: draw from the emission neighborhood of the
        // true cell.
        let first = trajectory[0];
        let emission = self.model.emission_distribution(first.cell)?;
        let draw = sample_with_truth(&emission, first.cell, state.p_current, rng)?;

        let mut prev_cell = draw.value;
        fp_trajectory.push(TrajectoryPoint::new(draw.value, first.timestamp));
        flags.push(draw.substituted);
        if draw.substituted {
            state.fp_count += 1;
        }
        state.block_count += 1;

        for point in &trajectory[1..] {
            let draw = sample_candidate(
                prev_cell,
                point.cell,
                state.p_current,
                self.tau,
                self.model,
                rng,
            )?;

            prev_cell = draw.value;
            fp_trajectory.push(TrajectoryPoint::new(draw.value, point.timestamp));
            flags.push(draw.substituted);
            if draw.substituted {
                state.fp_count += 1;
            }
            state.block_count += 1;

            if state.block_count >= window {
                state.recalibrate(self.p, self.theta, fp_trajectory.len());
            }
        }

        Ok(Fingerprinted {
            trajectory: fp_trajectory,
            flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GpsBounds};
    use crate::correlation::CorrelationModel;
    use crate::types::GeoPoint;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_config() -> Config {
        Config {
            bounds: GpsBounds {
                lat: [0.0, 10.0],
                lng: [0.0, 10.0],
            },
            grid_size: 10,
            neighbor_range: 1,
            ..Config::default()
        }
    }

    /// Model where (5,5) carries emission mass but no outgoing
    /// transitions, so fingerprinting a stationary trajectory at
    /// (5,5) exercises the neighborhood fallback and the distance
    /// filter reduces the candidate set to the truth itself: every
    /// position substitutes with probability exactly `p_current`.
    fn test_model(config: &Config) -> CorrelationModel {
        let prior = vec![vec![GeoPoint::new(4.5, 4.5), GeoPoint::new(5.5, 5.5)]];
        CorrelationModel::from_trajectories(&prior, config).unwrap()
    }

    fn stationary_trajectory(len: usize) -> Trajectory {
        (0..len)
            .map(|i| TrajectoryPoint::new(GridCell::new(5, 5), i as f64))
            .collect()
    }

    #[test]
    fn test_zero_p_returns_input_unchanged() {
        let config = test_config();
        let model = test_model(&config);
        let embedder = Fingerprinter::new(&model, 0.0, 0.0, 0.1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let input = stationary_trajectory(17);
        let out = embedder.fingerprint(&input, &mut rng).unwrap();

        assert_eq!(out.trajectory, input);
        assert_eq!(out.flags.len(), 17);
        assert!(out.flags.iter().all(|f| !f));
    }

    #[test]
    fn test_empty_trajectory() {
        let config = test_config();
        let model = test_model(&config);
        let embedder = Fingerprinter::new(&model, 0.0, 0.3, 0.1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let out = embedder.fingerprint(&[], &mut rng).unwrap();
        assert!(out.trajectory.is_empty());
        assert!(out.flags.is_empty());
    }

    #[test]
    fn test_flags_match_length_and_timestamps_preserved() {
        let config = test_config();
        let model = test_model(&config);
        let embedder = Fingerprinter::new(&model, 0.0, 0.5, 0.1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let input = stationary_trajectory(64);
        let out = embedder.fingerprint(&input, &mut rng).unwrap();

        assert_eq!(out.flags.len(), input.len());
        assert_eq!(out.trajectory.len(), input.len());
        for (orig, fp) in input.iter().zip(&out.trajectory) {
            assert_eq!(orig.timestamp, fp.timestamp);
        }
    }

    #[test]
    fn test_unflagged_positions_keep_true_cell() {
        let config = test_config();
        let model = test_model(&config);
        let embedder = Fingerprinter::new(&model, 0.0, 0.4, 0.1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let input = stationary_trajectory(50);
        let out = embedder.fingerprint(&input, &mut rng).unwrap();

        for ((orig, fp), flag) in input.iter().zip(&out.trajectory).zip(&out.flags) {
            if !flag {
                assert_eq!(orig.cell, fp.cell);
            }
        }
    }

    #[test]
    fn test_negative_p_rejected() {
        let config = test_config();
        let model = test_model(&config);
        assert!(matches!(
            Fingerprinter::new(&model, 0.0, -0.1, 0.1),
            Err(CoreError::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_substitution_rate_converges() {
        let config = test_config();
        let model = test_model(&config);
        let p = 0.2;
        let embedder = Fingerprinter::new(&model, 0.0, p, 0.1).unwrap();

        let input = stationary_trajectory(4000);
        let mut rates = Vec::new();
        for seed in 0..5 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let out = embedder.fingerprint(&input, &mut rng).unwrap();
            rates.push(out.substitution_rate());
        }
        let mean: f64 = rates.iter().sum::<f64>() / rates.len() as f64;
        assert!(
            (mean - p).abs() < 0.05,
            "mean substitution rate {} too far from {}",
            mean,
            p
        );
    }

    #[test]
    fn test_same_seed_same_fingerprint() {
        let config = test_config();
        let model = test_model(&config);
        let embedder = Fingerprinter::new(&model, 0.0, 0.3, 0.1).unwrap();
        let input = stationary_trajectory(100);

        let mut a = ChaCha8Rng::seed_from_u64(77);
        let mut b = ChaCha8Rng::seed_from_u64(77);
        let out_a = embedder.fingerprint(&input, &mut a).unwrap();
        let out_b = embedder.fingerprint(&input, &mut b).unwrap();

        assert_eq!(out_a.trajectory, out_b.trajectory);
        assert_eq!(out_a.flags, out_b.flags);
    }

    #[test]
    fn test_no_emission_data_propagates() {
        let config = test_config();
        let model = test_model(&config);
        let embedder = Fingerprinter::new(&model, 0.0, 0.3, 0.1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        // Start far from any emission mass.
        let input = vec![TrajectoryPoint::new(GridCell::new(0, 9), 0.0)];
        assert!(matches!(
            embedder.fingerprint(&input, &mut rng),
            Err(CoreError::NoEmissionData { .. })
        ));
    }
}
