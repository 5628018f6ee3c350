//! Detection-accuracy trials: distribute fingerprinted copies, leak
//! one (or a colluding merge), and check whether the detector accuses
//! a leaking party.

use crate::attack::{forge_leak, Attack, AttackParams};
use crate::error::EvalError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};
use traceprint_core::{similarity_detection, CorrelationModel, Fingerprinter, Trajectory};
use traceprint_sampling::{sample_count, sample_indices};

/// Odd multiplier for deriving per-trial seeds from the master seed,
/// so trials are independent but reproducible.
const SEED_SPLIT: u64 = 0x517cc1b727220a95;

/// Parameters of one detection-accuracy experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialSettings {
    /// Independent trials (fresh copies each).
    pub trials: usize,

    /// Attack repetitions per trial over the same copies.
    pub sub_trials: usize,

    /// Trajectories drawn from the dataset per trial.
    pub trajectory_count: usize,

    /// Parties each receiving one fingerprinted copy.
    pub party_count: usize,

    /// Positions kept per trajectory.
    pub trajectory_length: usize,

    /// Target fingerprinting probability `p`.
    pub fp_ratio: f64,

    /// Transition-plausibility threshold.
    pub tau: f64,

    /// Controller adjustment factor.
    pub theta: f64,

    /// Attack used to construct the leak.
    pub attack: Attack,

    /// Attack-family knobs.
    pub attack_params: AttackParams,
}

impl TrialSettings {
    fn validate(&self, dataset_len: usize) -> Result<(), EvalError> {
        if self.party_count < 2 {
            return Err(EvalError::InvalidParameter(format!(
                "need at least 2 parties, got {}",
                self.party_count
            )));
        }
        if self.trials == 0 || self.sub_trials == 0 {
            return Err(EvalError::InvalidParameter(
                "trial and sub-trial counts must be positive".into(),
            ));
        }
        if self.trajectory_count == 0 || self.trajectory_length == 0 {
            return Err(EvalError::InvalidParameter(
                "trajectory count and length must be positive".into(),
            ));
        }
        if dataset_len < self.trajectory_count {
            return Err(EvalError::InvalidParameter(format!(
                "dataset holds {} trajectories, trial needs {}",
                dataset_len, self.trajectory_count
            )));
        }
        if self.attack.is_collusion() && self.attack_params.collusion_count > self.party_count {
            return Err(EvalError::InvalidParameter(format!(
                "{} colluders exceed {} parties",
                self.attack_params.collusion_count, self.party_count
            )));
        }
        self.attack_params.validate(self.attack)
    }
}

/// Outcome of one trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: usize,
    pub seed: u64,
    pub hits: usize,
    pub attempts: usize,
    pub accuracy: f64,
}

/// Aggregated outcome of an experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub attack: Attack,
    pub fp_ratio: f64,
    pub party_count: usize,
    pub trials: Vec<TrialResult>,
    pub mean_accuracy: f64,
}

/// Runs the full experiment: `trials` independent rounds of copy
/// distribution, each attacked `sub_trials` times.
///
/// Detection accuracy is the fraction of attacks whose accused party
/// really was among the leaking parties.
pub fn evaluate_detection_accuracy(
    data: &[Trajectory],
    model: &CorrelationModel,
    settings: &TrialSettings,
    master_seed: u64,
) -> Result<AccuracyReport, EvalError> {
    settings.validate(data.len())?;

    info!(
        attack = settings.attack.name(),
        trials = settings.trials,
        parties = settings.party_count,
        fp_ratio = settings.fp_ratio,
        "running detection-accuracy experiment"
    );

    let embedder = Fingerprinter::new(model, settings.tau, settings.fp_ratio, settings.theta)?;
    let mut trials = Vec::with_capacity(settings.trials);

    for trial in 0..settings.trials {
        let seed = master_seed ^ (trial as u64 + 1).wrapping_mul(SEED_SPLIT);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let selected = sample_count(data, settings.trajectory_count, &mut rng)?;
        let selected: Vec<Trajectory> = selected
            .into_iter()
            .map(|t| {
                let len = t.len().min(settings.trajectory_length);
                t[..len].to_vec()
            })
            .collect();

        // copies[party][trajectory]
        let mut copies: Vec<Vec<Trajectory>> = Vec::with_capacity(settings.party_count);
        for _ in 0..settings.party_count {
            let mut party_copies = Vec::with_capacity(selected.len());
            for trajectory in &selected {
                party_copies.push(embedder.fingerprint(trajectory, &mut rng)?.trajectory);
            }
            copies.push(party_copies);
        }

        let mut hits = 0usize;
        let mut attempts = 0usize;
        for _ in 0..settings.sub_trials {
            let leak_count = if settings.attack.is_collusion() {
                settings.attack_params.collusion_count
            } else {
                1
            };
            let leakers: HashSet<usize> =
                sample_indices(settings.party_count, leak_count, &mut rng)?
                    .into_iter()
                    .collect();

            for t in 0..selected.len() {
                let leaked: Vec<&Trajectory> =
                    leakers.iter().map(|party| &copies[*party][t]).collect();
                let leak = forge_leak(
                    settings.attack,
                    &leaked,
                    model,
                    &settings.attack_params,
                    &mut rng,
                )?;

                let candidates: Vec<Trajectory> =
                    copies.iter().map(|party| party[t].clone()).collect();
                let detection = similarity_detection(&leak, &candidates)?;

                if leakers.contains(&detection.accused) {
                    hits += 1;
                }
                attempts += 1;
            }
        }

        let accuracy = hits as f64 / attempts as f64;
        debug!(trial, seed, accuracy, "trial finished");
        trials.push(TrialResult {
            trial,
            seed,
            hits,
            attempts,
            accuracy,
        });
    }

    let mean_accuracy = trials.iter().map(|t| t.accuracy).sum::<f64>() / trials.len() as f64;
    info!(mean_accuracy, "experiment finished");

    Ok(AccuracyReport {
        attack: settings.attack,
        fp_ratio: settings.fp_ratio,
        party_count: settings.party_count,
        trials,
        mean_accuracy,
    })
}
