//! Attack simulation: how a leaked copy is constructed from the
//! distributed fingerprinted copies before it reaches the detector.

use crate::error::EvalError;
use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use traceprint_core::{CorrelationModel, Grid, GridCell, Trajectory, TrajectoryPoint};
use traceprint_sampling::sample_with_truth;

/// Attack types the harness can simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum Attack {
    /// One leaked copy, a fraction of positions replaced by uniform
    /// neighbors.
    RandomDistortion,

    /// One leaked copy, a fraction of positions resampled through the
    /// public correlation model.
    Correlation,

    /// Several colluding parties merge their copies by per-position
    /// majority vote.
    MajorityCollusion,

    /// Collusion that randomizes among the colluders' cells with an
    /// estimated fingerprinting probability.
    ProbabilisticCollusion,
}

impl Attack {
    /// True for attacks that leak more than one party's copy.
    pub fn is_collusion(&self) -> bool {
        matches!(self, Attack::MajorityCollusion | Attack::ProbabilisticCollusion)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Attack::RandomDistortion => "random_distortion",
            Attack::Correlation => "correlation",
            Attack::MajorityCollusion => "majority_collusion",
            Attack::ProbabilisticCollusion => "probabilistic_collusion",
        }
    }
}

/// Knobs shared by the attack family.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttackParams {
    /// Fraction of positions a single-copy attacker perturbs.
    pub attack_ratio: f64,

    /// Number of colluding parties for collusion attacks.
    pub collusion_count: usize,

    /// Attacker's estimate of the fingerprinting probability, needed
    /// by the probabilistic collusion attack.
    pub p_estimate: Option<f64>,
}

impl Default for AttackParams {
    fn default() -> Self {
        Self {
            attack_ratio: 0.8,
            collusion_count: 3,
            p_estimate: None,
        }
    }
}

impl AttackParams {
    /// Contract checks at the harness boundary.
    pub fn validate(&self, attack: Attack) -> Result<(), EvalError> {
        if !(0.0..=1.0).contains(&self.attack_ratio) {
            return Err(EvalError::InvalidParameter(format!(
                "attack_ratio {} outside [0, 1]",
                self.attack_ratio
            )));
        }
        if attack.is_collusion() && self.collusion_count < 2 {
            return Err(EvalError::InvalidParameter(format!(
                "collusion requires at least 2 parties, got {}",
                self.collusion_count
            )));
        }
        if attack == Attack::ProbabilisticCollusion {
            match self.p_estimate {
                Some(p) if (0.0..=1.0).contains(&p) => {}
                Some(p) => {
                    return Err(EvalError::InvalidParameter(format!(
                        "p_estimate {} outside [0, 1]",
                        p
                    )))
                }
                None => {
                    return Err(EvalError::UnsupportedOption(
                        "probabilistic collusion without a p_estimate".into(),
                    ))
                }
            }
        }
        Ok(())
    }
}

/// Builds the leaked trajectory an attacker releases, from the copies
/// held by the leaking parties (one copy for single-party attacks,
/// `collusion_count` for collusion).
pub fn forge_leak<R: Rng + ?Sized>(
    attack: Attack,
    leaked_copies: &[&Trajectory],
    model: &CorrelationModel,
    params: &AttackParams,
    rng: &mut R,
) -> Result<Trajectory, EvalError> {
    params.validate(attack)?;
    if leaked_copies.is_empty() {
        return Err(EvalError::InvalidParameter(
            "attack requires at least one leaked copy".into(),
        ));
    }

    match attack {
        Attack::RandomDistortion => Ok(random_distortion(leaked_copies[0], model.grid(), params, rng)),
        Attack::Correlation => correlation_distortion(leaked_copies[0], model, params, rng),
        Attack::MajorityCollusion => Ok(merge_majority(leaked_copies)),
        Attack::ProbabilisticCollusion => {
            // validate() guarantees presence and range.
            let p_estimate = params.p_estimate.unwrap_or_default();
            Ok(merge_probabilistic(leaked_copies, p_estimate, rng))
        }
    }
}

fn random_distortion<R: Rng + ?Sized>(
    copy: &Trajectory,
    grid: Grid,
    params: &AttackParams,
    rng: &mut R,
) -> Trajectory {
    copy.iter()
        .map(|point| {
            let mut forged = *point;
            if rng.gen::<f64>() < params.attack_ratio {
                let neighbors = grid.neighborhood(point.cell, 1);
                forged.cell = neighbors[rng.gen_range(0..neighbors.len())];
            }
            forged
        })
        .collect()
}

fn correlation_distortion<R: Rng + ?Sized>(
    copy: &Trajectory,
    model: &CorrelationModel,
    params: &AttackParams,
    rng: &mut R,
) -> Result<Trajectory, EvalError> {
    let mut forged = Trajectory::with_capacity(copy.len());
    let mut prev: Option<GridCell> = None;

    for point in copy {
        let mut cell = point.cell;
        if let Some(prev_cell) = prev {
            let distribution = model.transition_distribution(prev_cell);
            let draw = sample_with_truth(&distribution, cell, params.attack_ratio, rng)?;
            cell = draw.value;
        }
        prev = Some(cell);
        forged.push(TrajectoryPoint::new(cell, point.timestamp));
    }

    Ok(forged)
}

/// Per-position majority vote across colluders; ties go to the
/// smallest cell so the merge stays deterministic.
fn merge_majority(copies: &[&Trajectory]) -> Trajectory {
    let length = copies[0].len();
    let mut merged = Trajectory::with_capacity(length);

    for i in 0..length {
        let mut votes: HashMap<GridCell, usize> = HashMap::new();
        for copy in copies {
            *votes.entry(copy[i].cell).or_insert(0) += 1;
        }
        let winner = votes
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(cell, _)| cell)
            .expect("at least one colluder");
        merged.push(TrajectoryPoint::new(
            winner,
            copies[0][i].timestamp,
        ));
    }
    merged
}

/// With probability `p_estimate` pick a uniformly random colluder's
/// cell, otherwise keep the majority cell. Positions the colluders
/// agree on (likely unfingerprinted, under their estimate) are never
/// changed by the random branch.
fn merge_probabilistic<R: Rng + ?Sized>(
    copies: &[&Trajectory],
    p_estimate: f64,
    rng: &mut R,
) -> Trajectory {
    let majority = merge_majority(copies);
    majority
        .into_iter()
        .enumerate()
        .map(|(i, mut point)| {
            if rng.gen::<f64>() < p_estimate {
                let pick = rng.gen_range(0..copies.len());
                point.cell = copies[pick][i].cell;
            }
            point
        })
        .collect()
}
