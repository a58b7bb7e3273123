//! Oracles that search for low-energy assignments of a `BinaryQuadraticModel`.
//!
//! The compiler and decoder only rely on the [`Sampler`] trait: hand it a model and a
//! [`SamplerConfig`], get back a [`SampleSet`] ranked by energy. Two backends are provided:
//! [`ExactSolver`] for models small enough to enumerate, and [`SimulatedAnnealing`] for
//! everything else.

mod anneal;
mod exact;

pub use anneal::SimulatedAnnealing;
pub use exact::{ExactSolver, MAX_EXACT_VARS};

use crate::model::{Assignment, BinaryQuadraticModel};
use bitvec::vec::BitVec;
use std::collections::BTreeMap;
use std::fmt;

/// A combinatorial oracle.
pub trait Sampler {
    /// A name for this sampler, for logging.
    fn name(&self) -> String;

    /// Find low-energy assignments of `bqm`. There's no guarantee that the best one found is
    /// a ground state.
    fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        config: &SamplerConfig,
    ) -> Result<SampleSet, OracleError>;
}

/************************
 *     Config           *
 ************************/

/// Budgets for a sampler run.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// How many candidate assignments to return (and, for annealing, how many independent
    /// restarts to run).
    pub num_reads: usize,
    /// Maximum number of outer iterations per restart.
    pub max_iter: usize,
    /// Stop a restart after this many iterations without improvement.
    pub convergence: usize,
    /// Seed for reproducible runs. `None` picks one at random.
    pub seed: Option<u64>,
    /// Shown in log lines.
    pub label: String,
    /// Log after each iteration
    pub log_steps: bool,
}

impl Default for SamplerConfig {
    fn default() -> SamplerConfig {
        SamplerConfig {
            num_reads: 8,
            max_iter: 10,
            convergence: 3,
            seed: None,
            label: "WFC".to_owned(),
            log_steps: false,
        }
    }
}

impl SamplerConfig {
    fn validate(&self) -> Result<(), OracleError> {
        if self.num_reads == 0 {
            return Err(OracleError::InvalidConfig("num_reads must be positive".to_owned()));
        }
        if self.max_iter == 0 {
            return Err(OracleError::InvalidConfig("max_iter must be positive".to_owned()));
        }
        Ok(())
    }
}

/************************
 *     Samples          *
 ************************/

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub assignment: Assignment,
    pub energy: f64,
    /// How many times the sampler arrived at this assignment.
    pub num_occurrences: usize,
}

/// Samples in ascending order of energy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    /// Score each state against `bqm` and rank them. Each state is indexed the same way as
    /// `bqm.variables()`.
    pub fn from_states(
        bqm: &BinaryQuadraticModel,
        states: impl IntoIterator<Item = BitVec>,
    ) -> SampleSet {
        SampleSet::from_assignments(bqm, states.into_iter().map(|s| bqm.assignment(&s)))
    }

    /// Aggregate duplicate assignments, score them against `bqm`, and rank them. Ties are
    /// broken by assignment order, so the ranking is deterministic.
    pub fn from_assignments(
        bqm: &BinaryQuadraticModel,
        assignments: impl IntoIterator<Item = Assignment>,
    ) -> SampleSet {
        let mut counts: BTreeMap<Assignment, usize> = BTreeMap::new();
        for assignment in assignments {
            *counts.entry(assignment).or_insert(0) += 1;
        }
        let mut samples = counts
            .into_iter()
            .map(|(assignment, num_occurrences)| Sample {
                energy: bqm.energy(&assignment),
                assignment,
                num_occurrences,
            })
            .collect::<Vec<_>>();
        samples.sort_by(|a, b| {
            a.energy
                .total_cmp(&b.energy)
                .then_with(|| a.assignment.cmp(&b.assignment))
        });
        SampleSet { samples }
    }

    /// The lowest-energy sample.
    pub fn first(&self) -> Result<&Sample, OracleError> {
        self.samples.first().ok_or(OracleError::EmptySampleSet)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl fmt::Display for SampleSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} samples:", self.samples.len())?;
        for sample in &self.samples {
            write!(f, "    energy {:8.3} x{:<3}", sample.energy, sample.num_occurrences)?;
            for (var, truth) in &sample.assignment {
                if *truth {
                    write!(f, " {}", var)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/************************
 *     Oracle Errors    *
 ************************/

#[derive(Debug, Clone, PartialEq)]
pub enum OracleError {
    /// The sampler produced no samples at all.
    EmptySampleSet,
    /// The model has too many variables for this sampler.
    TooLarge { num_vars: usize, max: usize },
    InvalidConfig(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OracleError::EmptySampleSet => write!(f, "Oracle returned no samples"),
            OracleError::TooLarge { num_vars, max } => write!(
                f,
                "Model has {} variables, but this oracle handles at most {}",
                num_vars, max
            ),
            OracleError::InvalidConfig(msg) => write!(f, "Bad oracle config: {}", msg),
        }
    }
}

impl std::error::Error for OracleError {}

#[cfg(test)]
use crate::label::Variable;
#[cfg(test)]
use crate::model::Vartype;

#[test]
fn test_sample_set_ranking() {
    use bitvec::prelude::*;

    let a = Variable::new(0, 0, 0);
    let b = Variable::new(0, 0, 1);
    let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
    bqm.add_linear(a, 1.0);
    bqm.add_linear(b, -1.0);

    let states = vec![
        bitvec![1, 0],
        bitvec![0, 1],
        bitvec![1, 0],
        bitvec![0, 0],
    ];
    let set = SampleSet::from_states(&bqm, states);
    assert_eq!(set.len(), 3);
    let energies = set.samples().iter().map(|s| s.energy).collect::<Vec<_>>();
    assert_eq!(energies, [-1.0, 0.0, 1.0]);
    assert_eq!(set.samples()[2].num_occurrences, 2);

    let best = set.first().unwrap();
    assert_eq!(best.assignment, Assignment::from([(a, false), (b, true)]));
}

#[test]
fn test_empty_sample_set() {
    assert_eq!(
        SampleSet::default().first(),
        Err(OracleError::EmptySampleSet)
    );
    let config = SamplerConfig {
        num_reads: 0,
        ..SamplerConfig::default()
    };
    assert!(config.validate().is_err());
}
