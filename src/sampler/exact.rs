use super::{OracleError, SampleSet, Sampler, SamplerConfig};
use crate::model::{BinaryQuadraticModel, Vartype};
use bitvec::vec::BitVec;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::time::Instant;

/// The largest model `ExactSolver` will enumerate.
pub const MAX_EXACT_VARS: usize = 22;

/// Tries every assignment. Returns the `num_reads` lowest-energy states, so the first sample
/// is always a true ground state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSolver;

/// A state packed into bits, with its energy.
type Scored = (f64, u64);

fn compare(a: &Scored, b: &Scored) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

/// Insert `item` into the sorted `best`, keeping only the `keep` smallest.
fn keep_best(mut best: Vec<Scored>, item: Scored, keep: usize) -> Vec<Scored> {
    if best.len() < keep || best.last().map(|last| compare(&item, last).is_lt()) == Some(true) {
        let pos = best.partition_point(|other| compare(other, &item).is_lt());
        best.insert(pos, item);
        best.truncate(keep);
    }
    best
}

impl Sampler for ExactSolver {
    fn name(&self) -> String {
        "ExactSolver".to_owned()
    }

    fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        config: &SamplerConfig,
    ) -> Result<SampleSet, OracleError> {
        config.validate()?;
        let num_vars = bqm.num_variables();
        if num_vars > MAX_EXACT_VARS {
            return Err(OracleError::TooLarge {
                num_vars,
                max: MAX_EXACT_VARS,
            });
        }
        let start_time = Instant::now();

        let binary = bqm.change_vartype(Vartype::Binary);
        let linear = binary.linear_biases();
        let adjacency = binary.adjacency();
        let offset = binary.offset();
        let energy = |bits: u64| -> f64 {
            let mut energy = offset;
            for (i, bias) in linear.iter().enumerate() {
                if bits >> i & 1 == 1 {
                    energy += bias;
                    // Count each interaction once, from its higher end
                    for (j, coupling) in &adjacency[i] {
                        if *j < i && bits >> j & 1 == 1 {
                            energy += coupling;
                        }
                    }
                }
            }
            energy
        };

        let keep = config.num_reads;
        let best = (0..1u64 << num_vars)
            .into_par_iter()
            .fold(Vec::new, |best, bits| keep_best(best, (energy(bits), bits), keep))
            .reduce(Vec::new, |a, b| {
                b.into_iter().fold(a, |best, item| keep_best(best, item, keep))
            });

        if config.log_steps {
            eprintln!(
                "[{}] {}: enumerated {} states in {}ms",
                config.label,
                self.name(),
                1u64 << num_vars,
                start_time.elapsed().as_millis()
            );
        }

        let states = best.into_iter().map(|(_, bits)| {
            (0..num_vars)
                .map(|i| bits >> i & 1 == 1)
                .collect::<BitVec>()
        });
        Ok(SampleSet::from_states(bqm, states))
    }
}

#[cfg(test)]
use crate::label::Variable;
#[cfg(test)]
use crate::penalty::combinations;

#[test]
fn test_keep_best() {
    let mut best = Vec::new();
    for item in [(3.0, 0), (1.0, 1), (2.0, 2), (1.0, 0), (0.5, 9)] {
        best = keep_best(best, item, 3);
    }
    assert_eq!(best, [(0.5, 9), (1.0, 0), (1.0, 1)]);
}

#[test]
fn test_exact_one_hot() {
    let vars = (0..4).map(|d| Variable::new(0, 0, d)).collect::<Vec<_>>();
    let bqm = combinations(&vars, 1, 1.0);
    let config = SamplerConfig {
        num_reads: 5,
        ..SamplerConfig::default()
    };
    let samples = ExactSolver.sample(&bqm, &config).unwrap();
    assert_eq!(samples.len(), 5);
    // Four ground states, one per digit, then an excited state
    for sample in &samples.samples()[..4] {
        assert_eq!(sample.energy, 0.0);
        assert_eq!(sample.assignment.values().filter(|t| **t).count(), 1);
    }
    assert_eq!(samples.samples()[4].energy, 1.0);
}

#[test]
fn test_exact_spin_model() {
    let vars = (0..3).map(|d| Variable::new(0, d, 0)).collect::<Vec<_>>();
    let bqm = combinations(&vars, 3, 1.0).change_vartype(Vartype::Spin);
    let samples = ExactSolver.sample(&bqm, &SamplerConfig::default()).unwrap();
    let best = samples.first().unwrap();
    assert!(best.energy.abs() < 1e-9);
    assert!(best.assignment.values().all(|t| *t));
}

#[test]
fn test_exact_too_large() {
    let vars = (0..MAX_EXACT_VARS + 1)
        .map(|i| Variable::new(i, 0, 0))
        .collect::<Vec<_>>();
    let bqm = combinations(&vars, 1, 1.0);
    assert_eq!(
        ExactSolver.sample(&bqm, &SamplerConfig::default()),
        Err(OracleError::TooLarge {
            num_vars: MAX_EXACT_VARS + 1,
            max: MAX_EXACT_VARS
        })
    );
}
