use super::{OracleError, SampleSet, Sampler, SamplerConfig};
use crate::model::{BinaryQuadraticModel, Vartype};
use bitvec::vec::BitVec;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Instant;

/// Metropolis simulated annealing over binary states, with independent restarts run in
/// parallel.
///
/// Each restart runs up to `max_iter` iterations. An iteration is one full cooling schedule
/// of `sweeps` sweeps, starting from the best state seen so far. A restart stops early once
/// `convergence` iterations in a row fail to improve on its best energy.
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    /// Sweeps over all variables per iteration.
    pub sweeps: usize,
    /// Inverse temperatures at the start and end of each iteration. `None` picks them from
    /// the model's biases.
    pub beta_range: Option<(f64, f64)>,
}

impl Default for SimulatedAnnealing {
    fn default() -> SimulatedAnnealing {
        SimulatedAnnealing {
            sweeps: 256,
            beta_range: None,
        }
    }
}

/// The binary model laid out for fast single-flip updates.
struct Problem {
    linear: Vec<f64>,
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl Problem {
    fn new(bqm: &BinaryQuadraticModel) -> Problem {
        let binary = bqm.change_vartype(Vartype::Binary);
        Problem {
            linear: binary.linear_biases().to_vec(),
            adjacency: binary.adjacency(),
        }
    }

    fn len(&self) -> usize {
        self.linear.len()
    }

    /// Pick a schedule where the hottest step accepts the worst single flip half the time, and
    /// the coldest accepts the smallest one 1% of the time.
    fn default_beta_range(&self) -> (f64, f64) {
        let mut max_delta: f64 = 0.0;
        let mut min_delta = f64::INFINITY;
        for (bias, neighbors) in self.linear.iter().zip(&self.adjacency) {
            let mut delta = bias.abs();
            for (_, coupling) in neighbors {
                delta += coupling.abs();
            }
            max_delta = max_delta.max(delta);
            for b in neighbors.iter().map(|(_, b)| b).chain([bias]) {
                if *b != 0.0 {
                    min_delta = min_delta.min(b.abs());
                }
            }
        }
        if max_delta == 0.0 || !min_delta.is_finite() {
            return (1.0, 1.0);
        }
        ((2.0f64).ln() / max_delta, (100.0f64).ln() / min_delta)
    }

    /// Run one restart; return its best state.
    fn anneal(
        &self,
        rng: &mut SmallRng,
        sweeps: usize,
        (beta_hot, beta_cold): (f64, f64),
        config: &SamplerConfig,
        read: usize,
    ) -> BitVec {
        let n = self.len();
        let mut state = (0..n).map(|_| rng.gen::<bool>()).collect::<BitVec>();

        // field[i] = linear[i] + sum_j coupling_ij * x_j: the energy change from turning i on
        let mut field = self.linear.clone();
        for i in 0..n {
            if state[i] {
                for (j, coupling) in &self.adjacency[i] {
                    field[*j] += coupling;
                }
            }
        }

        // Energies are relative to the starting state
        let mut energy = 0.0;
        let mut best_energy = 0.0;
        let mut best_state = state.clone();
        let mut stale_iters = 0;

        let beta_ratio = if sweeps > 1 {
            (beta_cold / beta_hot).powf(1.0 / (sweeps - 1) as f64)
        } else {
            1.0
        };

        for iter in 0..config.max_iter {
            let mut improved = false;
            let mut beta = beta_hot;
            for _ in 0..sweeps {
                for i in 0..n {
                    let on = state[i];
                    let delta = if on { -field[i] } else { field[i] };
                    if delta <= 0.0 || rng.gen::<f64>() < (-beta * delta).exp() {
                        state.set(i, !on);
                        energy += delta;
                        let sign = if on { -1.0 } else { 1.0 };
                        for (j, coupling) in &self.adjacency[i] {
                            field[*j] += sign * coupling;
                        }
                        if energy < best_energy - 1e-9 {
                            best_energy = energy;
                            best_state.copy_from_bitslice(&state);
                            improved = true;
                        }
                    }
                }
                beta *= beta_ratio;
            }
            if config.log_steps {
                eprintln!(
                    "[{}] read {:3} iteration {:3}: relative energy {:.3}",
                    config.label, read, iter, best_energy
                );
            }

            if improved {
                stale_iters = 0;
            } else {
                stale_iters += 1;
                if stale_iters >= config.convergence {
                    break;
                }
            }

            // Next iteration restarts the schedule from the best state found
            for i in 0..n {
                if state[i] != best_state[i] {
                    let on = state[i];
                    state.set(i, !on);
                    let sign = if on { -1.0 } else { 1.0 };
                    for (j, coupling) in &self.adjacency[i] {
                        field[*j] += sign * coupling;
                    }
                }
            }
            energy = best_energy;
        }
        best_state
    }
}

impl Sampler for SimulatedAnnealing {
    fn name(&self) -> String {
        "SimulatedAnnealing".to_owned()
    }

    fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        config: &SamplerConfig,
    ) -> Result<SampleSet, OracleError> {
        config.validate()?;
        if self.sweeps == 0 {
            return Err(OracleError::InvalidConfig("sweeps must be positive".to_owned()));
        }
        let start_time = Instant::now();

        let problem = Problem::new(bqm);
        let beta_range = self
            .beta_range
            .unwrap_or_else(|| problem.default_beta_range());
        let seed = config.seed.unwrap_or_else(rand::random);

        let states = (0..config.num_reads)
            .into_par_iter()
            .map(|read| {
                let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(read as u64));
                problem.anneal(&mut rng, self.sweeps, beta_range, config, read)
            })
            .collect::<Vec<_>>();

        if config.log_steps {
            eprintln!(
                "[{}] {}: {} reads in {}ms",
                config.label,
                self.name(),
                config.num_reads,
                start_time.elapsed().as_millis()
            );
        }

        Ok(SampleSet::from_states(bqm, states))
    }
}

#[cfg(test)]
use crate::label::Variable;
#[cfg(test)]
use crate::penalty::combinations;

#[test]
fn test_anneal_one_hot() {
    use super::ExactSolver;

    let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
    for cell in 0..6 {
        let vars = (0..3).map(|d| Variable::new(0, cell, d)).collect::<Vec<_>>();
        bqm.update(&combinations(&vars, 1, 1.0));
    }
    let exact = ExactSolver.sample(&bqm, &SamplerConfig::default()).unwrap();
    let ground = exact.first().unwrap().energy;
    assert_eq!(ground, 0.0);

    for seed in [7, 8, 9] {
        let config = SamplerConfig {
            seed: Some(seed),
            ..SamplerConfig::default()
        };
        let samples = SimulatedAnnealing::default().sample(&bqm, &config).unwrap();
        let best = samples.first().unwrap();
        assert_eq!(best.energy, ground);
        assert_eq!(best.assignment.values().filter(|t| **t).count(), 6);
    }
}

#[test]
fn test_anneal_is_reproducible() {
    let vars = (0..8).map(|i| Variable::new(i, 0, 0)).collect::<Vec<_>>();
    let bqm = combinations(&vars, 3, 1.0);
    let config = SamplerConfig {
        seed: Some(42),
        num_reads: 4,
        ..SamplerConfig::default()
    };
    let sampler = SimulatedAnnealing::default();
    let first = sampler.sample(&bqm, &config).unwrap();
    let second = sampler.sample(&bqm, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_anneal_empty_model() {
    let bqm = BinaryQuadraticModel::new(Vartype::Spin);
    let samples = SimulatedAnnealing::default()
        .sample(&bqm, &SamplerConfig::default())
        .unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples.first().unwrap().energy, 0.0);
}
