//! Command line front end: read a grid, compile it, sample it, print the decoded grid.

use anyhow::{Context, Result};
use argh::FromArgs;
use std::fs;
use std::time::Instant;
use wfc_qubo::sampler::{ExactSolver, SampleSet, Sampler, SamplerConfig, SimulatedAnnealing};
use wfc_qubo::{
    compile, decode, decode_checked, parse_assignment, Config, DigitDomain, Grid, GridSet, Vartype,
};

const DEFAULT_FILENAME: &str = "problem.txt";

/// wfc-qubo: complete a tiling grid by minimizing a quadratic penalty model
#[derive(Debug, Clone, FromArgs)]
struct Args {
    /// the grid file to solve (default: problem.txt)
    #[argh(positional)]
    filename: Option<String>,

    /// don't log anything besides the solution
    #[argh(switch, short = 'q', long = "quiet")]
    quiet: bool,

    /// enumerate every assignment instead of annealing (small grids only)
    #[argh(switch, long = "exact")]
    exact: bool,

    /// number of candidate assignments to sample
    #[argh(option, long = "reads", default = "8")]
    reads: usize,

    /// seed for a reproducible run
    #[argh(option, long = "seed")]
    seed: Option<u64>,

    /// maximum annealing iterations per read
    #[argh(option, long = "max-iter", default = "10")]
    max_iter: usize,

    /// stop a read after this many iterations without improvement
    #[argh(option, long = "convergence", default = "3")]
    convergence: usize,

    /// sweeps per annealing iteration
    #[argh(option, long = "sweeps", default = "256")]
    sweeps: usize,

    /// let each cell choose any digit 0..n instead of just 0 and 1
    #[argh(switch, long = "full-digits")]
    full_digits: bool,

    /// penalize reusing the input's digits
    #[argh(switch, long = "non-trivial")]
    non_trivial: bool,

    /// reject grids whose side isn't a perfect square
    #[argh(switch, long = "strict")]
    strict: bool,

    /// compile to a spin (-1/+1) model instead of a binary one
    #[argh(switch, long = "spin")]
    spin: bool,

    /// decode this file of 'label value' lines (from an external oracle) instead of sampling
    #[argh(option, long = "assignment")]
    assignment: Option<String>,

    /// show the best N decoded candidates side by side (on stderr)
    #[argh(option, long = "candidates", default = "0")]
    candidates: usize,

    /// warn about cells that got zero or several digits, and violated penalties
    #[argh(switch, long = "check")]
    check: bool,

    /// log each penalty term as it's added
    #[argh(switch, long = "log-penalties")]
    log_penalties: bool,

    /// log the full compiled model
    #[argh(switch, long = "log-model")]
    log_model: bool,

    /// log each oracle iteration
    #[argh(switch, long = "log-oracle")]
    log_oracle: bool,

    /// log how long each step took
    #[argh(switch, long = "log-elapsed")]
    log_elapsed: bool,
}

impl Args {
    fn compile_config(&self) -> Config {
        let mut config = Config {
            digits: if self.full_digits {
                DigitDomain::Full
            } else {
                DigitDomain::Binary
            },
            non_trivial: self.non_trivial,
            strict: self.strict,
            vartype: if self.spin {
                Vartype::Spin
            } else {
                Vartype::Binary
            },
            ..Config::default()
        };
        if !self.quiet {
            config.log_steps = true;
            config.log_penalties = self.log_penalties;
            config.log_elapsed = self.log_elapsed;
        }
        config
    }

    fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            num_reads: self.reads,
            max_iter: self.max_iter,
            convergence: self.convergence,
            seed: self.seed,
            log_steps: !self.quiet && self.log_oracle,
            ..SamplerConfig::default()
        }
    }

    fn sampler(&self) -> Box<dyn Sampler> {
        if self.exact {
            Box::new(ExactSolver)
        } else {
            Box::new(SimulatedAnnealing {
                sweeps: self.sweeps,
                ..SimulatedAnnealing::default()
            })
        }
    }
}

fn main() -> Result<()> {
    let args = argh::from_env::<Args>();
    let start_time = Instant::now();

    let filename = match &args.filename {
        Some(filename) => filename.clone(),
        None => {
            eprintln!(
                "Warning: using default problem file, '{}'. Usage: wfc-qubo <grid filepath>",
                DEFAULT_FILENAME
            );
            DEFAULT_FILENAME.to_owned()
        }
    };

    let contents = fs::read_to_string(&filename)
        .with_context(|| format!("Failed to read grid file '{}'", filename))?;
    let grid = Grid::parse(&contents).with_context(|| format!("Invalid grid in '{}'", filename))?;

    let objective = compile(&grid, &args.compile_config())?;
    if args.log_model && !args.quiet {
        eprint!("{}", objective.bqm);
    }

    let samples = match &args.assignment {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read assignment file '{}'", path))?;
            let assignment = parse_assignment(&contents)
                .with_context(|| format!("Invalid assignment in '{}'", path))?;
            SampleSet::from_assignments(&objective.bqm, [assignment])
        }
        None => {
            let sampler = args.sampler();
            sampler
                .sample(&objective.bqm, &args.sampler_config())
                .with_context(|| format!("{} failed", sampler.name()))?
        }
    };
    let best = samples.first()?;
    if !args.quiet {
        eprintln!("Best energy: {}", best.energy);
    }

    let result = if args.check {
        let (result, warnings) = decode_checked(&best.assignment, &grid);
        for warning in &warnings {
            eprintln!("{}", warning);
        }
        for penalty in objective.unsatisfied(&best.assignment) {
            eprintln!("warning: violated {}", penalty);
        }
        result
    } else {
        decode(&best.assignment, &grid)
    };

    if args.candidates > 0 {
        let candidates = samples
            .samples()
            .iter()
            .take(args.candidates)
            .map(|sample| {
                (
                    format!("energy {}", sample.energy),
                    decode(&sample.assignment, &grid),
                )
            })
            .collect::<Vec<_>>();
        eprint!("{}", GridSet(candidates));
    }

    if args.log_elapsed && !args.quiet {
        eprintln!("Total time: {}ms", start_time.elapsed().as_millis());
    }

    print!("{}", result);
    Ok(())
}
