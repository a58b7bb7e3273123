//! Some tiling puzzles are easier to state than to search.
//!
//! wfc-qubo turns a "Wave Function Collapse"-style grid puzzle into a binary quadratic model
//! whose minimum-energy assignments are exactly the valid tilings, hands that model to a
//! combinatorial oracle (an annealer, or a brute-force search for small grids), and reads the
//! best assignment back into a grid.
//!
//! It can be used either as an application invoked on a text file, or as a library.
//!
//! ## The encoding
//!
//! A grid is an n×n matrix of digits. There is one boolean decision variable per
//! `(row, col, digit)`, labeled like `row,col_digit`. The objective is a sum of penalty terms,
//! each of the form "exactly `k` of these variables are true", which is zero when that holds
//! and positive otherwise:
//!
//! - **One-hot**: every cell selects exactly one digit.
//! - **Block**: the grid is cut into sub-blocks of side `floor(sqrt(n))`. In each block, the
//!   variables selecting the *input's* digits must all be true (exactly `n` of them).
//! - **Non-trivial** (off by default): none of the input's own digits are selected.
//!
//! ## Solving a grid
//!
//! ```
//! use wfc_qubo::sampler::{Sampler, SamplerConfig, SimulatedAnnealing};
//! use wfc_qubo::{compile, decode, Config, Grid, PenaltyKind};
//!
//! let grid: Grid = "0 1 1 0\n1 0 0 1\n0 1 1 0\n1 0 0 1".parse()?;
//!
//! let objective = compile(&grid, &Config::default())?;
//! assert_eq!(objective.count(PenaltyKind::OneHot), 16);
//! assert_eq!(objective.count(PenaltyKind::Block), 4);
//!
//! let config = SamplerConfig {
//!     seed: Some(1),
//!     ..SamplerConfig::default()
//! };
//! let samples = SimulatedAnnealing::default().sample(&objective.bqm, &config)?;
//! let best = samples.first()?;
//! assert_eq!(best.energy, 0.0);
//! assert_eq!(decode(&best.assignment, &grid), grid);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! For models with only a handful of variables, `ExactSolver` finds a guaranteed ground state
//! by trying every assignment.

mod decode;
mod grid;
mod label;
mod model;
mod penalty;

pub mod sampler;

pub use decode::{decode, decode_checked, encode_as_assignment, DecodeAmbiguity};
pub use grid::{Grid, GridSet, InvalidGrid};
pub use label::{parse_assignment, LabelError, Variable};
pub use model::{Assignment, BinaryQuadraticModel, Vartype};
pub use penalty::{combinations, Penalty, PenaltyKind};

use sampler::{OracleError, SampleSet, Sampler, SamplerConfig};
use std::ops::Range;
use std::time::Instant;

/************************
 *     Objective        *
 ************************/

/// The compiled puzzle: the model to minimize, and the penalty terms it was summed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub bqm: BinaryQuadraticModel,
    pub penalties: Vec<Penalty>,
}

impl Objective {
    pub fn penalties_of(&self, kind: PenaltyKind) -> impl Iterator<Item = &Penalty> + '_ {
        self.penalties.iter().filter(move |p| p.kind == kind)
    }

    /// The number of penalty terms of this kind.
    pub fn count(&self, kind: PenaltyKind) -> usize {
        self.penalties_of(kind).count()
    }

    /// The penalty terms that `assignment` violates.
    pub fn unsatisfied<'a>(&'a self, assignment: &'a Assignment) -> Vec<&'a Penalty> {
        self.penalties
            .iter()
            .filter(|p| !p.is_satisfied(assignment))
            .collect()
    }
}

/************************
 *     Compiler         *
 ************************/

/// Accumulates penalty terms into one objective. Most callers want [`compile`], which adds all
/// the puzzle's rules at once; use this directly to add rules selectively.
pub struct Compiler {
    config: Config,
    objective: Objective,
}

impl Compiler {
    pub fn new(config: Config) -> Compiler {
        Compiler {
            objective: Objective {
                bqm: BinaryQuadraticModel::new(config.vartype),
                penalties: Vec::new(),
            },
            config,
        }
    }

    pub fn config(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Add the term "exactly `k` of `vars` are true".
    pub fn penalty(&mut self, kind: PenaltyKind, vars: Vec<Variable>, k: usize) {
        let penalty = Penalty::new(kind, vars, k);
        if self.config.log_penalties {
            eprintln!("Penalty {}", penalty);
            if penalty.is_unsatisfiable() {
                eprintln!(
                    "  (never zero: needs {} true but has only {} variables)",
                    penalty.k,
                    penalty.vars.len()
                );
            }
        }
        self.objective.bqm.update(&penalty.bqm(self.config.strength));
        self.objective.penalties.push(penalty);
    }

    /// Every cell selects exactly one digit.
    pub fn one_hot_cells(&mut self, grid: &Grid) {
        let digits = self.config.digits.range(grid.side());
        for (row, col) in grid.cells() {
            let vars = digits
                .clone()
                .map(|digit| Variable::new(row, col, digit))
                .collect();
            self.penalty(PenaltyKind::OneHot, vars, 1);
        }
        self.log_step("one-hot");
    }

    /// Every sub-block reproduces the input's digits. Blocks have side `floor(sqrt(n))` and
    /// tile the whole grid; when `n` isn't a perfect square, the last row and column of
    /// blocks are cut short. Each block requires exactly `n` of its variables to be true.
    pub fn block_patterns(&mut self, grid: &Grid) {
        let n = grid.side();
        for (rows, cols) in blocks(n) {
            let vars = rows
                .flat_map(|row| cols.clone().map(move |col| (row, col)))
                .map(|(row, col)| Variable::new(row, col, grid.get(row, col)))
                .collect();
            self.penalty(PenaltyKind::Block, vars, n);
        }
        self.log_step("block");
    }

    /// The output must not reuse any of the input's digits.
    pub fn non_trivial(&mut self, grid: &Grid) {
        let vars = grid
            .cells()
            .map(|(row, col)| Variable::new(row, col, grid.get(row, col)))
            .collect();
        self.penalty(PenaltyKind::NonTrivial, vars, 0);
        self.log_step("non-trivial");
    }

    fn log_step(&self, phase: &str) {
        if self.config.log_steps {
            eprintln!(
                "After {:11} penalties: {:4} terms, {:5} variables, {:6} interactions",
                phase,
                self.objective.penalties.len(),
                self.objective.bqm.num_variables(),
                self.objective.bqm.num_interactions(),
            );
        }
    }

    pub fn finish(self) -> Objective {
        self.objective
    }
}

/// `(rows, cols)` of each sub-block of an n×n grid, row-major.
fn blocks(n: usize) -> Vec<(Range<usize>, Range<usize>)> {
    let m = grid::isqrt(n);
    if m == 0 {
        return Vec::new();
    }
    let per_side = (n + m - 1) / m;
    let span = |b: usize| b * m..((b + 1) * m).min(n);
    let mut result = Vec::new();
    for br in 0..per_side {
        for bc in 0..per_side {
            result.push((span(br), span(bc)));
        }
    }
    result
}

/// Compile a grid into the objective whose zero-energy states are its valid tilings.
pub fn compile(grid: &Grid, config: &Config) -> Result<Objective, InvalidGrid> {
    let start_time = Instant::now();
    if config.strict {
        grid.check_perfect_square()?;
    }

    let mut compiler = Compiler::new(config.clone());
    compiler.one_hot_cells(grid);
    compiler.block_patterns(grid);
    if config.non_trivial {
        compiler.non_trivial(grid);
    }

    if config.log_elapsed {
        eprintln!("  compiled in {:5?}ms", start_time.elapsed().as_millis());
    }
    Ok(compiler.finish())
}

/// Sample `objective` and decode the best assignment found. Also returns every sample, best
/// first.
pub fn solve_wfc(
    objective: &Objective,
    grid: &Grid,
    sampler: &dyn Sampler,
    sampler_config: &SamplerConfig,
) -> Result<(Grid, SampleSet), OracleError> {
    let samples = sampler.sample(&objective.bqm, sampler_config)?;
    let result = decode(&samples.first()?.assignment, grid);
    Ok((result, samples))
}

/************************
 *     Config           *
 ************************/

/// Which digits each cell chooses between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigitDomain {
    /// Just 0 and 1, whatever the grid size.
    #[default]
    Binary,
    /// `0..n` for an n×n grid.
    Full,
}

impl DigitDomain {
    pub fn range(self, n: usize) -> Range<u32> {
        match self {
            DigitDomain::Binary => 0..2,
            DigitDomain::Full => 0..n as u32,
        }
    }
}

// When running `main`, this is loaded from command line args.
// See `Args` in `main.rs`.
/// Configuration options for compiling a grid.
#[derive(Debug, Clone)]
pub struct Config {
    pub digits: DigitDomain,
    /// Add the non-trivial penalty
    pub non_trivial: bool,
    /// Reject grids whose side isn't a perfect square
    pub strict: bool,
    /// Scale for every penalty term
    pub strength: f64,
    /// The variable domain of the compiled model
    pub vartype: Vartype,
    /// Log each penalty as it's added
    pub log_penalties: bool,
    /// Log model size after each kind of penalty
    pub log_steps: bool,
    /// Log how long compiling took
    pub log_elapsed: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            digits: DigitDomain::Binary,
            non_trivial: false,
            strict: false,
            strength: 1.0,
            vartype: Vartype::Binary,
            log_penalties: false,
            log_steps: false,
            log_elapsed: false,
        }
    }
}

#[cfg(test)]
fn grid(input: &str) -> Grid {
    input.parse().unwrap()
}

#[test]
fn test_blocks() {
    assert!(blocks(0).is_empty());
    assert_eq!(blocks(1), [(0..1, 0..1)]);
    assert_eq!(blocks(2).len(), 4);
    assert_eq!(
        blocks(4),
        [(0..2, 0..2), (0..2, 2..4), (2..4, 0..2), (2..4, 2..4)]
    );
    // Not a perfect square: side-2 blocks, cut short at the edge
    let five = blocks(5);
    assert_eq!(five.len(), 9);
    assert_eq!(five[8], (4..5, 4..5));
    let covered: usize = five.iter().map(|(r, c)| r.len() * c.len()).sum();
    assert_eq!(covered, 25);
}

#[test]
fn test_compile_one_hot_count() {
    for input in ["0", "0 1\n1 0", "0 1 1 0\n1 0 0 1\n0 1 1 0\n1 0 0 1"] {
        let g = grid(input);
        let n = g.side();
        let objective = compile(&g, &Config::default()).unwrap();
        assert_eq!(objective.count(PenaltyKind::OneHot), n * n);
        for penalty in objective.penalties_of(PenaltyKind::OneHot) {
            assert_eq!(penalty.k, 1);
            assert_eq!(penalty.vars.len(), 2);
        }
    }
}

#[test]
fn test_compile_empty() {
    let objective = compile(&Grid::default(), &Config::default()).unwrap();
    assert!(objective.penalties.is_empty());
    assert!(objective.bqm.is_empty());
}

#[test]
fn test_compile_single_cell() {
    let objective = compile(&grid("1"), &Config::default()).unwrap();
    assert_eq!(objective.count(PenaltyKind::OneHot), 1);
    assert_eq!(objective.count(PenaltyKind::Block), 1);
    let block = objective.penalties_of(PenaltyKind::Block).next().unwrap();
    assert_eq!(block.vars, [Variable::new(0, 0, 1)]);
    assert_eq!(block.k, 1);

    // "0,0_1" alone is the unique zero-energy state
    let assignment = Assignment::from([(Variable::new(0, 0, 1), true)]);
    assert_eq!(objective.bqm.energy(&assignment), 0.0);
    assert!(objective.bqm.energy(&Assignment::new()) > 0.0);
}

#[test]
fn test_compile_two_by_two() {
    let g = grid("0 1\n1 0");
    let objective = compile(&g, &Config::default()).unwrap();
    assert_eq!(objective.count(PenaltyKind::OneHot), 4);
    assert_eq!(objective.count(PenaltyKind::Block), 4);
    for block in objective.penalties_of(PenaltyKind::Block) {
        assert_eq!(block.vars.len(), 1);
        assert_eq!(block.k, 2);
        assert!(block.is_unsatisfiable());
    }
    assert_eq!(objective.bqm.num_variables(), 8);
}

#[test]
fn test_block_penalty_zero_on_input() {
    let g = grid("0 1 1 0\n1 0 0 1\n1 1 0 0\n0 0 1 1");
    let objective = compile(&g, &Config::default()).unwrap();
    let assignment = encode_as_assignment(&g);
    for block in objective.penalties_of(PenaltyKind::Block) {
        assert_eq!(block.vars.len(), 4);
        assert_eq!(block.violation(&assignment), 0.0);
    }
    assert!(objective.unsatisfied(&assignment).is_empty());
    assert_eq!(objective.bqm.energy(&assignment), 0.0);
}

#[test]
fn test_compile_idempotent() {
    let g = grid("0 1 1 0\n1 0 0 1\n0 1 1 0\n1 0 0 1");
    let config = Config {
        non_trivial: true,
        ..Config::default()
    };
    assert_eq!(compile(&g, &config).unwrap(), compile(&g, &config).unwrap());
}

#[test]
fn test_compile_non_trivial() {
    let g = grid("0 1 1 0\n1 0 0 1\n0 1 1 0\n1 0 0 1");
    let objective = compile(&g, &Config::default()).unwrap();
    assert_eq!(objective.count(PenaltyKind::NonTrivial), 0);

    let config = Config {
        non_trivial: true,
        ..Config::default()
    };
    let objective = compile(&g, &config).unwrap();
    assert_eq!(objective.count(PenaltyKind::NonTrivial), 1);
    let penalty = objective.penalties_of(PenaltyKind::NonTrivial).next().unwrap();
    assert_eq!(penalty.k, 0);
    assert_eq!(penalty.vars.len(), 16);
    // The input itself now has positive energy
    assert!(objective.bqm.energy(&encode_as_assignment(&g)) > 0.0);
}

#[test]
fn test_compile_full_digits() {
    let g = grid("0 1 2 3\n1 2 3 0\n2 3 0 1\n3 0 1 2");
    let config = Config {
        digits: DigitDomain::Full,
        ..Config::default()
    };
    let objective = compile(&g, &config).unwrap();
    for penalty in objective.penalties_of(PenaltyKind::OneHot) {
        assert_eq!(penalty.vars.len(), 4);
    }
    assert_eq!(objective.bqm.num_variables(), 64);
    assert_eq!(objective.bqm.energy(&encode_as_assignment(&g)), 0.0);
}

#[test]
fn test_compile_strict() {
    let config = Config {
        strict: true,
        ..Config::default()
    };
    assert_eq!(
        compile(&grid("0 1\n1 0"), &config),
        Err(InvalidGrid::SideNotPerfectSquare(2))
    );
    assert!(compile(&grid("0"), &config).is_ok());
}

#[test]
fn test_compile_spin_matches_binary() {
    let g = grid("0 1 1 0\n1 0 0 1\n0 1 1 0\n1 0 0 1");
    let binary = compile(&g, &Config::default()).unwrap();
    let config = Config {
        vartype: Vartype::Spin,
        ..Config::default()
    };
    let spin = compile(&g, &config).unwrap();
    assert_eq!(spin.bqm.vartype(), Vartype::Spin);
    let assignment = encode_as_assignment(&g);
    assert!((spin.bqm.energy(&assignment) - binary.bqm.energy(&assignment)).abs() < 1e-9);
    let empty = Assignment::new();
    assert!((spin.bqm.energy(&empty) - binary.bqm.energy(&empty)).abs() < 1e-9);
}

#[test]
fn test_compiler_config_between_rules() {
    let g = grid("1");
    let mut compiler = Compiler::new(Config::default());
    compiler.one_hot_cells(&g);
    compiler.config().strength = 2.0;
    compiler.block_patterns(&g);
    let objective = compiler.finish();

    // One-hot at strength 1: -1 on each digit, +2 between them, offset 1.
    // Block at strength 2 on 0,0_1 alone: 2 * (x - 1)^2.
    let zero = Variable::new(0, 0, 0);
    let one = Variable::new(0, 0, 1);
    assert_eq!(objective.bqm.linear(&zero), Some(-1.0));
    assert_eq!(objective.bqm.linear(&one), Some(-3.0));
    assert_eq!(objective.bqm.quadratic(&zero, &one), Some(2.0));
    assert_eq!(objective.bqm.offset(), 3.0);
    assert_eq!(objective.penalties.len(), 2);
}

#[test]
fn test_solve_wfc_exact() {
    let g = grid("0 1\n1 0");
    let objective = compile(&g, &Config::default()).unwrap();
    let sampler = sampler::ExactSolver;
    let (result, samples) = solve_wfc(&objective, &g, &sampler, &SamplerConfig::default()).unwrap();
    assert_eq!(result, g);
    // Each single-cell block can get at best to 1 of the 2 it asks for
    assert_eq!(samples.first().unwrap().energy, 4.0);
}
