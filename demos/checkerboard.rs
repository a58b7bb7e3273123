//! Compile a checkerboard tile, anneal it, and compare against the exact ground state.

use std::time::Instant;
use wfc_qubo::sampler::{ExactSolver, SamplerConfig, SimulatedAnnealing};
use wfc_qubo::{compile, solve_wfc, Compiler, Config, Grid, GridSet, PenaltyKind};

fn main() {
    println!("Solving a 4x4 checkerboard.");
    println!();

    let grid: Grid = "0 1 0 1\n1 0 1 0\n0 1 0 1\n1 0 1 0"
        .parse()
        .unwrap_or_else(|err| panic!("{}", err));

    // Build the objective rule by rule, logging the block penalties as they're added
    let mut compiler = Compiler::new(Config::default());
    compiler.config().log_steps = true;
    compiler.one_hot_cells(&grid);
    compiler.config().log_penalties = true;
    compiler.block_patterns(&grid);
    let objective = compiler.finish();
    println!(
        "{} one-hot terms, {} block terms",
        objective.count(PenaltyKind::OneHot),
        objective.count(PenaltyKind::Block)
    );

    let sampler_config = SamplerConfig {
        seed: Some(2024),
        num_reads: 4,
        ..SamplerConfig::default()
    };
    let start_time = Instant::now();
    let (result, samples) = solve_wfc(
        &objective,
        &grid,
        &SimulatedAnnealing::default(),
        &sampler_config,
    )
    .unwrap_or_else(|err| panic!("{}", err));
    println!("time: {}ms", start_time.elapsed().as_millis());
    println!("{}", samples);
    print!(
        "{}",
        GridSet(vec![
            ("input".to_owned(), grid.clone()),
            ("annealed".to_owned(), result),
        ])
    );

    // A 1x1 grid is small enough to check exhaustively
    let row: Grid = "1".parse().unwrap_or_else(|err| panic!("{}", err));
    let objective = compile(&row, &Config::default()).unwrap_or_else(|err| panic!("{}", err));
    let (exact, _) = solve_wfc(&objective, &row, &ExactSolver, &SamplerConfig::default())
        .unwrap_or_else(|err| panic!("{}", err));
    println!("exact 1x1: {}", exact);
}
