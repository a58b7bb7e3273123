use wfc_qubo::sampler::{ExactSolver, Sampler, SamplerConfig, SimulatedAnnealing};
use wfc_qubo::{
    compile, decode, decode_checked, encode_as_assignment, parse_assignment, solve_wfc, Assignment,
    Config, Grid, PenaltyKind, Variable,
};

fn grid(input: &str) -> Grid {
    input.parse().unwrap()
}

#[test]
fn two_by_two_scenario() {
    let g = grid("0 1\n1 0\n");
    let objective = compile(&g, &Config::default()).unwrap();
    assert_eq!(objective.count(PenaltyKind::OneHot), 4);
    assert_eq!(objective.count(PenaltyKind::Block), 4);

    let assignment = parse_assignment(
        "0,0_0 1\n0,0_1 0\n0,1_0 0\n0,1_1 1\n1,0_0 0\n1,0_1 1\n1,1_0 1\n1,1_1 0\n",
    )
    .unwrap();
    assert_eq!(decode(&assignment, &g), g);

    let (result, samples) =
        solve_wfc(&objective, &g, &ExactSolver, &SamplerConfig::default()).unwrap();
    assert_eq!(result, g);
    assert_eq!(samples.first().unwrap().assignment, assignment);
}

#[test]
fn annealing_reproduces_a_tiled_grid() {
    let g = grid("1 1 0 1\n0 1 1 0\n1 0 0 0\n0 1 1 1");
    let objective = compile(&g, &Config::default()).unwrap();
    let config = SamplerConfig {
        seed: Some(11),
        ..SamplerConfig::default()
    };
    // The input itself is a zero-energy state, and no state goes below zero
    assert_eq!(objective.bqm.energy(&encode_as_assignment(&g)), 0.0);
    let samples = SimulatedAnnealing::default()
        .sample(&objective.bqm, &config)
        .unwrap();
    let best = samples.first().unwrap();
    assert_eq!(best.energy, 0.0);
    assert!(objective.unsatisfied(&best.assignment).is_empty());

    let (result, warnings) = decode_checked(&best.assignment, &g);
    assert_eq!(result, g);
    assert!(warnings.is_empty());
}

#[test]
fn samplers_agree_on_small_grids() {
    let g = grid("0");
    let objective = compile(&g, &Config::default()).unwrap();
    let config = SamplerConfig {
        seed: Some(3),
        ..SamplerConfig::default()
    };
    let exact = ExactSolver.sample(&objective.bqm, &config).unwrap();
    let annealed = SimulatedAnnealing::default()
        .sample(&objective.bqm, &config)
        .unwrap();
    assert_eq!(
        exact.first().unwrap().assignment,
        annealed.first().unwrap().assignment
    );
    assert_eq!(
        exact.first().unwrap().assignment,
        encode_as_assignment(&g)
            .into_iter()
            .chain([(Variable::new(0, 0, 1), false)])
            .collect::<Assignment>()
    );
}

#[test]
fn exact_solver_rejects_large_grids() {
    let g = grid("0 1 1 0\n1 0 0 1\n0 1 1 0\n1 0 0 1");
    let objective = compile(&g, &Config::default()).unwrap();
    assert!(ExactSolver
        .sample(&objective.bqm, &SamplerConfig::default())
        .is_err());
}

#[test]
fn annealing_matches_exact_ground_states() {
    let grids = ["0", "1", "0 1\n1 0", "1 1\n0 1", "0 1 0\n1 1 0\n0 0 1"];
    let non_trivial = Config {
        non_trivial: true,
        ..Config::default()
    };
    for input in grids {
        let g = grid(input);
        for config in [&Config::default(), &non_trivial] {
            let objective = compile(&g, config).unwrap();
            let exact = ExactSolver
                .sample(&objective.bqm, &SamplerConfig::default())
                .unwrap();
            let ground = exact.first().unwrap().energy;
            for seed in 0..3 {
                let sampler_config = SamplerConfig {
                    seed: Some(seed),
                    ..SamplerConfig::default()
                };
                let annealed = SimulatedAnnealing::default()
                    .sample(&objective.bqm, &sampler_config)
                    .unwrap();
                assert!(
                    (annealed.first().unwrap().energy - ground).abs() < 1e-9,
                    "grid {:?}, seed {}",
                    input,
                    seed
                );
            }
        }
    }
}
