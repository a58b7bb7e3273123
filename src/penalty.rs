use crate::label::Variable;
use crate::model::{Assignment, BinaryQuadraticModel, Vartype};
use itertools::Itertools;
use std::fmt;

/// The penalty `strength * (x_1 + ... + x_n - k)^2` over binary variables. It is zero exactly
/// when `k` of `vars` are true, and at least `strength` otherwise.
///
/// Expanding the square, using `x*x = x`:
///
/// ```text
/// sum_i (1 - 2k) x_i  +  sum_{i<j} 2 x_i x_j  +  k^2
/// ```
///
/// `k` may exceed `vars.len()`, in which case the penalty is never zero.
pub fn combinations(vars: &[Variable], k: usize, strength: f64) -> BinaryQuadraticModel {
    let k = k as f64;
    let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
    for var in vars {
        bqm.add_linear(*var, strength * (1.0 - 2.0 * k));
    }
    for (u, v) in vars.iter().tuple_combinations() {
        bqm.add_quadratic(*u, *v, 2.0 * strength);
    }
    bqm.add_offset(strength * k * k);
    bqm
}

/// Which of the puzzle rules a penalty encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PenaltyKind {
    /// Each cell holds exactly one digit.
    OneHot,
    /// A sub-block reproduces the input pattern.
    Block,
    /// The output differs from the input.
    NonTrivial,
}

impl PenaltyKind {
    pub fn name(self) -> &'static str {
        match self {
            PenaltyKind::OneHot => "OneHot",
            PenaltyKind::Block => "Block",
            PenaltyKind::NonTrivial => "NonTrivial",
        }
    }
}

/// One "exactly `k` of `vars`" term of the objective.
#[derive(Debug, Clone, PartialEq)]
pub struct Penalty {
    pub kind: PenaltyKind,
    pub vars: Vec<Variable>,
    pub k: usize,
}

impl Penalty {
    pub fn new(kind: PenaltyKind, vars: Vec<Variable>, k: usize) -> Penalty {
        Penalty { kind, vars, k }
    }

    pub fn bqm(&self, strength: f64) -> BinaryQuadraticModel {
        combinations(&self.vars, self.k, strength)
    }

    /// Whether `k` can't ever be reached, because there are fewer than `k` variables.
    pub fn is_unsatisfiable(&self) -> bool {
        self.k > self.vars.len()
    }

    /// `(#true - k)^2` under `assignment`; the unit-strength penalty value.
    pub fn violation(&self, assignment: &Assignment) -> f64 {
        let count = self
            .vars
            .iter()
            .filter(|var| assignment.get(var).copied().unwrap_or(false))
            .count() as f64;
        let diff = count - self.k as f64;
        diff * diff
    }

    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        self.violation(assignment) == 0.0
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} exactly {} of [", self.kind.name(), self.k)?;
        for (i, var) in self.vars.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", var)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
fn vars(n: usize) -> Vec<Variable> {
    (0..n).map(|i| Variable::new(0, i, 0)).collect()
}

#[test]
fn test_combinations() {
    let vs = vars(3);
    let bqm = combinations(&vs, 1, 1.0);
    assert_eq!(bqm.num_variables(), 3);
    assert_eq!(bqm.num_interactions(), 3);
    assert_eq!(bqm.linear(&vs[0]), Some(-1.0));
    assert_eq!(bqm.quadratic(&vs[0], &vs[2]), Some(2.0));
    assert_eq!(bqm.offset(), 1.0);

    // Energy is (count - 1)^2 for every assignment
    for bits in 0..8usize {
        let assignment = vs
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, bits & (1 << i) != 0))
            .collect::<Assignment>();
        let count = bits.count_ones() as f64;
        assert_eq!(bqm.energy(&assignment), (count - 1.0) * (count - 1.0));
    }
}

#[test]
fn test_combinations_strength() {
    let vs = vars(2);
    let bqm = combinations(&vs, 2, 3.0);
    let all = vs.iter().map(|v| (*v, true)).collect::<Assignment>();
    assert_eq!(bqm.energy(&all), 0.0);
    assert_eq!(bqm.energy(&Assignment::new()), 12.0);
}

#[test]
fn test_combinations_k_too_large() {
    let vs = vars(1);
    let bqm = combinations(&vs, 2, 1.0);
    let on = Assignment::from([(vs[0], true)]);
    assert_eq!(bqm.energy(&on), 1.0);
    assert_eq!(bqm.energy(&Assignment::new()), 4.0);

    let penalty = Penalty::new(PenaltyKind::Block, vs, 2);
    assert!(penalty.is_unsatisfiable());
    assert_eq!(penalty.violation(&on), 1.0);
}

#[test]
fn test_combinations_k_zero() {
    let vs = vars(3);
    let bqm = combinations(&vs, 0, 1.0);
    assert_eq!(bqm.energy(&Assignment::new()), 0.0);
    let two = Assignment::from([(vs[0], true), (vs[2], true)]);
    assert_eq!(bqm.energy(&two), 4.0);
}

#[test]
fn test_penalty_display() {
    let penalty = Penalty::new(PenaltyKind::OneHot, vars(2), 1);
    assert_eq!(penalty.to_string(), "OneHot exactly 1 of [0,0_0 0,1_0]");
}
