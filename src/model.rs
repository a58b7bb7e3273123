use crate::label::Variable;
use bitvec::slice::BitSlice;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A truth value for each variable. Variables missing from the map are false.
pub type Assignment = BTreeMap<Variable, bool>;

type VarIndex = usize;

/// The domain the model's variables range over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Vartype {
    /// Variables are 0 or 1.
    #[default]
    Binary,
    /// Variables are -1 or +1.
    Spin,
}

impl Vartype {
    fn value(self, truth: bool) -> f64 {
        match (self, truth) {
            (_, true) => 1.0,
            (Vartype::Binary, false) => 0.0,
            (Vartype::Spin, false) => -1.0,
        }
    }
}

/// A quadratic objective `offset + sum_i a_i x_i + sum_{i<j} b_ij x_i x_j` over
/// `Variable`s.
///
/// Variables are kept in insertion order, so building the same model twice
/// gives structurally equal models.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryQuadraticModel {
    vartype: Vartype,
    /// VarIndex -> Variable
    variables: Vec<Variable>,
    /// Variable -> VarIndex
    index: HashMap<Variable, VarIndex>,
    /// VarIndex -> linear bias
    linear: Vec<f64>,
    /// (lower VarIndex, higher VarIndex) -> quadratic bias
    quadratic: BTreeMap<(VarIndex, VarIndex), f64>,
    offset: f64,
}

impl BinaryQuadraticModel {
    pub fn new(vartype: Vartype) -> BinaryQuadraticModel {
        BinaryQuadraticModel {
            vartype,
            variables: Vec::new(),
            index: HashMap::new(),
            linear: Vec::new(),
            quadratic: BTreeMap::new(),
            offset: 0.0,
        }
    }

    pub fn vartype(&self) -> Vartype {
        self.vartype
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_interactions(&self) -> usize {
        self.quadratic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.offset == 0.0
    }

    /// The variables, in the order they were first added.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn linear(&self, var: &Variable) -> Option<f64> {
        self.index.get(var).map(|i| self.linear[*i])
    }

    pub fn quadratic(&self, u: &Variable, v: &Variable) -> Option<f64> {
        let key = ordered(*self.index.get(u)?, *self.index.get(v)?);
        self.quadratic.get(&key).copied()
    }

    /// Iterate over `(u, v, bias)` for every interaction.
    pub fn interactions(&self) -> impl Iterator<Item = (Variable, Variable, f64)> + '_ {
        self.quadratic
            .iter()
            .map(|((i, j), bias)| (self.variables[*i], self.variables[*j], *bias))
    }

    /// Add `var` with zero bias, if it isn't already present.
    pub fn add_variable(&mut self, var: Variable) -> VarIndex {
        if let Some(i) = self.index.get(&var) {
            return *i;
        }
        let i = self.variables.len();
        self.variables.push(var);
        self.index.insert(var, i);
        self.linear.push(0.0);
        i
    }

    pub fn add_linear(&mut self, var: Variable, bias: f64) {
        let i = self.add_variable(var);
        self.linear[i] += bias;
    }

    /// Add `bias * u * v`. A self-interaction is folded into the linear term (binary,
    /// since `x*x = x`) or into the offset (spin, since `s*s = 1`).
    pub fn add_quadratic(&mut self, u: Variable, v: Variable, bias: f64) {
        if u == v {
            match self.vartype {
                Vartype::Binary => self.add_linear(u, bias),
                Vartype::Spin => {
                    self.add_variable(u);
                    self.offset += bias;
                }
            }
            return;
        }
        let i = self.add_variable(u);
        let j = self.add_variable(v);
        *self.quadratic.entry(ordered(i, j)).or_insert(0.0) += bias;
    }

    pub fn add_offset(&mut self, offset: f64) {
        self.offset += offset;
    }

    /// Add every term of `other` into this model, converting its vartype first if
    /// they differ.
    pub fn update(&mut self, other: &BinaryQuadraticModel) {
        if other.vartype != self.vartype {
            self.update(&other.change_vartype(self.vartype));
            return;
        }
        for (var, bias) in other.variables.iter().zip(&other.linear) {
            self.add_linear(*var, *bias);
        }
        for (u, v, bias) in other.interactions() {
            self.add_quadratic(u, v, bias);
        }
        self.offset += other.offset;
    }

    /// The equivalent model over `vartype`. Energies are preserved under the mapping
    /// `s = 2x - 1`.
    pub fn change_vartype(&self, vartype: Vartype) -> BinaryQuadraticModel {
        let mut result = BinaryQuadraticModel::new(vartype);
        for var in &self.variables {
            result.add_variable(*var);
        }
        result.offset = self.offset;
        match (self.vartype, vartype) {
            (Vartype::Binary, Vartype::Binary) | (Vartype::Spin, Vartype::Spin) => {
                result.linear = self.linear.clone();
                result.quadratic = self.quadratic.clone();
            }
            (Vartype::Binary, Vartype::Spin) => {
                // x = (s + 1) / 2
                for (i, bias) in self.linear.iter().enumerate() {
                    result.linear[i] += bias / 2.0;
                    result.offset += bias / 2.0;
                }
                for (&(i, j), bias) in &self.quadratic {
                    result.quadratic.insert((i, j), bias / 4.0);
                    result.linear[i] += bias / 4.0;
                    result.linear[j] += bias / 4.0;
                    result.offset += bias / 4.0;
                }
            }
            (Vartype::Spin, Vartype::Binary) => {
                // s = 2x - 1
                for (i, bias) in self.linear.iter().enumerate() {
                    result.linear[i] += 2.0 * bias;
                    result.offset -= bias;
                }
                for (&(i, j), bias) in &self.quadratic {
                    result.quadratic.insert((i, j), 4.0 * bias);
                    result.linear[i] -= 2.0 * bias;
                    result.linear[j] -= 2.0 * bias;
                    result.offset += bias;
                }
            }
        }
        result
    }

    /// The objective value of `assignment`. Variables it doesn't mention are false.
    pub fn energy(&self, assignment: &Assignment) -> f64 {
        let values = self
            .variables
            .iter()
            .map(|var| {
                self.vartype
                    .value(assignment.get(var).copied().unwrap_or(false))
            })
            .collect::<Vec<_>>();
        self.energy_of_values(&values)
    }

    fn energy_of_values(&self, values: &[f64]) -> f64 {
        let mut energy = self.offset;
        for (bias, value) in self.linear.iter().zip(values) {
            energy += bias * value;
        }
        for (&(i, j), bias) in &self.quadratic {
            energy += bias * values[i] * values[j];
        }
        energy
    }

    /// VarIndex -> [(neighbor VarIndex, bias)]
    pub fn adjacency(&self) -> Vec<Vec<(VarIndex, f64)>> {
        let mut adj = vec![Vec::new(); self.variables.len()];
        for (&(i, j), bias) in &self.quadratic {
            adj[i].push((j, *bias));
            adj[j].push((i, *bias));
        }
        adj
    }

    pub fn linear_biases(&self) -> &[f64] {
        &self.linear
    }

    /// Turn a VarIndex-ordered state into an assignment over this model's variables.
    pub fn assignment(&self, state: &BitSlice) -> Assignment {
        self.variables
            .iter()
            .copied()
            .zip(state.iter().by_vals())
            .collect()
    }
}

fn ordered(i: VarIndex, j: VarIndex) -> (VarIndex, VarIndex) {
    if i < j {
        (i, j)
    } else {
        (j, i)
    }
}

impl fmt::Display for BinaryQuadraticModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "BQM ({:?}): {} variables, {} interactions, offset {}",
            self.vartype,
            self.variables.len(),
            self.quadratic.len(),
            self.offset
        )?;
        for (var, bias) in self.variables.iter().zip(&self.linear) {
            writeln!(f, "    {} {}", var, bias)?;
        }
        for (u, v, bias) in self.interactions() {
            writeln!(f, "    {} {} {}", u, v, bias)?;
        }
        Ok(())
    }
}

#[cfg(test)]
fn example_model() -> BinaryQuadraticModel {
    let a = Variable::new(0, 0, 0);
    let b = Variable::new(0, 0, 1);
    let c = Variable::new(0, 1, 0);
    let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
    bqm.add_linear(a, -1.0);
    bqm.add_linear(b, 0.5);
    bqm.add_linear(c, 2.0);
    bqm.add_quadratic(a, b, 2.0);
    bqm.add_quadratic(b, c, -3.0);
    bqm.add_offset(1.5);
    bqm
}

#[cfg(test)]
fn all_assignments(vars: &[Variable]) -> Vec<Assignment> {
    (0..1usize << vars.len())
        .map(|bits| {
            vars.iter()
                .enumerate()
                .map(|(i, var)| (*var, bits & (1 << i) != 0))
                .collect()
        })
        .collect()
}

#[test]
fn test_model_terms() {
    let bqm = example_model();
    let a = Variable::new(0, 0, 0);
    let b = Variable::new(0, 0, 1);
    let c = Variable::new(0, 1, 0);

    assert_eq!(bqm.num_variables(), 3);
    assert_eq!(bqm.num_interactions(), 2);
    assert_eq!(bqm.linear(&a), Some(-1.0));
    assert_eq!(bqm.quadratic(&b, &a), Some(2.0));
    assert_eq!(bqm.quadratic(&a, &c), None);
    assert_eq!(bqm.linear(&Variable::new(5, 5, 5)), None);

    let mut bqm = bqm;
    bqm.add_quadratic(a, a, 4.0);
    assert_eq!(bqm.linear(&a), Some(3.0));
}

#[test]
fn test_model_energy() {
    let bqm = example_model();
    let a = Variable::new(0, 0, 0);
    let b = Variable::new(0, 0, 1);
    let c = Variable::new(0, 1, 0);

    assert_eq!(bqm.energy(&Assignment::new()), 1.5);
    let assignment = Assignment::from([(a, true), (b, true), (c, false)]);
    assert_eq!(bqm.energy(&assignment), 1.5 - 1.0 + 0.5 + 2.0);
    let assignment = Assignment::from([(a, false), (b, true), (c, true)]);
    assert_eq!(bqm.energy(&assignment), 1.5 + 0.5 + 2.0 - 3.0);
}

#[test]
fn test_change_vartype() {
    let bqm = example_model();
    let spin = bqm.change_vartype(Vartype::Spin);
    assert_eq!(spin.vartype(), Vartype::Spin);
    for assignment in all_assignments(bqm.variables()) {
        assert!((bqm.energy(&assignment) - spin.energy(&assignment)).abs() < 1e-9);
    }
    let back = spin.change_vartype(Vartype::Binary);
    for assignment in all_assignments(bqm.variables()) {
        assert!((bqm.energy(&assignment) - back.energy(&assignment)).abs() < 1e-9);
    }
}

#[test]
fn test_update_mixed_vartypes() {
    let binary = example_model();
    let mut spin = BinaryQuadraticModel::new(Vartype::Spin);
    spin.update(&binary);
    spin.update(&binary);
    for assignment in all_assignments(binary.variables()) {
        let expected = 2.0 * binary.energy(&assignment);
        assert!((spin.energy(&assignment) - expected).abs() < 1e-9);
    }
}
