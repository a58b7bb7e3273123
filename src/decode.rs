use crate::grid::Grid;
use crate::label::Variable;
use crate::model::Assignment;
use std::collections::BTreeMap;
use std::fmt;

/// Read an oracle's assignment back into a grid.
///
/// Starts from a copy of `original` and, for every true variable in `(row, col, digit)`
/// order, writes its digit into its cell. If several variables for one cell are true, the
/// last one wins; cells with no true variable keep their original digit. Variables outside
/// the grid are ignored. Use [`decode_checked`] to find out when either of those happened.
pub fn decode(assignment: &Assignment, original: &Grid) -> Grid {
    let mut result = original.clone();
    for (row, col, digit) in true_cells(assignment, original) {
        result.set(row, col, digit);
    }
    result
}

/// Something suspicious about an assignment, found while decoding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeAmbiguity {
    /// More than one digit was selected for this cell. The last one was kept.
    Conflict {
        row: usize,
        col: usize,
        digits: Vec<u32>,
    },
    /// No digit was selected for this cell. It kept its original value.
    Undecided { row: usize, col: usize },
}

impl fmt::Display for DecodeAmbiguity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeAmbiguity::Conflict { row, col, digits } => write!(
                f,
                "warning: cell ({}, {}) was assigned {} digits {:?}; kept {}",
                row,
                col,
                digits.len(),
                digits,
                digits.last().copied().unwrap_or_default()
            ),
            DecodeAmbiguity::Undecided { row, col } => {
                write!(f, "warning: cell ({}, {}) was not assigned a digit", row, col)
            }
        }
    }
}

/// Like [`decode`], but also report every cell that received zero or several digits.
pub fn decode_checked(assignment: &Assignment, original: &Grid) -> (Grid, Vec<DecodeAmbiguity>) {
    let mut writes: BTreeMap<(usize, usize), Vec<u32>> = BTreeMap::new();
    for (row, col, digit) in true_cells(assignment, original) {
        writes.entry((row, col)).or_default().push(digit);
    }

    let mut result = original.clone();
    let mut warnings = Vec::new();
    for (row, col) in original.cells() {
        match writes.remove(&(row, col)) {
            None => warnings.push(DecodeAmbiguity::Undecided { row, col }),
            Some(digits) => {
                if let Some(digit) = digits.last() {
                    result.set(row, col, *digit);
                }
                if digits.len() > 1 {
                    warnings.push(DecodeAmbiguity::Conflict { row, col, digits });
                }
            }
        }
    }
    (result, warnings)
}

fn true_cells<'a>(
    assignment: &'a Assignment,
    grid: &'a Grid,
) -> impl Iterator<Item = (usize, usize, u32)> + 'a {
    let n = grid.side();
    assignment
        .iter()
        .filter(|(_, truth)| **truth)
        .map(|(var, _)| (var.row, var.col, var.digit))
        .filter(move |(row, col, _)| *row < n && *col < n)
}

/// The assignment that selects each cell's current digit, and nothing else.
pub fn encode_as_assignment(grid: &Grid) -> Assignment {
    grid.cells()
        .map(|(row, col)| (Variable::new(row, col, grid.get(row, col)), true))
        .collect()
}

#[test]
fn test_decode_scenario() {
    let grid: Grid = "0 1\n1 0".parse().unwrap();
    let mut assignment = Assignment::new();
    for row in 0..2 {
        for col in 0..2 {
            for digit in 0..2 {
                assignment.insert(Variable::new(row, col, digit), false);
            }
        }
    }
    for (row, col, digit) in [(0, 0, 0), (0, 1, 1), (1, 0, 1), (1, 1, 0)] {
        assignment.insert(Variable::new(row, col, digit), true);
    }
    assert_eq!(decode(&assignment, &grid), grid);
}

#[test]
fn test_decode_round_trip() {
    for input in ["", "3", "0 1\n1 0", "2 0 1 1\n0 0 1 3\n1 1 1 1\n0 2 0 2"] {
        let grid: Grid = input.parse().unwrap();
        let assignment = encode_as_assignment(&grid);
        assert_eq!(decode(&assignment, &grid), grid);
        let (decoded, warnings) = decode_checked(&assignment, &grid);
        assert_eq!(decoded, grid);
        assert!(warnings.is_empty());
    }
}

#[test]
fn test_decode_overwrites_and_copies() {
    let grid: Grid = "0 0\n0 0".parse().unwrap();
    let assignment = Assignment::from([
        (Variable::new(0, 1, 1), true),
        (Variable::new(1, 1, 0), true),
        (Variable::new(1, 1, 1), true),
        (Variable::new(1, 0, 1), false),
        (Variable::new(7, 0, 1), true),
    ]);
    let result = decode(&assignment, &grid);
    assert_eq!(result.rows(), &[vec![0, 1], vec![0, 1]]);
    // The input is untouched
    assert_eq!(grid.rows(), &[vec![0, 0], vec![0, 0]]);

    let (checked, warnings) = decode_checked(&assignment, &grid);
    assert_eq!(checked, result);
    assert_eq!(
        warnings,
        [
            DecodeAmbiguity::Undecided { row: 0, col: 0 },
            DecodeAmbiguity::Undecided { row: 1, col: 0 },
            DecodeAmbiguity::Conflict {
                row: 1,
                col: 1,
                digits: vec![0, 1]
            },
        ]
    );
    assert_eq!(
        warnings[2].to_string(),
        "warning: cell (1, 1) was assigned 2 digits [0, 1]; kept 1"
    );
}
