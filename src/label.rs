use crate::model::Assignment;
use std::fmt;
use std::str::FromStr;

/// A decision variable: "the cell at (`row`, `col`) holds `digit`".
///
/// Ordering is by row, then column, then digit. The decoder relies on this
/// when it walks an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    pub row: usize,
    pub col: usize,
    pub digit: u32,
}

impl Variable {
    pub fn new(row: usize, col: usize, digit: u32) -> Variable {
        Variable { row, col, digit }
    }
}

/// Labels look like `2,3_1`: row 2, column 3, digit 1.
impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}_{}", self.row, self.col, self.digit)
    }
}

impl FromStr for Variable {
    type Err = LabelError;

    fn from_str(label: &str) -> Result<Variable, LabelError> {
        let bad = || LabelError::BadLabel(label.to_owned());

        let (coord, digit) = label.split_once('_').ok_or_else(bad)?;
        let (row, col) = coord.split_once(',').ok_or_else(bad)?;
        Ok(Variable {
            row: usize::from_str(row).map_err(|_| bad())?,
            col: usize::from_str(col).map_err(|_| bad())?,
            digit: u32::from_str(digit).map_err(|_| bad())?,
        })
    }
}

/// Read an assignment written by an external oracle: one `label value` pair per line, where
/// value is `1` for true and `0` or `-1` for false (so both binary and spin samples work).
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_assignment(input: &str) -> Result<Assignment, LabelError> {
    let mut assignment = Assignment::new();
    for (line_num, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut words = line.split_whitespace();
        let (label, value) = match (words.next(), words.next(), words.next()) {
            (Some(label), Some(value), None) => (label, value),
            _ => {
                return Err(LabelError::BadLine {
                    line: line_num + 1,
                    text: line.to_owned(),
                })
            }
        };
        let truth = match value {
            "1" | "+1" => true,
            "0" | "-1" => false,
            _ => {
                return Err(LabelError::BadLine {
                    line: line_num + 1,
                    text: line.to_owned(),
                })
            }
        };
        assignment.insert(Variable::from_str(label)?, truth);
    }
    Ok(assignment)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    BadLabel(String),
    /// A line of an assignment that isn't `label value`, with its 1-based line number.
    BadLine { line: usize, text: String },
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LabelError::BadLabel(label) => write!(
                f,
                "Bad variable label '{}' (expected 'row,col_digit')",
                label
            ),
            LabelError::BadLine { line, text } => write!(
                f,
                "Bad assignment on line {}: '{}' (expected 'label value')",
                line, text
            ),
        }
    }
}

impl std::error::Error for LabelError {}

#[test]
fn test_label() {
    let var = Variable::new(12, 3, 1);
    assert_eq!(var.to_string(), "12,3_1");
    assert_eq!("12,3_1".parse::<Variable>(), Ok(var));
    assert_eq!("0,0_0".parse::<Variable>(), Ok(Variable::new(0, 0, 0)));

    assert!("12,3".parse::<Variable>().is_err());
    assert!("12_3".parse::<Variable>().is_err());
    assert!("a,3_1".parse::<Variable>().is_err());
    assert!("1,3_-1".parse::<Variable>().is_err());
    assert_eq!(
        "x".parse::<Variable>().unwrap_err().to_string(),
        "Bad variable label 'x' (expected 'row,col_digit')"
    );
}

#[test]
fn test_label_order() {
    let mut vars = vec![
        Variable::new(1, 0, 0),
        Variable::new(0, 1, 1),
        Variable::new(0, 1, 0),
        Variable::new(0, 0, 1),
    ];
    vars.sort();
    assert_eq!(
        vars.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
        ["0,0_1", "0,1_0", "0,1_1", "1,0_0"]
    );
}

#[test]
fn test_parse_assignment() {
    let input = "# best sample\n0,0_0 1\n0,0_1 -1\n\n1,1_1 0\n";
    let assignment = parse_assignment(input).unwrap();
    assert_eq!(
        assignment,
        Assignment::from([
            (Variable::new(0, 0, 0), true),
            (Variable::new(0, 0, 1), false),
            (Variable::new(1, 1, 1), false),
        ])
    );

    assert_eq!(
        parse_assignment("0,0_0 1\n0,0_1 2\n"),
        Err(LabelError::BadLine {
            line: 2,
            text: "0,0_1 2".to_owned()
        })
    );
    assert_eq!(
        parse_assignment("0,0_0\n"),
        Err(LabelError::BadLine {
            line: 1,
            text: "0,0_0".to_owned()
        })
    );
    assert_eq!(
        parse_assignment("00_0 1\n"),
        Err(LabelError::BadLabel("00_0".to_owned()))
    );
}
