use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

const GRID_SET_GAP: usize = 4;
const GRID_SET_WIDTH: usize = 90;

/************************
 *     Grid             *
 ************************/

/// An n×n matrix of digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Grid {
    rows: Vec<Vec<u32>>,
}

impl Grid {
    /// Construct a grid, checking that it is square.
    pub fn new(rows: Vec<Vec<u32>>) -> Result<Grid, InvalidGrid> {
        let n = rows.len();
        if let Some(first) = rows.first() {
            for (i, row) in rows.iter().enumerate() {
                if row.len() != first.len() {
                    return Err(InvalidGrid::Jagged {
                        row: i,
                        len: row.len(),
                        expected: first.len(),
                    });
                }
            }
            if first.len() != n {
                return Err(InvalidGrid::NotSquare {
                    rows: n,
                    cols: first.len(),
                });
            }
        }
        Ok(Grid { rows })
    }

    /// Parse one row per line, digits separated by single spaces. Trailing whitespace is
    /// stripped and blank lines are skipped.
    pub fn parse(input: &str) -> Result<Grid, InvalidGrid> {
        let mut rows = Vec::new();
        for (line_num, line) in input.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split(' ')
                .map(|word| {
                    u32::from_str(word).map_err(|_| InvalidGrid::BadEntry {
                        line: line_num + 1,
                        word: word.to_owned(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Grid::new(rows)
    }

    /// The side length n.
    pub fn side(&self) -> usize {
        self.rows.len()
    }

    /// The sub-block side length, `floor(sqrt(n))`.
    pub fn block_side(&self) -> usize {
        isqrt(self.side())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.rows[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, digit: u32) {
        self.rows[row][col] = digit;
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    /// Every `(row, col)`, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let n = self.side();
        (0..n).flat_map(move |row| (0..n).map(move |col| (row, col)))
    }

    /// Error unless n is a perfect square, so that sub-blocks tile the grid exactly.
    pub fn check_perfect_square(&self) -> Result<(), InvalidGrid> {
        let m = self.block_side();
        if m * m == self.side() {
            Ok(())
        } else {
            Err(InvalidGrid::SideNotPerfectSquare(self.side()))
        }
    }
}

impl FromStr for Grid {
    type Err = InvalidGrid;

    fn from_str(input: &str) -> Result<Grid, InvalidGrid> {
        Grid::parse(input)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in &self.rows {
            for (j, digit) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", digit)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub(crate) fn isqrt(n: usize) -> usize {
    let mut m = (n as f64).sqrt() as usize;
    while m * m > n {
        m -= 1;
    }
    while (m + 1) * (m + 1) <= n {
        m += 1;
    }
    m
}

/************************
 *     Grid Errors      *
 ************************/

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidGrid {
    /// A word that isn't a non-negative integer, with its 1-based line number.
    BadEntry { line: usize, word: String },
    Jagged {
        row: usize,
        len: usize,
        expected: usize,
    },
    NotSquare { rows: usize, cols: usize },
    SideNotPerfectSquare(usize),
}

impl fmt::Display for InvalidGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidGrid::BadEntry { line, word } => {
                write!(f, "Bad entry '{}' on line {}", word, line)
            }
            InvalidGrid::Jagged { row, len, expected } => write!(
                f,
                "Row {} has {} entries, but row 0 has {}",
                row, len, expected
            ),
            InvalidGrid::NotSquare { rows, cols } => {
                write!(f, "Grid is not square ({} rows, {} columns)", rows, cols)
            }
            InvalidGrid::SideNotPerfectSquare(n) => {
                write!(f, "Grid side {} is not a perfect square", n)
            }
        }
    }
}

impl std::error::Error for InvalidGrid {}

/************************
 *     Grid Set         *
 ************************/

/// A bunch of titled grids. This type exists solely for its `Display` method, which prints
/// them side by side when they fit in the terminal.
pub struct GridSet(pub Vec<(String, Grid)>);

impl fmt::Display for GridSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = termsize::get()
            .map(|size| size.cols as usize)
            .unwrap_or(GRID_SET_WIDTH);
        write!(f, "{}", self.render(width))
    }
}

impl GridSet {
    /// Lay the grids out in bands no wider than `max_width` columns, with a blank line between
    /// bands. A grid wider than `max_width` gets a band to itself.
    fn render(&self, max_width: usize) -> String {
        let panels = self
            .0
            .iter()
            .map(|(title, grid)| Panel::new(title, grid))
            .collect::<Vec<_>>();
        bands(&panels, max_width)
            .into_iter()
            .map(render_band)
            .join("\n")
    }
}

/// A title above the rows of one grid.
struct Panel {
    width: usize,
    lines: Vec<String>,
}

impl Panel {
    fn new(title: &str, grid: &Grid) -> Panel {
        let mut lines = vec![title.to_owned()];
        lines.extend(grid.rows().iter().map(|row| row.iter().join(" ")));
        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        Panel { width, lines }
    }
}

fn bands(panels: &[Panel], max_width: usize) -> Vec<&[Panel]> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut used = 0;
    for (i, panel) in panels.iter().enumerate() {
        if i > start && used + GRID_SET_GAP + panel.width > max_width {
            result.push(&panels[start..i]);
            start = i;
        }
        used = if i == start {
            panel.width
        } else {
            used + GRID_SET_GAP + panel.width
        };
    }
    if start < panels.len() {
        result.push(&panels[start..]);
    }
    result
}

fn render_band(band: &[Panel]) -> String {
    let height = band.iter().map(|p| p.lines.len()).max().unwrap_or(0);
    let gap = " ".repeat(GRID_SET_GAP);
    let mut out = String::new();
    for row in 0..height {
        let line = band
            .iter()
            .map(|p| {
                let text = p.lines.get(row).map(String::as_str).unwrap_or("");
                format!("{:width$}", text, width = p.width)
            })
            .join(&gap);
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[test]
fn test_parse_grid() {
    let grid = Grid::parse("0 1\n1 0   \n\n").unwrap();
    assert_eq!(grid.side(), 2);
    assert_eq!(grid.rows(), &[vec![0, 1], vec![1, 0]]);
    assert_eq!(grid.to_string(), "0 1\n1 0\n");

    let empty = Grid::parse("\n\n").unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.to_string(), "");
}

#[test]
fn test_parse_grid_errors() {
    assert_eq!(
        Grid::parse("0 1\n1 x\n"),
        Err(InvalidGrid::BadEntry {
            line: 2,
            word: "x".to_owned()
        })
    );
    // Two spaces make an empty word
    assert!(matches!(
        Grid::parse("0  1\n1 0\n"),
        Err(InvalidGrid::BadEntry { line: 1, .. })
    ));
    assert_eq!(
        Grid::parse("0 1\n1\n"),
        Err(InvalidGrid::Jagged {
            row: 1,
            len: 1,
            expected: 2
        })
    );
    assert_eq!(
        Grid::parse("0 1 0\n1 0 1\n"),
        Err(InvalidGrid::NotSquare { rows: 2, cols: 3 })
    );
}

#[test]
fn test_perfect_square() {
    assert_eq!(isqrt(0), 0);
    assert_eq!(isqrt(1), 1);
    assert_eq!(isqrt(8), 2);
    assert_eq!(isqrt(9), 3);
    assert_eq!(isqrt(17), 4);

    let grid: Grid = "0 1 1 0\n1 0 0 1\n0 1 1 0\n1 0 0 1".parse().unwrap();
    assert_eq!(grid.block_side(), 2);
    assert!(grid.check_perfect_square().is_ok());

    let grid: Grid = "0 1\n1 0".parse().unwrap();
    assert_eq!(grid.block_side(), 1);
    assert_eq!(
        grid.check_perfect_square(),
        Err(InvalidGrid::SideNotPerfectSquare(2))
    );
}

#[test]
fn test_grid_set_layout() {
    let a: Grid = "0 1\n1 0".parse().unwrap();
    let b: Grid = "1 1\n0 0".parse().unwrap();
    let set = GridSet(vec![("in".to_owned(), a), ("out".to_owned(), b)]);

    assert_eq!(set.render(20), "in     out\n0 1    1 1\n1 0    0 0\n");
    assert_eq!(set.render(8), "in\n0 1\n1 0\n\nout\n1 1\n0 0\n");
    assert_eq!(GridSet(Vec::new()).render(20), "");
}
