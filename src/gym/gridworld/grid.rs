use std::{fmt, ops::Index, str::FromStr};

use crate::{Error, Result};

/// A `(row, column)` position on the grid
pub type Pos = (usize, usize);

/// The content of a single grid square
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Start,
    Goal,
    Obstacle,
}

impl Cell {
    /// Parse a single cell token, case-insensitive
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "." => Some(Cell::Empty),
            "S" | "s" => Some(Cell::Start),
            "G" | "g" => Some(Cell::Goal),
            "X" | "x" => Some(Cell::Obstacle),
            _ => None,
        }
    }

    /// Whether an agent may stand on this cell and act from it
    pub fn is_walkable(self) -> bool {
        matches!(self, Cell::Empty | Cell::Start)
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Start => 'S',
            Cell::Goal => 'G',
            Cell::Obstacle => 'X',
        }
    }
}

/// A validated rectangular grid with exactly one start and one goal
///
/// Cells are stored row-major. The grid is immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
    rows: usize,
    cols: usize,
    start: Pos,
    goal: Pos,
}

impl Grid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The configured start position
    pub fn start(&self) -> Pos {
        self.start
    }

    /// The goal position
    pub fn goal(&self) -> Pos {
        self.goal
    }

    pub fn contains(&self, (row, col): Pos) -> bool {
        row < self.rows && col < self.cols
    }

    /// The cell at `pos`, or `None` if it lies off the grid
    pub fn get(&self, pos: Pos) -> Option<Cell> {
        self.contains(pos).then(|| self.cells[self.index_of(pos)])
    }

    /// Row-major index of an in-bounds position
    pub(crate) fn index_of(&self, (row, col): Pos) -> usize {
        row * self.cols + col
    }

    /// Every position on the grid, row-major
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| (row, col)))
    }
}

impl Index<Pos> for Grid {
    type Output = Cell;

    fn index(&self, pos: Pos) -> &Self::Output {
        &self.cells[self.index_of(pos)]
    }
}

impl FromStr for Grid {
    type Err = Error;

    /// Parse the `|S|.|X|G|` text format
    ///
    /// Lines starting with `-` are borders and are skipped. Any other line must be a row.
    fn from_str(text: &str) -> Result<Self> {
        let mut cells = Vec::new();
        let mut rows = 0;
        let mut cols = 0;
        let mut starts = Vec::new();
        let mut goals = Vec::new();

        for line in text.lines().map(str::trim_end) {
            if line.starts_with('-') {
                continue;
            }
            let inner = match line {
                "|" => "",
                _ => line
                    .strip_prefix('|')
                    .and_then(|l| l.strip_suffix('|'))
                    .ok_or_else(|| Error::GridFormat(format!("invalid line: {line:?}")))?,
            };

            let tokens = inner.split('|').collect::<Vec<_>>();
            if tokens == [""] {
                return Err(Error::GridFormat(format!("row {rows} has no cells")));
            }

            for (col, token) in tokens.iter().enumerate() {
                let cell = Cell::from_token(token).ok_or_else(|| {
                    Error::GridFormat(format!("invalid cell {token:?} at ({rows}, {col})"))
                })?;
                match cell {
                    Cell::Start => starts.push((rows, col)),
                    Cell::Goal => goals.push((rows, col)),
                    _ => {}
                }
                cells.push(cell);
            }

            if rows == 0 {
                cols = tokens.len();
            } else if tokens.len() != cols {
                return Err(Error::GridFormat(format!(
                    "row {rows} has {} cells, expected {cols}",
                    tokens.len()
                )));
            }
            rows += 1;
        }

        if rows == 0 {
            return Err(Error::GridFormat(String::from("grid has no rows")));
        }
        let (&[start], &[goal]) = (starts.as_slice(), goals.as_slice()) else {
            return Err(Error::GridFormat(format!(
                "grid needs exactly one 'S' and one 'G', found {} and {}",
                starts.len(),
                goals.len()
            )));
        };

        Ok(Self {
            cells,
            rows,
            cols,
            start,
            goal,
        })
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = "-".repeat(self.cols * 2 + 1);
        writeln!(f, "{border}")?;
        for row in self.cells.chunks(self.cols) {
            write!(f, "|")?;
            for cell in row {
                write!(f, "{}|", cell.symbol())?;
            }
            writeln!(f)?;
        }
        write!(f, "{border}")
    }
}
