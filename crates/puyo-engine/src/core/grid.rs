use std::{fmt, str::FromStr};

use arrayvec::ArrayVec;
use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::{COLS, ROWS, piece::ActivePiece};

/// Color of a settled or falling cell.
///
/// Colors carry no ordering; grouping only compares them for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Distribution<Color> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        Color::ALL[rng.random_range(0..Color::LEN)]
    }
}

impl Color {
    /// Number of colors (4).
    pub const LEN: usize = 4;

    pub const ALL: [Self; Self::LEN] = [Self::Red, Self::Green, Self::Blue, Self::Yellow];

    /// Returns the single character used for this color in grid pictures.
    ///
    /// # Examples
    ///
    /// ```
    /// use puyo_engine::Color;
    ///
    /// assert_eq!(Color::Red.as_char(), 'R');
    /// assert_eq!(Color::Yellow.as_char(), 'Y');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Green => 'G',
            Self::Blue => 'B',
            Self::Yellow => 'Y',
        }
    }

    /// Parses a color from its grid picture character (case-insensitive).
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(Self::Red),
            'G' => Some(Self::Green),
            'B' => Some(Self::Blue),
            'Y' => Some(Self::Yellow),
            _ => None,
        }
    }
}

/// In-bounds coordinate of a grid cell.
///
/// Row 0 is the top of the grid, column 0 the left wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    /// Creates a position.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the grid.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        assert!(row < ROWS, "row out of grid bounds");
        assert!(col < COLS, "column out of grid bounds");
        Self { row, col }
    }

    /// Creates a position from signed piece coordinates, or `None` when the
    /// coordinate lies outside the grid (including above it).
    #[must_use]
    pub fn try_new(row: i32, col: i32) -> Option<Self> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        (row < ROWS && col < COLS).then_some(Self { row, col })
    }

    #[must_use]
    pub const fn row(self) -> usize {
        self.row
    }

    #[must_use]
    pub const fn col(self) -> usize {
        self.col
    }

    /// Returns the in-bounds 4-neighbours (up, down, left, right).
    #[must_use]
    pub fn neighbors(self) -> ArrayVec<Self, 4> {
        let Self { row, col } = self;
        let mut neighbors = ArrayVec::new();
        if row > 0 {
            neighbors.push(Self { row: row - 1, col });
        }
        if row + 1 < ROWS {
            neighbors.push(Self { row: row + 1, col });
        }
        if col > 0 {
            neighbors.push(Self { row, col: col - 1 });
        }
        if col + 1 < COLS {
            neighbors.push(Self { row, col: col + 1 });
        }
        neighbors
    }
}

/// Error returned when parsing a grid picture.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GridParseError {
    #[display("expected at most {} rows, got {rows}", ROWS)]
    TooManyRows { rows: usize },
    #[display("line {line}: expected {} cells, got {width}", COLS)]
    RowWidth { line: usize, width: usize },
    #[display("line {line}, column {col}: invalid cell {cell:?}")]
    InvalidCell { line: usize, col: usize, cell: char },
}

/// The settled cells of the playing field.
///
/// A fixed 12×6 matrix of optional colors. Cells are written only when a
/// piece locks and emptied only when a group clears. All transforming
/// operations return a new grid and leave `self` untouched.
///
/// # Grid pictures
///
/// Grids can be written as text, one line per row from top to bottom, using
/// `R`, `G`, `B`, `Y` for colors and `.` for empty cells. Pictures with fewer
/// than 12 lines are aligned to the bottom of the grid.
///
/// ```
/// use puyo_engine::{Color, Grid, Position};
///
/// let grid = Grid::from_ascii(
///     "
///     R.....
///     RRB...
///     ",
/// )
/// .unwrap();
///
/// assert_eq!(grid.get(Position::new(11, 0)), Some(Color::Red));
/// assert_eq!(grid.get(Position::new(10, 0)), Some(Color::Red));
/// assert_eq!(grid.occupied_count(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    cells: [[Option<Color>; COLS]; ROWS],
}

impl Default for Grid {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Grid {
    pub const ROWS: usize = ROWS;
    pub const COLS: usize = COLS;

    pub const EMPTY: Self = Self {
        cells: [[None; COLS]; ROWS],
    };

    #[must_use]
    pub fn get(&self, pos: Position) -> Option<Color> {
        self.cells[pos.row][pos.col]
    }

    pub fn set(&mut self, pos: Position, cell: Option<Color>) {
        self.cells[pos.row][pos.col] = cell;
    }

    /// Returns whether a piece cell may occupy `(row, col)`.
    ///
    /// The column is checked first: anything outside `[0, COLS)` is blocked,
    /// even above the grid. Any in-column coordinate above the grid
    /// (`row < 0`) is open, anything below the bottom row is blocked, and
    /// everything else is open iff the cell is unoccupied.
    #[must_use]
    pub fn is_empty(&self, row: i32, col: i32) -> bool {
        let Some(col) = usize::try_from(col).ok().filter(|col| *col < COLS) else {
            return false;
        };
        let Ok(row) = usize::try_from(row) else {
            return true;
        };
        row < ROWS && self.cells[row][col].is_none()
    }

    /// Returns `true` if no cell is occupied.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_none)
    }

    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Returns every position of the grid in row-major order.
    pub fn positions() -> impl Iterator<Item = Position> {
        (0..ROWS).flat_map(|row| (0..COLS).map(move |col| Position { row, col }))
    }

    /// Returns the occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Position, Color)> + '_ {
        Self::positions().filter_map(|pos| self.get(pos).map(|color| (pos, color)))
    }

    /// Returns the rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<Color>; COLS]> {
        self.cells.iter()
    }

    /// Returns the cells of a column from top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = Option<Color>> + '_ {
        self.cells.iter().map(move |row| row[col])
    }

    /// Compacts every column downward.
    ///
    /// Occupied cells keep their top-to-bottom order; the emptied cells end up
    /// at the top of the column.
    #[must_use]
    pub fn apply_gravity(&self) -> Self {
        let mut settled = Self::EMPTY;
        for col in 0..COLS {
            let mut target = ROWS;
            for row in (0..ROWS).rev() {
                if let Some(color) = self.cells[row][col] {
                    target -= 1;
                    settled.cells[target][col] = Some(color);
                }
            }
        }
        settled
    }

    /// Returns `true` if no occupied cell has an empty cell directly below it.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.cells
            .windows(2)
            .all(|pair| (0..COLS).all(|col| pair[0][col].is_none() || pair[1][col].is_some()))
    }

    /// Writes the piece's cells into the grid.
    ///
    /// Cells above the grid are dropped.
    #[must_use]
    pub fn with_piece(&self, piece: &ActivePiece) -> Self {
        let mut grid = *self;
        for cell in piece.cells() {
            if let Some(pos) = cell.position() {
                grid.set(pos, Some(cell.color));
            }
        }
        grid
    }

    /// Empties the given cells.
    #[must_use]
    pub fn without(&self, cells: &[Position]) -> Self {
        let mut grid = *self;
        for pos in cells {
            grid.set(*pos, None);
        }
        grid
    }

    /// Parses a grid picture.
    ///
    /// Blank lines and whitespace inside lines are ignored. See the
    /// [type-level documentation](Self#grid-pictures) for the format.
    pub fn from_ascii(art: &str) -> Result<Self, GridParseError> {
        let lines: Vec<&str> = art.lines().filter(|line| !line.trim().is_empty()).collect();
        if lines.len() > ROWS {
            return Err(GridParseError::TooManyRows { rows: lines.len() });
        }

        let mut grid = Self::EMPTY;
        let top = ROWS - lines.len();
        for (line_index, line) in lines.iter().enumerate() {
            let cells: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if cells.len() != COLS {
                return Err(GridParseError::RowWidth {
                    line: line_index,
                    width: cells.len(),
                });
            }
            for (col, &ch) in cells.iter().enumerate() {
                let cell = match ch {
                    '.' => None,
                    _ => Some(Color::from_char(ch).ok_or(GridParseError::InvalidCell {
                        line: line_index,
                        col,
                        cell: ch,
                    })?),
                };
                grid.cells[top + line_index][col] = cell;
            }
        }
        Ok(grid)
    }

    fn row_string(row: &[Option<Color>; COLS]) -> String {
        row.iter()
            .map(|cell| cell.map_or('.', Color::as_char))
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(&Self::row_string(row))?;
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = GridParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ascii(s)
    }
}

impl Serialize for Grid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: ["......", "..R...", ...] (top row first)
        serializer.collect_seq(self.cells.iter().map(Self::row_string))
    }
}

impl<'de> Deserialize<'de> for Grid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rows = Vec::<String>::deserialize(deserializer)?;
        if rows.len() != ROWS {
            return Err(serde::de::Error::custom(format!(
                "expected {ROWS} rows, got {}",
                rows.len()
            )));
        }
        Self::from_ascii(&rows.join("\n")).map_err(serde::de::Error::custom)
    }
}
