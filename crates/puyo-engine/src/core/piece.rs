use arrayvec::ArrayVec;
use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::{
    SPAWN_COL,
    grid::{Color, Grid, Position},
    placement::{self, Direction, Rotation},
};

/// Largest number of cells in any piece.
pub const MAX_PIECE_CELLS: usize = 13;

/// Displacement of a piece cell relative to the spawn pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellOffset {
    pub row: i32,
    pub col: i32,
}

const fn o(row: i32, col: i32) -> CellOffset {
    CellOffset { row, col }
}

const PAIR_OFFSETS: [CellOffset; 2] = [o(0, 0), o(-1, 0)];

const SPECIAL_OFFSETS: [CellOffset; MAX_PIECE_CELLS] = [
    o(-4, 0),
    o(-3, -1),
    o(-3, 0),
    o(-3, 1),
    o(-2, -2),
    o(-2, -1),
    o(-2, 0),
    o(-2, 1),
    o(-2, 2),
    o(-1, -1),
    o(-1, 1),
    o(0, -2),
    o(0, 2),
];

/// Archetype of a falling piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Two cells stacked vertically; the lower one is the pivot.
    Pair,
    /// Thirteen-cell shape spanning five columns.
    Special,
}

impl Distribution<ShapeKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ShapeKind {
        if rng.random_bool(ShapeKind::SPECIAL_PROBABILITY) {
            ShapeKind::Special
        } else {
            ShapeKind::Pair
        }
    }
}

impl ShapeKind {
    /// Probability that a newly generated piece is [`ShapeKind::Special`].
    pub const SPECIAL_PROBABILITY: f64 = 0.05;

    /// Returns the cell offsets of this shape; the first one is the pivot.
    #[must_use]
    pub const fn offsets(self) -> &'static [CellOffset] {
        match self {
            Self::Pair => &PAIR_OFFSETS,
            Self::Special => &SPECIAL_OFFSETS,
        }
    }

    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.offsets().len()
    }
}

/// A concrete cell of a falling piece.
///
/// Rows may be negative while the cell is above the visible grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceCell {
    pub row: i32,
    pub col: i32,
    pub color: Color,
}

impl PieceCell {
    /// Returns the grid position of this cell, or `None` if it lies outside
    /// the grid.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        Position::try_new(self.row, self.col)
    }

    #[must_use]
    const fn translated(self, drow: i32, dcol: i32) -> Self {
        Self {
            row: self.row + drow,
            col: self.col + dcol,
            color: self.color,
        }
    }

    #[must_use]
    const fn rotated_about(self, pivot: Self, rotation: Rotation) -> Self {
        let drow = self.row - pivot.row;
        let dcol = self.col - pivot.col;
        let (row, col) = match rotation {
            Rotation::Clockwise => (pivot.row - dcol, pivot.col + drow),
            Rotation::CounterClockwise => (pivot.row + dcol, pivot.col - drow),
        };
        Self {
            row,
            col,
            color: self.color,
        }
    }
}

/// Creates a spawned piece: a random shape whose cells are colored
/// independently.
impl Distribution<ActivePiece> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ActivePiece {
        let shape: ShapeKind = rng.random();
        ActivePiece::random(shape, rng)
    }
}

/// The piece currently under player control.
///
/// An ordered, non-empty list of cells. The first cell is the pivot used
/// for rotation. Pieces are values: movement and rotation return new pieces
/// and leave `self` unchanged.
///
/// # Example
///
/// ```
/// use puyo_engine::{ActivePiece, Color, Direction, Grid, ShapeKind};
///
/// let grid = Grid::EMPTY;
/// let piece = ActivePiece::with_colors(ShapeKind::Pair, [Color::Red, Color::Blue]);
/// assert_eq!(piece.pivot().row, 0);
/// assert_eq!(piece.pivot().col, 3);
///
/// let moved = piece.moved(Direction::Left, &grid).unwrap();
/// assert_eq!(moved.pivot().col, 2);
///
/// let dropped = piece.drop_position(&grid);
/// assert_eq!(dropped.pivot().row, 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ActivePiece {
    shape: ShapeKind,
    cells: ArrayVec<PieceCell, MAX_PIECE_CELLS>,
}

impl ActivePiece {
    /// Creates a piece at its spawn position with the given cell colors.
    ///
    /// # Panics
    ///
    /// Panics if the number of colors differs from the shape's cell count.
    #[must_use]
    pub fn with_colors<I>(shape: ShapeKind, colors: I) -> Self
    where
        I: IntoIterator<Item = Color>,
    {
        let cells: ArrayVec<_, MAX_PIECE_CELLS> = shape
            .offsets()
            .iter()
            .zip(colors)
            .map(|(offset, color)| PieceCell {
                row: offset.row,
                col: SPAWN_COL + offset.col,
                color,
            })
            .collect();
        assert_eq!(
            cells.len(),
            shape.cell_count(),
            "every cell of the shape needs a color"
        );
        Self { shape, cells }
    }

    /// Creates a piece at its spawn position, coloring each cell
    /// independently at random.
    #[must_use]
    pub fn random<R>(shape: ShapeKind, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let colors: ArrayVec<Color, MAX_PIECE_CELLS> =
            (0..shape.cell_count()).map(|_| rng.random()).collect();
        Self::with_colors(shape, colors)
    }

    /// Creates a piece from explicit cells. The first cell is the pivot.
    ///
    /// # Panics
    ///
    /// Panics if `cells` is empty or has more than [`MAX_PIECE_CELLS`] cells.
    #[must_use]
    pub fn from_cells<I>(shape: ShapeKind, cells: I) -> Self
    where
        I: IntoIterator<Item = PieceCell>,
    {
        let cells: ArrayVec<_, MAX_PIECE_CELLS> = cells.into_iter().collect();
        assert!(!cells.is_empty(), "a piece needs at least one cell");
        Self { shape, cells }
    }

    #[must_use]
    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    #[must_use]
    pub fn cells(&self) -> &[PieceCell] {
        &self.cells
    }

    /// Returns the rotation origin (the first cell).
    #[must_use]
    pub fn pivot(&self) -> PieceCell {
        self.cells[0]
    }

    /// Returns `true` if every cell may occupy its coordinate on `grid`.
    #[must_use]
    pub fn fits(&self, grid: &Grid) -> bool {
        placement::can_place(grid, &self.cells)
    }

    /// Returns `true` if this piece, as freshly spawned, overlaps `grid`.
    #[must_use]
    pub fn is_blocked_at_spawn(&self, grid: &Grid) -> bool {
        placement::is_blocked_at_spawn(grid, &self.cells)
    }

    /// Translates every cell without any collision check.
    #[must_use]
    pub fn translated(&self, drow: i32, dcol: i32) -> Self {
        Self {
            shape: self.shape,
            cells: self
                .cells
                .iter()
                .map(|cell| cell.translated(drow, dcol))
                .collect(),
        }
    }

    /// Rotates every cell about the pivot without any collision check.
    #[must_use]
    pub fn rotated(&self, rotation: Rotation) -> Self {
        let pivot = self.pivot();
        Self {
            shape: self.shape,
            cells: self
                .cells
                .iter()
                .map(|cell| cell.rotated_about(pivot, rotation))
                .collect(),
        }
    }

    /// Moves the piece one step, or returns `None` if any moved cell would
    /// be blocked.
    #[must_use]
    pub fn moved(&self, direction: Direction, grid: &Grid) -> Option<Self> {
        let (drow, dcol) = direction.delta();
        Some(self.translated(drow, dcol)).filter(|piece| piece.fits(grid))
    }

    /// Rotates the piece, or returns `None` if any rotated cell would be
    /// invalid. No alternative positions are tried.
    #[must_use]
    pub fn rotated_on(&self, rotation: Rotation, grid: &Grid) -> Option<Self> {
        Some(self.rotated(rotation))
            .filter(|piece| placement::can_rotate_into(grid, &piece.cells))
    }

    /// Returns the lowest position reachable by repeated one-row descents.
    #[must_use]
    pub fn drop_position(&self, grid: &Grid) -> Self {
        let mut dropped = self.clone();
        while let Some(piece) = dropped.moved(Direction::Down, grid) {
            dropped = piece;
        }
        dropped
    }
}
