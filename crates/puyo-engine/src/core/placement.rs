//! Pure placement predicates over a grid and a candidate cell set.

use super::{COLS, grid::Grid, piece::PieceCell};

/// Direction of a one-step translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Down,
}

impl Direction {
    /// Returns the `(row, col)` displacement of one step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Left => (0, -1),
            Self::Right => (0, 1),
            Self::Down => (1, 0),
        }
    }
}

/// Sense of a 90° rotation about the pivot cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Clockwise => Self::CounterClockwise,
            Self::CounterClockwise => Self::Clockwise,
        }
    }
}

/// Returns `true` if every cell may occupy its coordinate.
///
/// Uses [`Grid::is_empty`], so cells above the grid are allowed as long as
/// their column is inside the walls.
#[must_use]
pub fn can_place(grid: &Grid, cells: &[PieceCell]) -> bool {
    cells.iter().all(|cell| grid.is_empty(cell.row, cell.col))
}

/// Returns `true` if a rotation may produce the given cells.
///
/// Every column must lie inside the walls, and every cell must either be
/// above the grid or on an empty grid cell.
#[must_use]
pub fn can_rotate_into(grid: &Grid, cells: &[PieceCell]) -> bool {
    cells.iter().all(|cell| {
        usize::try_from(cell.col).is_ok_and(|col| col < COLS)
            && (cell.row < 0 || grid.is_empty(cell.row, cell.col))
    })
}

/// Returns `true` if a freshly spawned piece overlaps the settled cells.
///
/// Only cells at row 0 or below count; cells above the grid never block a
/// spawn.
#[must_use]
pub fn is_blocked_at_spawn(grid: &Grid, cells: &[PieceCell]) -> bool {
    cells
        .iter()
        .any(|cell| cell.row >= 0 && !grid.is_empty(cell.row, cell.col))
}
