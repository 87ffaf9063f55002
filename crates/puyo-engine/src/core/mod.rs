pub use self::{grid::*, group::*, piece::*, placement::*};

pub(crate) mod grid;
pub(crate) mod group;
pub(crate) mod piece;
pub(crate) mod placement;

/// Number of rows in the grid.
pub const ROWS: usize = 12;
/// Number of columns in the grid.
pub const COLS: usize = 6;
/// Column of the pivot cell of a freshly spawned piece.
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const SPAWN_COL: i32 = (COLS / 2) as i32;
