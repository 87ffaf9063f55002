use serde::Serialize;

use super::{
    COLS, ROWS,
    grid::{Color, Grid, Position},
};

/// Smallest connected component that gets cleared.
pub const MIN_GROUP_SIZE: usize = 4;

/// A maximal 4-connected set of same-colored settled cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    color: Color,
    cells: Vec<Position>,
}

impl Group {
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Returns the member cells in discovery order.
    #[must_use]
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Finds every connected component of at least [`MIN_GROUP_SIZE`] cells.
///
/// Components are discovered in row-major order of their first cell. Each
/// occupied cell is explored exactly once.
#[must_use]
pub fn find_groups(grid: &Grid) -> Vec<Group> {
    let mut visited = [[false; COLS]; ROWS];
    let mut groups = vec![];
    let mut stack = vec![];

    for (origin, color) in grid.occupied() {
        if visited[origin.row()][origin.col()] {
            continue;
        }
        visited[origin.row()][origin.col()] = true;
        stack.push(origin);

        let mut cells = vec![];
        while let Some(pos) = stack.pop() {
            cells.push(pos);
            for next in pos.neighbors() {
                if !visited[next.row()][next.col()] && grid.get(next) == Some(color) {
                    visited[next.row()][next.col()] = true;
                    stack.push(next);
                }
            }
        }

        if cells.len() >= MIN_GROUP_SIZE {
            groups.push(Group { color, cells });
        }
    }
    groups
}

/// Returns the cells of every clearable group as one flat list.
#[must_use]
pub fn find_clearable(grid: &Grid) -> Vec<Position> {
    find_groups(grid)
        .into_iter()
        .flat_map(|group| group.cells)
        .collect()
}
