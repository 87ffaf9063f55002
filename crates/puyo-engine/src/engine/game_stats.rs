use serde::{Deserialize, Serialize};

use crate::Group;

/// Counters accumulated over a session.
///
/// - **Completed pieces**: pieces locked into the grid
/// - **Cleared cells / groups**: everything removed by cascades
/// - **Chains**: cascades that cleared at least once, and the longest one
///
/// # Example
///
/// ```
/// use puyo_engine::SessionStats;
///
/// let mut stats = SessionStats::new();
/// stats.complete_piece_drop();
/// stats.finish_chain(3);
/// stats.finish_chain(0);
///
/// assert_eq!(stats.completed_pieces(), 1);
/// assert_eq!(stats.chains(), 1);
/// assert_eq!(stats.max_chain(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    completed_pieces: usize,
    cleared_cells: usize,
    cleared_groups: usize,
    chains: usize,
    max_chain: usize,
}

impl SessionStats {
    /// Creates a new tracker with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            completed_pieces: 0,
            cleared_cells: 0,
            cleared_groups: 0,
            chains: 0,
            max_chain: 0,
        }
    }

    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    #[must_use]
    pub const fn cleared_cells(&self) -> usize {
        self.cleared_cells
    }

    #[must_use]
    pub const fn cleared_groups(&self) -> usize {
        self.cleared_groups
    }

    /// Returns the number of cascades that cleared at least one group.
    #[must_use]
    pub const fn chains(&self) -> usize {
        self.chains
    }

    /// Returns the largest number of clears in a single cascade.
    #[must_use]
    pub const fn max_chain(&self) -> usize {
        self.max_chain
    }

    /// Called each time a piece is locked into the grid.
    pub const fn complete_piece_drop(&mut self) {
        self.completed_pieces += 1;
    }

    /// Called for each clear step of a cascade.
    pub fn record_clear(&mut self, groups: &[Group]) {
        self.cleared_groups += groups.len();
        self.cleared_cells += groups.iter().map(Group::len).sum::<usize>();
    }

    /// Called when a cascade reaches its fixed point after `chain` clears.
    pub fn finish_chain(&mut self, chain: usize) {
        if chain > 0 {
            self.chains += 1;
            self.max_chain = self.max_chain.max(chain);
        }
    }
}
