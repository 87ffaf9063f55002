use std::time::Duration;

use serde::Serialize;

use crate::{Grid, Group, SessionTiming, find_groups};

/// State of the clear → gravity → re-scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, derive_more::IsVariant)]
pub enum ResolveState {
    /// No cascade in progress.
    #[default]
    Idle,
    /// Groups were removed; gravity is due next.
    Clearing,
    /// Gravity was applied; a group scan is due next.
    Settling,
}

/// What happened when a resolution step fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResolveStep {
    /// The scan found groups and removed their cells.
    Cleared { chain: usize, groups: Vec<Group> },
    /// Gravity was applied after a clear.
    Settled { chain: usize },
    /// The scan found nothing; `chain` clears happened in this cascade.
    Finished { chain: usize },
}

/// The resolution cycle as an explicit state machine.
///
/// Each call to [`Resolution::fire`] performs exactly one step and schedules
/// the next one after the configured delay:
///
/// ```text
/// Settling --scan, groups found--> Clearing --gravity--> Settling
///     \
///      `--scan, nothing found--> Idle
/// ```
///
/// A lock enters the cycle in `Settling`, since gravity is applied as part of
/// locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    state: ResolveState,
    remaining: Duration,
    chain: usize,
}

impl Default for Resolution {
    fn default() -> Self {
        Self::IDLE
    }
}

impl Resolution {
    pub const IDLE: Self = Self {
        state: ResolveState::Idle,
        remaining: Duration::ZERO,
        chain: 0,
    };

    /// Starts a cycle for a freshly locked piece; the first scan is due after
    /// the lock delay.
    #[must_use]
    pub fn after_lock(timing: &SessionTiming) -> Self {
        Self {
            state: ResolveState::Settling,
            remaining: timing.lock_delay,
            chain: 0,
        }
    }

    /// Starts a cycle whose first scan is due immediately.
    #[must_use]
    pub fn scan_now() -> Self {
        Self {
            state: ResolveState::Settling,
            remaining: Duration::ZERO,
            chain: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> ResolveState {
        self.state
    }

    /// Returns the number of clears performed so far in this cascade.
    #[must_use]
    pub fn chain(&self) -> usize {
        self.chain
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Returns the time until the next step is due, or `None` when idle.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        (!self.is_idle()).then_some(self.remaining)
    }

    /// Lets time pass without firing a step.
    pub fn wait(&mut self, elapsed: Duration) {
        self.remaining = self.remaining.saturating_sub(elapsed);
    }

    /// Fires the pending step regardless of the remaining delay.
    ///
    /// Returns the updated grid and what happened, or `None` when idle.
    pub fn fire(&mut self, grid: &Grid, timing: &SessionTiming) -> Option<(Grid, ResolveStep)> {
        match self.state {
            ResolveState::Idle => None,
            ResolveState::Settling => {
                let groups = find_groups(grid);
                if groups.is_empty() {
                    *self = Self {
                        chain: self.chain,
                        ..Self::IDLE
                    };
                    return Some((*grid, ResolveStep::Finished { chain: self.chain }));
                }
                let cells: Vec<_> = groups.iter().flat_map(Group::cells).copied().collect();
                self.chain += 1;
                self.state = ResolveState::Clearing;
                self.remaining = timing.clear_delay;
                Some((
                    grid.without(&cells),
                    ResolveStep::Cleared {
                        chain: self.chain,
                        groups,
                    },
                ))
            }
            ResolveState::Clearing => {
                self.state = ResolveState::Settling;
                self.remaining = timing.cascade_delay;
                Some((
                    grid.apply_gravity(),
                    ResolveStep::Settled { chain: self.chain },
                ))
            }
        }
    }
}

/// One clear of a cascade, as reported by [`resolve_fully`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainStep {
    /// 1-based position of this clear in the cascade.
    pub chain: usize,
    /// Groups removed by this clear.
    pub groups: Vec<Group>,
    /// The grid after the removed cells' columns have settled.
    pub grid: Grid,
}

impl ChainStep {
    #[must_use]
    pub fn cleared_cells(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }
}

/// Result of running a cascade to its fixed point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// The grid once no group qualifies any more.
    pub grid: Grid,
    pub steps: Vec<ChainStep>,
}

impl ResolveReport {
    /// Returns the number of clears in the cascade.
    #[must_use]
    pub fn chain_length(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn cleared_cells(&self) -> usize {
        self.steps.iter().map(ChainStep::cleared_cells).sum()
    }
}

/// Runs clear → gravity → re-scan on `grid` until no group qualifies,
/// without any delays.
///
/// The first scan runs on `grid` as given; callers holding an unsettled grid
/// should apply gravity first.
///
/// ```
/// use puyo_engine::{Grid, resolve_fully};
///
/// let grid = Grid::from_ascii(
///     "
///     G.....
///     RRRR..
///     GGG...
///     ",
/// )
/// .unwrap();
///
/// let report = resolve_fully(&grid);
/// assert_eq!(report.chain_length(), 2);
/// assert!(report.grid.is_vacant());
/// ```
#[must_use]
pub fn resolve_fully(grid: &Grid) -> ResolveReport {
    let timing = SessionTiming::instant();
    let mut resolution = Resolution::scan_now();
    let mut grid = *grid;
    let mut steps = vec![];
    let mut cleared = None;

    while let Some((next, step)) = resolution.fire(&grid, &timing) {
        grid = next;
        match step {
            ResolveStep::Cleared { chain, groups } => cleared = Some((chain, groups)),
            ResolveStep::Settled { .. } => {
                if let Some((chain, groups)) = cleared.take() {
                    steps.push(ChainStep {
                        chain,
                        groups,
                        grid,
                    });
                }
            }
            ResolveStep::Finished { .. } => {}
        }
    }

    ResolveReport { grid, steps }
}
