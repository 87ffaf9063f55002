use std::time::Duration;

use serde::Serialize;

use crate::{
    ActivePiece, CommandError, Direction, Grid, Group, ResolveState, ResolveStep, Rotation,
    ShapeKind,
};

use super::{
    PieceGenerator, PieceSeed, PieceSource, SessionStats, SessionTiming, resolution::Resolution,
};

/// Which part of the game loop currently owns the session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
pub enum Phase {
    /// A piece is falling and accepts commands.
    #[display("falling")]
    Falling,
    /// A locked piece's cascade is running; only reset is accepted.
    #[display("resolving")]
    Resolving,
    /// A spawned piece was blocked; only reset is accepted.
    ///
    /// A cascade started by the final lock still plays out.
    #[display("game over")]
    GameOver,
}

/// A player command, for callers that route input through one entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    RotateCw,
    RotateCcw,
    Reset,
}

/// Outcome of a descent tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum TickOutcome {
    /// The session was not falling.
    Ignored,
    /// The piece moved down one row.
    Descended,
    /// The piece could not move down and was locked into the grid.
    Locked,
}

/// Something observable that happened inside the session.
///
/// Events are appended as they happen and stay queued until
/// [`GameSession::drain_events`] is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    /// A piece was written into the grid; `cells` counts the cells that
    /// landed inside it.
    Locked { cells: usize },
    /// Groups were removed as the `chain`-th clear of the cascade.
    Cleared {
        chain: usize,
        groups: usize,
        cells: usize,
    },
    /// Gravity was applied after a clear.
    Settled { chain: usize },
    /// The cascade reached its fixed point.
    ChainFinished { chain: usize },
    /// A new piece became active.
    Spawned { shape: ShapeKind },
    GameOver,
    Reset,
}

/// Read-only view of a session for rendering and records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub grid: Grid,
    /// The falling piece; absent while resolving and after game over.
    pub active: Option<ActivePiece>,
    pub phase: Phase,
    pub resolve_state: ResolveState,
    pub stats: SessionStats,
}

/// A complete game session: grid, falling piece, cascade and statistics.
///
/// The session is a sequential state machine. An external scheduler
/// delivers descent ticks ([`Self::tick`]) and player commands; resolution
/// steps are scheduled internally and fired by [`Self::advance`] once their
/// delay has elapsed.
///
/// ```
/// use puyo_engine::{GameSession, Phase, PieceSeed};
///
/// let mut session = GameSession::with_seed(PieceSeed::from_bytes([7; 16]));
/// session.hard_drop().unwrap();
/// assert!(session.tick().is_locked());
/// assert_eq!(session.phase(), Phase::Resolving);
///
/// session.finish_resolution();
/// assert_eq!(session.phase(), Phase::Falling);
/// assert_eq!(session.stats().completed_pieces(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct GameSession<S = PieceGenerator> {
    grid: Grid,
    active: ActivePiece,
    phase: Phase,
    resolution: Resolution,
    source: S,
    timing: SessionTiming,
    fall_elapsed: Duration,
    stats: SessionStats,
    events: Vec<SessionEvent>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// Creates a session with a randomly seeded generator and default timing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(PieceGenerator::new(), SessionTiming::default())
    }

    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self::with_source(PieceGenerator::with_seed(seed), SessionTiming::default())
    }

    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.source.seed()
    }
}

impl<S> GameSession<S>
where
    S: PieceSource,
{
    /// Creates a session drawing pieces from `source`.
    ///
    /// The first piece is drawn immediately.
    #[must_use]
    pub fn with_source(mut source: S, timing: SessionTiming) -> Self {
        let active = source.next_piece();
        let events = vec![SessionEvent::Spawned {
            shape: active.shape(),
        }];
        Self {
            grid: Grid::EMPTY,
            active,
            phase: Phase::Falling,
            resolution: Resolution::IDLE,
            source,
            timing,
            fall_elapsed: Duration::ZERO,
            stats: SessionStats::new(),
            events,
        }
    }

    #[must_use]
    pub fn board(&self) -> &Grid {
        &self.grid
    }

    /// Returns an owned copy of the grid.
    #[must_use]
    pub fn board_snapshot(&self) -> Grid {
        self.grid
    }

    /// Returns the current piece.
    ///
    /// After game over this is the last piece that was locked.
    #[must_use]
    pub fn active_piece(&self) -> &ActivePiece {
        &self.active
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn resolve_state(&self) -> ResolveState {
        self.resolution.state()
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    #[must_use]
    pub fn timing(&self) -> &SessionTiming {
        &self.timing
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            grid: self.grid,
            active: self.phase.is_falling().then(|| self.active.clone()),
            phase: self.phase,
            resolve_state: self.resolution.state(),
            stats: self.stats.clone(),
        }
    }

    /// Removes and returns every event recorded since the last drain.
    pub fn drain_events(&mut self) -> impl Iterator<Item = SessionEvent> + '_ {
        self.events.drain(..)
    }

    /// Returns the time until the next resolution step is due, or `None`
    /// when no cascade is running.
    ///
    /// A cascade started by the lock that ended the game keeps running in
    /// [`Phase::GameOver`].
    #[must_use]
    pub fn next_resolve_deadline(&self) -> Option<Duration> {
        self.resolution.remaining()
    }

    /// Dispatches `command` to the matching method.
    ///
    /// # Errors
    ///
    /// Returns the error of the dispatched command.
    pub fn handle(&mut self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::MoveLeft => self.move_left(),
            Command::MoveRight => self.move_right(),
            Command::SoftDrop => self.soft_drop(),
            Command::HardDrop => self.hard_drop(),
            Command::RotateCw => self.rotate_cw(),
            Command::RotateCcw => self.rotate_ccw(),
            Command::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    /// Moves the piece one column left.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Blocked`] if any cell would leave the grid or
    /// hit a settled cell, and [`CommandError::Inactive`] outside
    /// [`Phase::Falling`]. The session is unchanged on error.
    pub fn move_left(&mut self) -> Result<(), CommandError> {
        self.try_move(Direction::Left)
    }

    /// Moves the piece one column right. Errors as [`Self::move_left`].
    pub fn move_right(&mut self) -> Result<(), CommandError> {
        self.try_move(Direction::Right)
    }

    /// Moves the piece one row down without locking it. Errors as
    /// [`Self::move_left`].
    pub fn soft_drop(&mut self) -> Result<(), CommandError> {
        self.try_move(Direction::Down)
    }

    /// Moves the piece to the lowest reachable position.
    ///
    /// The piece is not locked; the next tick does that.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Blocked`] if the piece cannot descend at all,
    /// and [`CommandError::Inactive`] outside [`Phase::Falling`].
    pub fn hard_drop(&mut self) -> Result<(), CommandError> {
        self.ensure_falling()?;
        let dropped = self.active.drop_position(&self.grid);
        if dropped == self.active {
            return Err(CommandError::Blocked);
        }
        self.active = dropped;
        Ok(())
    }

    /// Rotates the piece clockwise about its pivot. Errors as
    /// [`Self::move_left`].
    pub fn rotate_cw(&mut self) -> Result<(), CommandError> {
        self.try_rotate(Rotation::Clockwise)
    }

    /// Rotates the piece counter-clockwise about its pivot. Errors as
    /// [`Self::move_left`].
    pub fn rotate_ccw(&mut self) -> Result<(), CommandError> {
        self.try_rotate(Rotation::CounterClockwise)
    }

    /// Starts over with an empty grid and a fresh piece.
    ///
    /// Accepted in every phase. Any running cascade is dropped and the
    /// statistics are zeroed.
    pub fn reset(&mut self) {
        self.grid = Grid::EMPTY;
        self.phase = Phase::Falling;
        self.resolution = Resolution::IDLE;
        self.fall_elapsed = Duration::ZERO;
        self.stats = SessionStats::new();
        self.events.push(SessionEvent::Reset);
        let next = self.source.next_piece();
        self.spawn(next);
    }

    /// Delivers one descent tick.
    ///
    /// Moves the piece down one row, or locks it if it cannot descend.
    /// Ignored outside [`Phase::Falling`].
    pub fn tick(&mut self) -> TickOutcome {
        if !self.phase.is_falling() {
            return TickOutcome::Ignored;
        }
        self.fall_elapsed = Duration::ZERO;
        if let Some(piece) = self.active.moved(Direction::Down, &self.grid) {
            self.active = piece;
            return TickOutcome::Descended;
        }
        self.lock_active_piece();
        TickOutcome::Locked
    }

    /// Lets `elapsed` time pass.
    ///
    /// Fires every resolution step that falls due, in order, and with
    /// [`SessionTiming::auto_descent`] also delivers a tick every
    /// `fall_interval` while falling.
    pub fn advance(&mut self, elapsed: Duration) {
        let mut budget = elapsed;
        loop {
            if let Some(due) = self.resolution.remaining() {
                if budget < due {
                    self.resolution.wait(budget);
                    return;
                }
                budget -= due;
                self.step_resolution();
                continue;
            }
            match self.phase {
                Phase::Falling
                    if self.timing.auto_descent && !self.timing.fall_interval.is_zero() =>
                {
                    let due = self.timing.fall_interval.saturating_sub(self.fall_elapsed);
                    if budget < due {
                        self.fall_elapsed += budget;
                        return;
                    }
                    budget -= due;
                    self.tick();
                }
                Phase::Falling | Phase::Resolving | Phase::GameOver => return,
            }
        }
    }

    /// Fires the pending resolution step now, ignoring its delay.
    ///
    /// Returns `false` if no cascade is running.
    pub fn step_resolution(&mut self) -> bool {
        let Some((grid, step)) = self.resolution.fire(&self.grid, &self.timing) else {
            return false;
        };
        self.grid = grid;
        match step {
            ResolveStep::Cleared { chain, groups } => {
                self.stats.record_clear(&groups);
                self.events.push(SessionEvent::Cleared {
                    chain,
                    groups: groups.len(),
                    cells: groups.iter().map(Group::len).sum(),
                });
            }
            ResolveStep::Settled { chain } => {
                self.events.push(SessionEvent::Settled { chain });
            }
            ResolveStep::Finished { chain } => {
                self.stats.finish_chain(chain);
                self.events.push(SessionEvent::ChainFinished { chain });
                if self.phase.is_resolving() {
                    self.phase = Phase::Falling;
                    self.fall_elapsed = Duration::ZERO;
                }
            }
        }
        true
    }

    /// Runs the current cascade to completion without waiting.
    pub fn finish_resolution(&mut self) {
        while self.step_resolution() {}
    }

    fn ensure_falling(&self) -> Result<(), CommandError> {
        if self.phase.is_falling() {
            Ok(())
        } else {
            Err(CommandError::Inactive { phase: self.phase })
        }
    }

    fn try_move(&mut self, direction: Direction) -> Result<(), CommandError> {
        self.ensure_falling()?;
        self.active = self
            .active
            .moved(direction, &self.grid)
            .ok_or(CommandError::Blocked)?;
        Ok(())
    }

    fn try_rotate(&mut self, rotation: Rotation) -> Result<(), CommandError> {
        self.ensure_falling()?;
        self.active = self
            .active
            .rotated_on(rotation, &self.grid)
            .ok_or(CommandError::Blocked)?;
        Ok(())
    }

    fn lock_active_piece(&mut self) {
        let written = self
            .active
            .cells()
            .iter()
            .filter(|cell| cell.position().is_some())
            .count();
        self.grid = self.grid.with_piece(&self.active).apply_gravity();
        self.stats.complete_piece_drop();
        self.events.push(SessionEvent::Locked { cells: written });
        self.phase = Phase::Resolving;
        self.resolution = Resolution::after_lock(&self.timing);

        // The spawn is checked against the grid as locked, before any clear.
        // The cascade still runs to completion after a game over.
        let next = self.source.next_piece();
        if next.is_blocked_at_spawn(&self.grid) {
            self.phase = Phase::GameOver;
            self.events.push(SessionEvent::GameOver);
            return;
        }
        self.spawn(next);
    }

    fn spawn(&mut self, piece: ActivePiece) {
        self.events.push(SessionEvent::Spawned {
            shape: piece.shape(),
        });
        self.active = piece;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use crate::Color;

    use super::*;

    /// Yields pairs with the given (pivot, upper) colors, then red/green
    /// pairs forever.
    struct Pairs(VecDeque<(Color, Color)>);

    impl Pairs {
        fn new<I>(colors: I) -> Self
        where
            I: IntoIterator<Item = (Color, Color)>,
        {
            Self(colors.into_iter().collect())
        }
    }

    impl PieceSource for Pairs {
        fn next_piece(&mut self) -> ActivePiece {
            let (pivot, upper) = self.0.pop_front().unwrap_or((Color::Red, Color::Green));
            ActivePiece::with_colors(ShapeKind::Pair, [pivot, upper])
        }
    }

    fn session<I>(colors: I) -> GameSession<Pairs>
    where
        I: IntoIterator<Item = (Color, Color)>,
    {
        GameSession::with_source(Pairs::new(colors), SessionTiming::default())
    }

    fn drop_and_lock<S: PieceSource>(session: &mut GameSession<S>) {
        session.hard_drop().unwrap();
        assert!(session.tick().is_locked());
    }

    #[test]
    fn test_new_session_is_falling_on_empty_grid() {
        let mut session = session([]);
        assert!(session.phase().is_falling());
        assert!(session.board().is_vacant());
        assert_eq!(session.active_piece().pivot().row, 0);
        assert_eq!(
            session.drain_events().collect::<Vec<_>>(),
            [SessionEvent::Spawned {
                shape: ShapeKind::Pair
            }]
        );
        assert_eq!(session.drain_events().count(), 0);
    }

    #[test]
    fn test_tick_descends_then_locks() {
        let mut session = session([]);
        for row in 1..12 {
            assert!(session.tick().is_descended());
            assert_eq!(session.active_piece().pivot().row, row);
        }
        assert!(session.tick().is_locked());
        assert!(session.phase().is_resolving());
        assert_eq!(session.board().occupied_count(), 2);
        assert_eq!(session.stats().completed_pieces(), 1);
    }

    #[test]
    fn test_commands_rejected_while_resolving() {
        let mut session = session([]);
        drop_and_lock(&mut session);
        let before = session.snapshot();

        let inactive = Err(CommandError::Inactive {
            phase: Phase::Resolving,
        });
        assert_eq!(session.move_left(), inactive);
        assert_eq!(session.move_right(), inactive);
        assert_eq!(session.soft_drop(), inactive);
        assert_eq!(session.hard_drop(), inactive);
        assert_eq!(session.rotate_cw(), inactive);
        assert_eq!(session.rotate_ccw(), inactive);
        assert!(session.tick().is_ignored());
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_hard_drop_does_not_lock() {
        let mut session = session([]);
        session.hard_drop().unwrap();
        assert!(session.phase().is_falling());
        assert_eq!(session.active_piece().pivot().row, 11);
        assert_eq!(session.hard_drop(), Err(CommandError::Blocked));
    }

    #[test]
    fn test_advance_waits_for_each_delay() {
        let mut session = session([]);
        drop_and_lock(&mut session);
        let timing = session.timing().clone();
        assert_eq!(session.next_resolve_deadline(), Some(timing.lock_delay));

        session.advance(timing.lock_delay / 2);
        assert!(session.phase().is_resolving());
        assert_eq!(session.next_resolve_deadline(), Some(timing.lock_delay / 2));

        session.advance(timing.lock_delay / 2);
        assert!(session.phase().is_falling());
        assert_eq!(session.next_resolve_deadline(), None);
    }

    #[test]
    fn test_cascade_fires_in_order_with_delays() {
        use Color::{Green as G, Red as R};
        // Two vertical red pairs side by side form a group of four.
        let mut session = session([(R, R), (R, R)]);
        drop_and_lock(&mut session);
        session.finish_resolution();
        session.move_left().unwrap();
        drop_and_lock(&mut session);
        session.drain_events().for_each(drop);

        let timing = session.timing().clone();
        session.advance(timing.lock_delay);
        assert!(session.resolve_state().is_clearing());
        assert!(session.board().is_vacant());

        session.advance(timing.clear_delay);
        assert!(session.resolve_state().is_settling());
        session.advance(timing.cascade_delay);
        assert!(session.phase().is_falling());

        let events: Vec<_> = session.drain_events().collect();
        assert_eq!(
            events,
            [
                SessionEvent::Cleared {
                    chain: 1,
                    groups: 1,
                    cells: 4
                },
                SessionEvent::Settled { chain: 1 },
                SessionEvent::ChainFinished { chain: 1 },
            ]
        );
        assert_eq!(session.stats().cleared_cells(), 4);
        assert_eq!(session.stats().max_chain(), 1);
        assert_eq!(
            session.active_piece().cells()[1].color,
            G,
            "default pair follows the scripted ones"
        );
    }

    #[test]
    fn test_advance_with_auto_descent() {
        let timing = SessionTiming {
            auto_descent: true,
            ..SessionTiming::instant()
        };
        let mut session = GameSession::with_source(Pairs::new([]), timing.clone());
        session.advance(timing.fall_interval * 3);
        assert_eq!(session.active_piece().pivot().row, 3);

        session.advance(timing.fall_interval / 2);
        assert_eq!(session.active_piece().pivot().row, 3);
        session.advance(timing.fall_interval / 2);
        assert_eq!(session.active_piece().pivot().row, 4);
    }

    #[test]
    fn test_advance_without_auto_descent_never_ticks() {
        let mut session = session([]);
        session.advance(Duration::from_secs(60));
        assert_eq!(session.active_piece().pivot().row, 0);
    }

    #[test]
    fn test_game_over_keeps_previous_piece() {
        let mut session = session([]);
        // Stack pairs in the spawn column until the spawn cell is taken.
        while !session.phase().is_game_over() {
            drop_and_lock(&mut session);
            session.finish_resolution();
        }
        let last = session.active_piece().clone();
        assert_eq!(session.snapshot().active, None);
        assert!(session.next_resolve_deadline().is_none());
        assert_eq!(
            session.move_left(),
            Err(CommandError::Inactive {
                phase: Phase::GameOver
            })
        );
        assert_eq!(session.active_piece(), &last);
        assert!(
            session
                .drain_events()
                .any(|event| event == SessionEvent::GameOver)
        );
    }

    #[test]
    fn test_reset_from_any_phase() {
        let mut session = session([]);
        drop_and_lock(&mut session);
        assert!(session.phase().is_resolving());

        session.handle(Command::Reset).unwrap();
        assert!(session.phase().is_falling());
        assert!(session.board().is_vacant());
        assert!(session.resolve_state().is_idle());
        assert_eq!(session.stats(), &SessionStats::new());
        assert_eq!(session.active_piece().pivot().row, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let session = GameSession::with_seed(PieceSeed::from_bytes([3; 16]));
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["phase"], "Falling");
        assert_eq!(json["grid"].as_array().unwrap().len(), 12);
        assert!(json["active"].is_object());
    }
}
