//! Game engine logic and state management.
//!
//! This module builds the playable game on top of the core data structures:
//!
//! - [`GameSession`] - Phase controller owning the grid, falling piece and cascade
//! - [`Resolution`] - Clear → gravity → re-scan cycle as a timed state machine
//! - [`SessionStats`] - Counters for pieces, clears and chains
//! - [`SessionTiming`] - Tunable delays, loadable from JSON
//! - [`PieceGenerator`] - Seeded random piece source
//! - [`PieceSeed`] - Seed for deterministic piece generation
//!
//! # Game Flow
//!
//! 1. A piece spawns with its pivot at row 0 of the middle column
//! 2. Descent ticks and player commands move it while the session is
//!    [`Phase::Falling`]
//! 3. A tick that cannot move the piece down locks it and enters
//!    [`Phase::Resolving`]; the next piece is spawned at the same time
//! 4. Groups of four or more are cleared, the grid settles, and the scan
//!    repeats until nothing clears
//! 5. Falling resumes; a blocked spawn ends the game
//!
//! # Example
//!
//! ```
//! use puyo_engine::{GameSession, PieceSeed};
//!
//! let mut session = GameSession::with_seed(PieceSeed::from_bytes([0; 16]));
//!
//! // Input is rejected rather than applied when illegal
//! while session.move_left().is_ok() {}
//! session.hard_drop().ok();
//! session.tick();
//!
//! // Let the cascade play out at its own pace
//! while let Some(deadline) = session.next_resolve_deadline() {
//!     session.advance(deadline);
//! }
//!
//! for event in session.drain_events() {
//!     println!("{event:?}");
//! }
//! ```

pub use self::{game_session::*, game_stats::*, piece_generator::*, resolution::*, timing::*};

mod game_session;
mod game_stats;
mod piece_generator;
mod resolution;
mod timing;
