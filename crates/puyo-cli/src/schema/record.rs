use chrono::{DateTime, Utc};
use puyo_engine::{Phase, PieceSeed, SessionSnapshot, SessionStats, SessionTiming};
use serde::Serialize;

/// Result of a headless simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRecord {
    /// Timestamp when the record was created (ISO 8601 format)
    pub recorded_at: DateTime<Utc>,
    /// Random seed used for piece generation
    pub seed: PieceSeed,
    /// Timing the session ran with
    pub timing: SessionTiming,
    /// Piece limit the run was started with
    pub max_pieces: usize,
    /// Why the run stopped
    pub outcome: SimulationOutcome,
    /// Game time that passed in the session, in milliseconds
    pub simulated_ms: u64,
    /// Final game statistics
    pub final_stats: SessionStats,
    /// Grid, piece and phase when the run stopped
    pub final_snapshot: SessionSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulationOutcome {
    GameOver,
    PieceLimit,
}

impl SimulationOutcome {
    pub fn from_phase(phase: Phase) -> Self {
        if phase.is_game_over() {
            Self::GameOver
        } else {
            Self::PieceLimit
        }
    }
}
