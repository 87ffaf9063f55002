use std::{path::PathBuf, time::Duration};

use chrono::Utc;
use puyo_engine::{COLS, GameSession, PieceGenerator, PieceSeed, SessionTiming};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::{
    schema::record::{SimulationOutcome, SimulationRecord},
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Seed for piece generation, as 32 hex digits (random if omitted)
    #[arg(long)]
    seed: Option<PieceSeed>,
    /// Stop after this many pieces have been locked
    #[arg(long, default_value_t = 500)]
    max_pieces: usize,
    /// JSON file with timing overrides (see the `timing` command)
    #[arg(long)]
    timing: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Print every session event to stderr
    #[arg(long)]
    verbose: bool,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        seed,
        max_pieces,
        timing,
        output,
        verbose,
    } = arg;

    let timing = match timing {
        Some(path) => util::read_timing_file(path)?,
        None => SessionTiming::default(),
    };
    let seed = seed.unwrap_or_else(|| rand::rng().random());

    eprintln!("Simulating with seed {}", seed.to_hex());
    let record = simulate(seed, timing, *max_pieces, *verbose);

    let stats = &record.final_stats;
    eprintln!(
        "{:?} after {} pieces: {} cells cleared, {} chains, longest chain {}",
        record.outcome,
        stats.completed_pieces(),
        stats.cleared_cells(),
        stats.chains(),
        stats.max_chain(),
    );

    Output::save_json(&record, output.clone())?;
    Ok(())
}

fn simulate(
    seed: PieceSeed,
    timing: SessionTiming,
    max_pieces: usize,
    verbose: bool,
) -> SimulationRecord {
    let mut session = GameSession::with_source(PieceGenerator::with_seed(seed), timing.clone());
    let mut policy_rng = Pcg32::from_rng(&mut Pcg32::from_seed(*seed.as_bytes()));
    let mut simulated = Duration::ZERO;

    while session.phase().is_falling() && session.stats().completed_pieces() < max_pieces {
        place_randomly(&mut session, &mut policy_rng);
        while session.phase().is_falling() {
            session.tick();
            simulated += timing.fall_interval;
        }
        while let Some(deadline) = session.next_resolve_deadline() {
            session.advance(deadline);
            simulated += deadline;
        }
        for event in session.drain_events() {
            if verbose {
                eprintln!("  {event:?}");
            }
        }
    }

    SimulationRecord {
        recorded_at: Utc::now(),
        seed,
        timing,
        max_pieces,
        outcome: SimulationOutcome::from_phase(session.phase()),
        simulated_ms: u64::try_from(simulated.as_millis()).unwrap_or(u64::MAX),
        final_stats: session.stats().clone(),
        final_snapshot: session.snapshot(),
    }
}

/// Rotates the active piece a random number of times, shifts it towards a
/// random column and drops it. Rejected commands simply stop that part of
/// the placement.
fn place_randomly<R>(session: &mut GameSession, rng: &mut R)
where
    R: Rng,
{
    for _ in 0..rng.random_range(0..4) {
        if session.rotate_cw().is_err() {
            break;
        }
    }

    let target = rng.random_range(0..COLS);
    loop {
        let col = session.active_piece().pivot().col;
        let moved = match usize::try_from(col) {
            Ok(col) if col < target => session.move_right(),
            Ok(col) if col > target => session.move_left(),
            _ => break,
        };
        if moved.is_err() {
            break;
        }
    }

    session.hard_drop().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: PieceSeed = PieceSeed::from_bytes([0x42; 16]);

    #[test]
    fn test_simulation_is_deterministic() {
        let a = simulate(SEED, SessionTiming::default(), 50, false);
        let b = simulate(SEED, SessionTiming::default(), 50, false);
        assert_eq!(a.final_stats, b.final_stats);
        assert_eq!(a.final_snapshot, b.final_snapshot);
        assert_eq!(a.simulated_ms, b.simulated_ms);
    }

    #[test]
    fn test_simulation_respects_piece_limit() {
        let record = simulate(SEED, SessionTiming::instant(), 3, false);
        let pieces = record.final_stats.completed_pieces();
        assert!(pieces <= 3);
        if record.outcome == SimulationOutcome::PieceLimit {
            assert_eq!(pieces, 3);
        }
    }

    #[test]
    fn test_zero_pieces_runs_nothing() {
        let record = simulate(SEED, SessionTiming::default(), 0, false);
        assert_eq!(record.outcome, SimulationOutcome::PieceLimit);
        assert_eq!(record.simulated_ms, 0);
        assert!(record.final_snapshot.grid.is_vacant());
    }

    #[test]
    fn test_simulation_runs_until_game_over() {
        let record = simulate(SEED, SessionTiming::instant(), usize::MAX, false);
        assert_eq!(record.outcome, SimulationOutcome::GameOver);
        assert!(record.final_snapshot.active.is_none());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["seed"], SEED.to_hex());
        assert_eq!(json["final_snapshot"]["phase"], "GameOver");
    }
}
