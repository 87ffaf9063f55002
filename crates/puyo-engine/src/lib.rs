pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Rejection of a player command.
///
/// Rejected commands never change the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CommandError {
    #[display("piece is blocked")]
    Blocked,
    #[display("command not accepted while {phase}")]
    Inactive { phase: Phase },
}
