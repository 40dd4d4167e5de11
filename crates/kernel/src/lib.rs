//! Kernel: the player controller and the session tick that drives streaming.
//!
//! # Invariants
//! - Within a tick the player moves before chunks stream.
//! - Collision reads the occupancy index and never mutates it.
//! - Unknown positions are empty space, not errors.

pub mod player;
pub mod session;

pub use player::{
    HorizontalMove, MoveInput, PlayerConfig, PlayerController, SolidQuery, StepReport, ViewerState,
};
pub use session::{Session, SessionConfig, TickReport};

use minegame_stream::StreamError;

/// Errors raised while starting or ticking a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("streaming failed: {0}")]
    Stream(#[from] StreamError),
    #[error("invalid player config: {field} {reason}")]
    InvalidPlayerConfig {
        field: &'static str,
        reason: &'static str,
    },
}
