//! Developer Tooling: session inspector, HUD status line, frame timing.
//!
//! # Invariants
//! - Tools only read session state.

pub mod inspector;
pub mod profiling;

pub use inspector::{ChunkInfo, SessionInspector, SessionSummary};
pub use profiling::FrameTimer;
