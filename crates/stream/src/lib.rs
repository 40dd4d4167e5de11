//! Streaming: chunk residency around the viewer and the block occupancy index.
//!
//! # Invariants
//! - At most one resident chunk per chunk coordinate.
//! - The occupancy index always equals the union of the blocks of the resident chunks.
//! - Loads and unloads run synchronously inside the caller's tick.

mod controller;
mod grid;
mod occupancy;

pub use controller::{
    ChunkSink, ChunkState, MAX_RENDER_DISTANCE, NullSink, StreamConfig, StreamState, StreamStats,
    StreamUpdate,
};
pub use grid::{chunk_count_for_radius, chunks_in_radius};
pub use occupancy::OccupancyIndex;

use minegame_common::ChunkCoord;

/// Errors from streaming and occupancy bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("chunk {0} is already registered in the occupancy index")]
    AlreadyRegistered(ChunkCoord),
    #[error("render distance {value} is outside 0..={max}")]
    InvalidRenderDistance { value: i32, max: i32 },
}

pub fn crate_info() -> &'static str {
    "minegame-stream v0.1.0"
}
