//! Shared types for the voxel world: seed, column/chunk coordinates, block categories,
//! and sanitising of the session start inputs.

pub mod session;
pub mod types;

pub use session::{SessionSettings, sanitize_level_name, sanitize_seed};
pub use types::{BlockCategory, CHUNK_SIZE, ChunkCoord, ColumnCoord, WorldSeed, block_center, look_direction};
