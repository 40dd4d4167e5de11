//! Terrain generation: seeded value noise, per-column heights and layering,
//! tree placement, and chunk building.
//!
//! # Invariants
//! - Every output is a pure function of the world seed and the input coordinate.
//! - Rebuilding a chunk reproduces identical block lists and batch membership.

pub mod chunk;
pub mod height;
pub mod noise;

pub use chunk::{Chunk, ChunkBlocks, ChunkBuilder, InstanceBatch};
pub use height::{MIN_TREE_COLUMN_HEIGHT, TerrainModel, TreeSpec};
pub use noise::NoiseField;
