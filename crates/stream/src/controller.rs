use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use glam::Vec3;
use minegame_common::{ChunkCoord, WorldSeed};
use minegame_terrain::{Chunk, ChunkBuilder};
use serde::{Deserialize, Serialize};

use crate::StreamError;
use crate::grid::chunks_in_radius;
use crate::occupancy::OccupancyIndex;

/// Largest accepted render distance, in chunks.
pub const MAX_RENDER_DISTANCE: i32 = 32;

/// Streaming configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Square radius (in chunks) around the viewer's chunk that must be resident.
    pub render_distance: i32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { render_distance: 4 }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), StreamError> {
        if !(0..=MAX_RENDER_DISTANCE).contains(&self.render_distance) {
            return Err(StreamError::InvalidRenderDistance {
                value: self.render_distance,
                max: MAX_RENDER_DISTANCE,
            });
        }
        Ok(())
    }
}

/// Lifecycle of a chunk coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Unloaded,
    Resident,
}

/// Receives chunk geometry as chunks become resident and releases it when they leave.
pub trait ChunkSink {
    fn attach(&mut self, chunk: &Chunk);
    fn detach(&mut self, coord: ChunkCoord);
}

/// Sink that discards geometry, for headless sessions and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChunkSink for NullSink {
    fn attach(&mut self, _chunk: &Chunk) {}
    fn detach(&mut self, _coord: ChunkCoord) {}
}

/// Chunks that changed state during one streaming pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamUpdate {
    pub center: Option<ChunkCoord>,
    pub loaded: Vec<ChunkCoord>,
    pub unloaded: Vec<ChunkCoord>,
}

/// Statistics from the last streaming pass, for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub chunks_loaded_this_update: usize,
    pub chunks_unloaded_this_update: usize,
    pub resident_chunks: usize,
    pub solid_blocks: usize,
    pub update_time: Duration,
}

/// Owns the resident chunks and the occupancy index, and moves chunks between
/// `Unloaded` and `Resident` as the viewer crosses chunk boundaries.
pub struct StreamState {
    config: StreamConfig,
    builder: ChunkBuilder,
    resident: HashMap<ChunkCoord, Chunk>,
    occupancy: OccupancyIndex,
    center: Option<ChunkCoord>,
    stats: StreamStats,
}

impl StreamState {
    pub fn new(config: StreamConfig, seed: WorldSeed) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self {
            config,
            builder: ChunkBuilder::new(seed),
            resident: HashMap::new(),
            occupancy: OccupancyIndex::new(),
            center: None,
            stats: StreamStats::default(),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn builder(&self) -> &ChunkBuilder {
        &self.builder
    }

    pub fn seed(&self) -> WorldSeed {
        self.builder.terrain().noise().seed()
    }

    /// Stream around the viewer position. Returns `None` without doing any work when
    /// the viewer is still in the chunk handled by the previous pass.
    pub fn update(
        &mut self,
        viewer_pos: Vec3,
        sink: &mut dyn ChunkSink,
    ) -> Result<Option<StreamUpdate>, StreamError> {
        let viewer_chunk = ChunkCoord::from_position(viewer_pos);
        if self.center == Some(viewer_chunk) {
            return Ok(None);
        }
        self.stream_around(viewer_chunk, sink).map(Some)
    }

    /// Stream around the viewer position even if its chunk has not changed.
    pub fn force_update(
        &mut self,
        viewer_pos: Vec3,
        sink: &mut dyn ChunkSink,
    ) -> Result<StreamUpdate, StreamError> {
        self.stream_around(ChunkCoord::from_position(viewer_pos), sink)
    }

    fn stream_around(
        &mut self,
        viewer_chunk: ChunkCoord,
        sink: &mut dyn ChunkSink,
    ) -> Result<StreamUpdate, StreamError> {
        let _span = tracing::info_span!("stream_update", x = viewer_chunk.x, z = viewer_chunk.z)
            .entered();
        let start = Instant::now();
        self.center = Some(viewer_chunk);

        let desired = chunks_in_radius(viewer_chunk, self.config.render_distance);

        // Nearest first; ties broken by coordinate so passes are reproducible.
        let mut to_load: Vec<ChunkCoord> = desired
            .iter()
            .filter(|c| !self.resident.contains_key(c))
            .copied()
            .collect();
        to_load.sort_by_key(|c| (c.chebyshev_distance(viewer_chunk), *c));

        let mut to_unload: Vec<ChunkCoord> = self
            .resident
            .keys()
            .filter(|c| !desired.contains(c))
            .copied()
            .collect();
        to_unload.sort();

        for coord in &to_load {
            self.load(*coord, sink)?;
        }
        for coord in &to_unload {
            self.unload(*coord, sink);
        }

        self.stats = StreamStats {
            chunks_loaded_this_update: to_load.len(),
            chunks_unloaded_this_update: to_unload.len(),
            resident_chunks: self.resident.len(),
            solid_blocks: self.occupancy.len(),
            update_time: start.elapsed(),
        };

        tracing::trace!(
            loaded = to_load.len(),
            unloaded = to_unload.len(),
            total = self.resident.len(),
            "stream update complete"
        );

        Ok(StreamUpdate {
            center: Some(viewer_chunk),
            loaded: to_load,
            unloaded: to_unload,
        })
    }

    /// Unloaded -> Resident: build, register, attach. Returns `false` if already resident.
    pub fn load(&mut self, coord: ChunkCoord, sink: &mut dyn ChunkSink) -> Result<bool, StreamError> {
        if self.resident.contains_key(&coord) {
            return Ok(false);
        }
        tracing::debug!(?coord, "loading chunk");
        let chunk = self.builder.build(coord);
        self.occupancy
            .register(coord, chunk.blocks.solid_positions())?;
        sink.attach(&chunk);
        self.resident.insert(coord, chunk);
        Ok(true)
    }

    /// Resident -> Unloaded: detach, unregister. Returns `false` if it was not resident.
    pub fn unload(&mut self, coord: ChunkCoord, sink: &mut dyn ChunkSink) -> bool {
        if self.resident.remove(&coord).is_none() {
            return false;
        }
        tracing::debug!(?coord, "unloading chunk");
        sink.detach(coord);
        self.occupancy.unregister(coord);
        true
    }

    /// Unload every resident chunk and forget the last streamed centre, so the next
    /// `update` always does a full pass.
    pub fn clear(&mut self, sink: &mut dyn ChunkSink) -> usize {
        let mut coords: Vec<ChunkCoord> = self.resident.keys().copied().collect();
        coords.sort();
        for coord in &coords {
            self.unload(*coord, sink);
        }
        self.center = None;
        self.stats = StreamStats::default();
        coords.len()
    }

    pub fn state(&self, coord: ChunkCoord) -> ChunkState {
        if self.resident.contains_key(&coord) {
            ChunkState::Resident
        } else {
            ChunkState::Unloaded
        }
    }

    pub fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.resident.contains_key(&coord)
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.resident.get(&coord)
    }

    pub fn resident_coords(&self) -> HashSet<ChunkCoord> {
        self.resident.keys().copied().collect()
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    /// Read-only view of the solid set, for collision.
    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    /// Chunk the last pass streamed around.
    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}
