use std::collections::HashMap;

use glam::IVec3;
use minegame_common::ChunkCoord;

use crate::StreamError;

/// Sparse set of every solid block position across all resident chunks.
///
/// Each chunk's contribution is recorded so it can be reversed exactly on unload.
/// Positions are counted per contributing chunk: foliage overhanging a neighbour's
/// columns stays solid until every chunk that produced it has been unregistered.
#[derive(Debug, Default)]
pub struct OccupancyIndex {
    solid: HashMap<IVec3, u32>,
    members: HashMap<ChunkCoord, Vec<IVec3>>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union the chunk's blocks into the solid set and remember its membership.
    ///
    /// Duplicate positions within `blocks` are counted once.
    pub fn register(
        &mut self,
        chunk: ChunkCoord,
        blocks: impl IntoIterator<Item = IVec3>,
    ) -> Result<(), StreamError> {
        if self.members.contains_key(&chunk) {
            return Err(StreamError::AlreadyRegistered(chunk));
        }
        let mut membership: Vec<IVec3> = blocks.into_iter().collect();
        membership.sort_unstable_by_key(|p| (p.x, p.y, p.z));
        membership.dedup();
        for pos in &membership {
            *self.solid.entry(*pos).or_insert(0) += 1;
        }
        self.members.insert(chunk, membership);
        Ok(())
    }

    /// Remove exactly what the chunk contributed and forget its record.
    ///
    /// Returns how many positions stopped being solid. Unknown chunks are a no-op.
    pub fn unregister(&mut self, chunk: ChunkCoord) -> usize {
        let Some(membership) = self.members.remove(&chunk) else {
            return 0;
        };
        let mut cleared = 0;
        for pos in membership {
            if let Some(count) = self.solid.get_mut(&pos) {
                *count -= 1;
                if *count == 0 {
                    self.solid.remove(&pos);
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Whether a block position is solid. Never-generated positions are not solid.
    pub fn is_solid(&self, pos: IVec3) -> bool {
        self.solid.contains_key(&pos)
    }

    pub fn is_solid_at(&self, x: i32, y: i32, z: i32) -> bool {
        self.is_solid(IVec3::new(x, y, z))
    }

    pub fn is_registered(&self, chunk: ChunkCoord) -> bool {
        self.members.contains_key(&chunk)
    }

    /// Positions recorded for a chunk, sorted.
    pub fn membership(&self, chunk: ChunkCoord) -> Option<&[IVec3]> {
        self.members.get(&chunk).map(Vec::as_slice)
    }

    /// Number of distinct solid positions.
    pub fn len(&self) -> usize {
        self.solid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solid.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.members.len()
    }

    pub fn positions(&self) -> impl Iterator<Item = IVec3> + '_ {
        self.solid.keys().copied()
    }

    pub fn clear(&mut self) {
        self.solid.clear();
        self.members.clear();
    }
}
