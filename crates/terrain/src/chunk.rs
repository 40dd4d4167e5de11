use std::collections::HashSet;

use glam::{IVec3, Vec3};
use minegame_common::{BlockCategory, ChunkCoord, WorldSeed, block_center};

use crate::height::TerrainModel;

/// A batched draw description: one shared geometry per category, instanced at many
/// translations. No per-block draw objects.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceBatch {
    pub category: BlockCategory,
    /// Per-instance translation (block centre in world space).
    pub translations: Vec<Vec3>,
}

impl InstanceBatch {
    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

/// Blocks generated for one chunk's column range, grouped by category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkBlocks {
    by_category: [Vec<IVec3>; 5],
}

impl ChunkBlocks {
    fn new() -> Self {
        Self {
            by_category: Default::default(),
        }
    }

    fn push(&mut self, category: BlockCategory, pos: IVec3) {
        self.by_category[category.index()].push(pos);
    }

    /// Blocks of one category in generation order.
    pub fn of(&self, category: BlockCategory) -> &[IVec3] {
        &self.by_category[category.index()]
    }

    /// Total number of generated blocks, counting overlaps once per category list.
    pub fn len(&self) -> usize {
        self.by_category.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// De-duplicated union of all categories, in generation order.
    pub fn solid_positions(&self) -> Vec<IVec3> {
        let mut seen = HashSet::with_capacity(self.len());
        BlockCategory::ALL
            .iter()
            .flat_map(|c| self.of(*c).iter().copied())
            .filter(|p| seen.insert(*p))
            .collect()
    }
}

/// A generated chunk: its blocks and one instance batch per non-empty category.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub blocks: ChunkBlocks,
    pub batches: Vec<InstanceBatch>,
}

impl Chunk {
    pub fn batch(&self, category: BlockCategory) -> Option<&InstanceBatch> {
        self.batches.iter().find(|b| b.category == category)
    }
}

/// Turns a chunk coordinate into blocks and instance batches.
///
/// Building is a pure function of `(coord, seed)`: no hidden randomness beyond the
/// noise field, so rebuilding an evicted chunk reproduces it exactly.
#[derive(Debug, Clone, Copy)]
pub struct ChunkBuilder {
    terrain: TerrainModel,
}

impl ChunkBuilder {
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            terrain: TerrainModel::new(seed),
        }
    }

    pub fn terrain(&self) -> &TerrainModel {
        &self.terrain
    }

    /// Generate the blocks for every column in the chunk.
    pub fn build_blocks(&self, coord: ChunkCoord) -> ChunkBlocks {
        let mut blocks = ChunkBlocks::new();
        for column in coord.columns() {
            let h = self.terrain.height(column.x, column.z);
            for y in 0..h {
                if let Some(category) = TerrainModel::category_at(y, h) {
                    blocks.push(category, IVec3::new(column.x, y, column.z));
                }
            }
            if let Some(tree) = self.terrain.tree_at(column.x, column.z, h) {
                for pos in tree.trunk() {
                    blocks.push(BlockCategory::Trunk, pos);
                }
                for pos in tree.foliage() {
                    blocks.push(BlockCategory::Foliage, pos);
                }
            }
        }
        blocks
    }

    /// Generate blocks and derive one instance batch per non-empty category.
    pub fn build(&self, coord: ChunkCoord) -> Chunk {
        let _span = tracing::debug_span!("build_chunk", x = coord.x, z = coord.z).entered();
        let blocks = self.build_blocks(coord);
        let batches = BlockCategory::ALL
            .iter()
            .filter(|c| !blocks.of(**c).is_empty())
            .map(|c| InstanceBatch {
                category: *c,
                translations: blocks.of(*c).iter().map(|p| block_center(*p)).collect(),
            })
            .collect();
        Chunk {
            coord,
            blocks,
            batches,
        }
    }
}
