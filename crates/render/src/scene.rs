use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use minegame_common::ChunkCoord;
use minegame_stream::ChunkSink;
use minegame_terrain::Chunk;

use crate::material::{Material, MaterialLibrary};

/// Instances of one material inside a chunk node.
#[derive(Debug, Clone)]
pub struct SceneBatch {
    pub material: Arc<Material>,
    pub translations: Vec<Vec3>,
}

/// Render-side group for one resident chunk.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub coord: ChunkCoord,
    pub batches: Vec<SceneBatch>,
}

impl SceneNode {
    pub fn instance_count(&self) -> usize {
        self.batches.iter().map(|b| b.translations.len()).sum()
    }
}

/// A node change that GPU back ends have not seen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Attached(ChunkCoord),
    Detached(ChunkCoord),
}

/// The scene graph: one node per resident chunk.
#[derive(Debug, Default)]
pub struct Scene {
    materials: MaterialLibrary,
    nodes: HashMap<ChunkCoord, SceneNode>,
    changes: Vec<SceneChange>,
}

impl Scene {
    pub fn new(materials: MaterialLibrary) -> Self {
        Self {
            materials,
            nodes: HashMap::new(),
            changes: Vec::new(),
        }
    }

    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    pub fn node(&self, coord: ChunkCoord) -> Option<&SceneNode> {
        self.nodes.get(&coord)
    }

    /// Nodes sorted by chunk coordinate.
    pub fn nodes_sorted(&self) -> Vec<&SceneNode> {
        let mut nodes: Vec<&SceneNode> = self.nodes.values().collect();
        nodes.sort_by_key(|n| n.coord);
        nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn instance_count(&self) -> usize {
        self.nodes.values().map(SceneNode::instance_count).sum()
    }

    /// Take the changes queued since the last call, in order.
    pub fn drain_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }
}

impl ChunkSink for Scene {
    fn attach(&mut self, chunk: &Chunk) {
        let batches = chunk
            .batches
            .iter()
            .filter(|b| !b.is_empty())
            .map(|b| SceneBatch {
                material: Arc::clone(self.materials.get(b.category)),
                translations: b.translations.clone(),
            })
            .collect();
        let node = SceneNode {
            coord: chunk.coord,
            batches,
        };
        if self.nodes.insert(chunk.coord, node).is_some() {
            tracing::warn!(chunk = %chunk.coord, "replaced an attached scene node");
        }
        self.changes.push(SceneChange::Attached(chunk.coord));
    }

    fn detach(&mut self, coord: ChunkCoord) {
        if self.nodes.remove(&coord).is_some() {
            self.changes.push(SceneChange::Detached(coord));
        }
    }
}
