use std::sync::LazyLock;

use glam::IVec3;
use minegame_common::{BlockCategory, WorldSeed};

use crate::noise::NoiseField;

/// Minimum base height added under the blended noise.
pub const BASE_HEIGHT: i32 = 4;
/// Height the blended noise maps its upper bound onto.
pub const MAX_HEIGHT: i32 = 14;
/// Smallest column height that may host a tree.
pub const MIN_TREE_COLUMN_HEIGHT: i32 = 5;
/// The density hash must exceed this for a tree to grow (rare).
pub const TREE_CHANCE_THRESHOLD: f64 = 0.965;
/// Frequency scale of the density hash.
pub const TREE_CLUSTER_SCALE: f64 = 0.35;
/// Edge length, in columns, of a spacing cell.
pub const TREE_SPACING: i32 = 5;
/// A spacing cell may host trees only if its hash exceeds this.
pub const TREE_SPACING_THRESHOLD: f64 = 0.65;

const RIDGE_SCALE: f64 = 0.07;
const RIDGE_WEIGHT: f64 = 0.85;
const RIDGE_OCTAVES: u32 = 5;
const DETAIL_SCALE: f64 = 0.18;
const DETAIL_WEIGHT: f64 = 0.15;
const DETAIL_OCTAVES: u32 = 3;
const DETAIL_OFFSET_X: f64 = 300.0;
const DETAIL_OFFSET_Z: f64 = -130.0;

/// Canopy offsets relative to the canopy centre (the top trunk block).
static CANOPY_TEMPLATE: LazyLock<Vec<IVec3>> = LazyLock::new(|| {
    let mut offsets = Vec::new();
    for lx in -2i32..=2 {
        for ly in 0i32..=2 {
            for lz in -2i32..=2 {
                let spread = lx.abs() + lz.abs();
                if spread + ly > 5 {
                    continue;
                }
                // flattened top layer
                if ly == 2 && spread > 1 {
                    continue;
                }
                // trunk occupies the centre of the lower two layers
                if lx == 0 && lz == 0 && ly <= 1 {
                    continue;
                }
                offsets.push(IVec3::new(lx, ly, lz));
            }
        }
    }
    offsets
});

/// A tree rooted on top of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSpec {
    /// Position of the ground block the trunk stands on.
    pub base: IVec3,
    /// Number of trunk blocks (3 or 4).
    pub trunk_height: i32,
}

impl TreeSpec {
    /// Trunk block positions, bottom to top.
    pub fn trunk(&self) -> impl Iterator<Item = IVec3> + '_ {
        (1..=self.trunk_height).map(move |i| self.base + IVec3::new(0, i, 0))
    }

    /// Canopy centre: the top trunk block.
    pub fn canopy_center(&self) -> IVec3 {
        self.base + IVec3::new(0, self.trunk_height, 0)
    }

    /// Foliage block positions from the fixed canopy template.
    pub fn foliage(&self) -> impl Iterator<Item = IVec3> + '_ {
        let center = self.canopy_center();
        CANOPY_TEMPLATE.iter().map(move |offset| center + *offset)
    }
}

/// Per-column surface heights, layering and vegetation placement.
#[derive(Debug, Clone, Copy)]
pub struct TerrainModel {
    noise: NoiseField,
}

impl TerrainModel {
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            noise: NoiseField::new(seed),
        }
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    /// Number of solid blocks stacked at the column, starting at y = 0.
    pub fn height(&self, x: i32, z: i32) -> i32 {
        let (fx, fz) = (f64::from(x), f64::from(z));
        let ridge = self
            .noise
            .fbm(fx * RIDGE_SCALE, fz * RIDGE_SCALE, RIDGE_OCTAVES);
        let detail = self.noise.fbm(
            (fx + DETAIL_OFFSET_X) * DETAIL_SCALE,
            (fz + DETAIL_OFFSET_Z) * DETAIL_SCALE,
            DETAIL_OCTAVES,
        );
        let terrain = ridge * RIDGE_WEIGHT + detail * DETAIL_WEIGHT;
        let span = f64::from(MAX_HEIGHT - BASE_HEIGHT);
        let h = (f64::from(BASE_HEIGHT) + terrain * span + 1.0).floor() as i32;
        h.max(1)
    }

    /// Category of the block at `y` in a column of height `h`, or `None` above the surface.
    pub fn category_at(y: i32, h: i32) -> Option<BlockCategory> {
        if y < 0 || y >= h {
            None
        } else if y == h - 1 {
            Some(BlockCategory::Ground)
        } else if y >= h - 3 {
            Some(BlockCategory::Soil)
        } else {
            Some(BlockCategory::Rock)
        }
    }

    /// Tree rooted on the column, if both noise gates pass and the column is tall enough.
    pub fn tree_at(&self, x: i32, z: i32, h: i32) -> Option<TreeSpec> {
        if h < MIN_TREE_COLUMN_HEIGHT {
            return None;
        }
        let (fx, fz) = (f64::from(x), f64::from(z));
        let chance = self.noise.hash(
            fx * TREE_CLUSTER_SCALE + 180.0,
            fz * TREE_CLUSTER_SCALE - 230.0,
        );
        if chance <= TREE_CHANCE_THRESHOLD {
            return None;
        }
        let cell_x = f64::from(x.div_euclid(TREE_SPACING));
        let cell_z = f64::from(z.div_euclid(TREE_SPACING));
        let spacing_mask = self.noise.hash(cell_x + 740.0, cell_z - 510.0);
        if spacing_mask <= TREE_SPACING_THRESHOLD {
            return None;
        }
        let trunk_height = 3 + (self.noise.hash(fx + 44.7, fz + 10.3) * 2.0).floor() as i32;
        Some(TreeSpec {
            base: IVec3::new(x, h - 1, z),
            trunk_height,
        })
    }
}
