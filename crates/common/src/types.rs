use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Number of columns along each horizontal edge of a chunk.
pub const CHUNK_SIZE: i32 = 16;

/// Deterministic input to every noise evaluation. Immutable for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldSeed(pub i64);

impl WorldSeed {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(1337)
    }
}

impl std::fmt::Display for WorldSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single vertical stack of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnCoord {
    pub x: i32,
    pub z: i32,
}

impl ColumnCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk whose column range contains this column.
    pub fn chunk(self) -> ChunkCoord {
        ChunkCoord::new(self.x.div_euclid(CHUNK_SIZE), self.z.div_euclid(CHUNK_SIZE))
    }
}

/// A chunk coordinate in the world grid (ignoring Y, chunks span the full height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Convert a continuous world position to the chunk containing it.
    pub fn from_position(pos: Vec3) -> Self {
        let size = CHUNK_SIZE as f32;
        Self {
            x: (pos.x / size).floor() as i32,
            z: (pos.z / size).floor() as i32,
        }
    }

    /// First column (smallest x and z) covered by this chunk.
    pub fn origin_column(self) -> ColumnCoord {
        ColumnCoord::new(self.x * CHUNK_SIZE, self.z * CHUNK_SIZE)
    }

    /// Whether a column lies inside this chunk's column range.
    pub fn contains_column(self, column: ColumnCoord) -> bool {
        column.chunk() == self
    }

    /// Chebyshev (square) distance in chunks.
    pub fn chebyshev_distance(self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// All columns in this chunk, x-major then z.
    pub fn columns(self) -> impl Iterator<Item = ColumnCoord> {
        let origin = self.origin_column();
        (origin.x..origin.x + CHUNK_SIZE).flat_map(move |x| {
            (origin.z..origin.z + CHUNK_SIZE).map(move |z| ColumnCoord::new(x, z))
        })
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.x, self.z)
    }
}

/// Category of a generated block. Decided entirely by terrain rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockCategory {
    Ground,
    Soil,
    Rock,
    Trunk,
    Foliage,
}

impl BlockCategory {
    pub const ALL: [BlockCategory; 5] = [
        BlockCategory::Ground,
        BlockCategory::Soil,
        BlockCategory::Rock,
        BlockCategory::Trunk,
        BlockCategory::Foliage,
    ];

    /// Stable index into per-category arrays.
    pub fn index(self) -> usize {
        match self {
            BlockCategory::Ground => 0,
            BlockCategory::Soil => 1,
            BlockCategory::Rock => 2,
            BlockCategory::Trunk => 3,
            BlockCategory::Foliage => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockCategory::Ground => "ground",
            BlockCategory::Soil => "soil",
            BlockCategory::Rock => "rock",
            BlockCategory::Trunk => "trunk",
            BlockCategory::Foliage => "foliage",
        }
    }

    /// Extent of the shared base geometry for this category. Trunks are slightly thinner.
    pub fn geometry_extent(self) -> Vec3 {
        match self {
            BlockCategory::Trunk => Vec3::new(0.9, 1.0, 0.9),
            _ => Vec3::ONE,
        }
    }
}

/// Unit look vector for a yaw and pitch in radians. Yaw 0 looks along +Z.
pub fn look_direction(yaw: f32, pitch: f32) -> Vec3 {
    Vec3::new(yaw.sin() * pitch.cos(), pitch.sin(), yaw.cos() * pitch.cos())
}

/// Centre of the unit cube occupying the integer block position.
pub fn block_center(pos: IVec3) -> Vec3 {
    pos.as_vec3() + Vec3::splat(0.5)
}
