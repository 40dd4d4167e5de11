use std::collections::HashSet;

use minegame_common::ChunkCoord;

/// Compute all chunks within a square (Chebyshev) radius of a centre chunk, inclusive.
pub fn chunks_in_radius(center: ChunkCoord, radius: i32) -> HashSet<ChunkCoord> {
    let mut result = HashSet::new();
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            result.insert(ChunkCoord::new(center.x + dx, center.z + dz));
        }
    }
    result
}

/// Number of chunks resident around a settled viewer: `(2r + 1)^2`.
pub fn chunk_count_for_radius(radius: i32) -> usize {
    let side = (2 * radius.max(0) + 1) as usize;
    side * side
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_zero_is_center_only() {
        let cells = chunks_in_radius(ChunkCoord::new(3, -2), 0);
        assert_eq!(cells.len(), 1);
        assert!(cells.contains(&ChunkCoord::new(3, -2)));
    }

    #[test]
    fn radius_four_has_81_chunks() {
        let center = ChunkCoord::new(0, 0);
        let cells = chunks_in_radius(center, 4);
        assert_eq!(cells.len(), 81);
        assert_eq!(chunk_count_for_radius(4), 81);
        assert!(cells.iter().all(|c| c.chebyshev_distance(center) <= 4));
        assert!(cells.contains(&ChunkCoord::new(-4, 4)));
        assert!(!cells.contains(&ChunkCoord::new(5, 0)));
    }
}
