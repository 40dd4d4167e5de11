use std::time::Duration;

use glam::Vec3;
use minegame_common::{BlockCategory, ChunkCoord, WorldSeed};
use minegame_kernel::Session;

/// Session inspector for developer tooling.
///
/// Provides read-only queries against a running session for the HUD, the CLI,
/// and debugging.
pub struct SessionInspector;

impl SessionInspector {
    /// Produce a summary of the session state.
    pub fn summary(session: &Session) -> SessionSummary {
        let stream = session.stream();
        let viewer = session.viewer();
        SessionSummary {
            name: session.name().to_string(),
            seed: session.seed(),
            tick: session.ticks(),
            chunk: session.viewer_chunk(),
            resident_chunks: stream.resident_count(),
            solid_blocks: stream.occupancy().len(),
            position: viewer.position,
            grounded: session.is_grounded(),
            last_update: stream.stats().update_time,
        }
    }

    /// Block counts of one resident chunk.
    pub fn inspect_chunk(session: &Session, coord: ChunkCoord) -> Option<ChunkInfo> {
        session.stream().chunk(coord).map(|chunk| ChunkInfo {
            coord,
            counts: BlockCategory::ALL.map(|c| chunk.blocks.of(c).len()),
        })
    }

    /// Resident chunk coordinates, sorted.
    pub fn list_chunks(session: &Session) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = session.stream().resident_coords().into_iter().collect();
        coords.sort();
        coords
    }
}

/// Summary of session state for the inspector.
///
/// `Display` renders the HUD status line.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub name: String,
    pub seed: WorldSeed,
    pub tick: u64,
    pub chunk: ChunkCoord,
    pub resident_chunks: usize,
    pub solid_blocks: usize,
    pub position: Vec3,
    pub grounded: bool,
    /// Duration of the most recent streaming pass.
    pub last_update: Duration,
}

impl SessionSummary {
    /// Longer multi-field form for logs and the CLI.
    pub fn details(&self) -> String {
        format!(
            "Level '{}' seed={} tick={} pos=({:.2}, {:.2}, {:.2}) grounded={} solid_blocks={} last_stream={:?}",
            self.name,
            self.seed,
            self.tick,
            self.position.x,
            self.position.y,
            self.position.z,
            self.grounded,
            self.solid_blocks,
            self.last_update,
        )
    }
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {}, {} • Loaded chunks: {}",
            self.chunk.x, self.chunk.z, self.resident_chunks
        )
    }
}

/// Block counts for a single chunk, indexed like `BlockCategory::ALL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    pub coord: ChunkCoord,
    pub counts: [usize; 5],
}

impl ChunkInfo {
    pub fn count(&self, category: BlockCategory) -> usize {
        self.counts[category.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

impl std::fmt::Display for ChunkInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Chunk [{}]", self.coord)?;
        for category in BlockCategory::ALL {
            write!(f, " {}={}", category.name(), self.count(category))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minegame_common::SessionSettings;
    use minegame_kernel::SessionConfig;
    use minegame_stream::{NullSink, StreamConfig};

    fn session() -> Session {
        let settings = SessionSettings {
            name: "Inspect".into(),
            seed: WorldSeed(1337),
        };
        let config = SessionConfig {
            stream: StreamConfig { render_distance: 1 },
            ..Default::default()
        };
        Session::start(settings, config, &mut NullSink).unwrap()
    }

    #[test]
    fn summary_counts_resident_chunks() {
        let session = session();
        let summary = SessionInspector::summary(&session);
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.resident_chunks, 9);
        assert_eq!(summary.chunk, ChunkCoord::new(0, 0));
        assert!(summary.solid_blocks > 0);
    }

    #[test]
    fn summary_display_is_hud_status() {
        let summary = SessionInspector::summary(&session());
        assert_eq!(summary.to_string(), "Chunk 0, 0 • Loaded chunks: 9");
        assert!(summary.details().contains("seed=1337"));
    }

    #[test]
    fn inspect_resident_chunk() {
        let session = session();
        let info = SessionInspector::inspect_chunk(&session, ChunkCoord::new(0, 0)).unwrap();
        assert_eq!(info.count(BlockCategory::Ground), 256);
        assert_eq!(info.count(BlockCategory::Soil), 512);
        assert!(info.total() >= 768);
        assert!(info.to_string().starts_with("Chunk [0, 0] ground=256"));
    }

    #[test]
    fn inspect_missing_chunk() {
        let session = session();
        assert!(SessionInspector::inspect_chunk(&session, ChunkCoord::new(40, 40)).is_none());
    }

    #[test]
    fn list_chunks_sorted() {
        let coords = SessionInspector::list_chunks(&session());
        assert_eq!(coords.len(), 9);
        assert!(coords.windows(2).all(|w| w[0] < w[1]));
    }
}
