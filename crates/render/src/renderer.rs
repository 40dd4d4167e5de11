use std::fmt::Write as _;

use glam::Vec3;
use minegame_common::{BlockCategory, look_direction};

use crate::scene::Scene;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 10.0, 10.0),
            target: Vec3::new(0.0, 10.0, 9.0),
            fov_degrees: 70.0,
        }
    }
}

impl RenderView {
    /// View from an eye position and yaw/pitch in radians.
    pub fn from_viewer(eye: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            eye,
            target: eye + look_direction(yaw, pitch),
            ..Self::default()
        }
    }

    pub fn direction(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and a view configuration, then produces output.
/// It never touches streaming state.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Human-readable dump of the scene, for CLI output, logging and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// List each chunk node, not just the totals.
    pub verbose: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene (chunks={}, instances={}) ===",
            scene.node_count(),
            scene.instance_count()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z, view.fov_degrees
        );

        let mut totals = [0usize; 5];
        for node in scene.nodes_sorted() {
            for batch in &node.batches {
                totals[batch.material.category.index()] += batch.translations.len();
            }
        }
        for category in BlockCategory::ALL {
            let _ = writeln!(out, "  {:<8} {}", category.name(), totals[category.index()]);
        }

        if self.verbose {
            for node in scene.nodes_sorted() {
                let _ = writeln!(
                    out,
                    "  chunk {}: {} instances in {} batches",
                    node.coord,
                    node.instance_count(),
                    node.batches.len()
                );
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minegame_common::{ChunkCoord, WorldSeed};
    use minegame_stream::ChunkSink;
    use minegame_terrain::ChunkBuilder;

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::default();
        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());

        assert!(output.contains("chunks=0"));
        assert!(output.contains("instances=0"));
        assert!(output.contains("fov=70"));
    }

    #[test]
    fn debug_renderer_lists_chunks() {
        let mut scene = Scene::default();
        let builder = ChunkBuilder::new(WorldSeed(1337));
        scene.attach(&builder.build(ChunkCoord::new(0, 0)));
        scene.attach(&builder.build(ChunkCoord::new(-1, 0)));

        let output = DebugTextRenderer::verbose().render(&scene, &RenderView::default());
        assert!(output.contains("chunks=2"));
        assert!(output.contains("chunk -1, 0:"));
        assert!(output.contains("ground   512"));
    }

    #[test]
    fn view_from_viewer_looks_along_yaw() {
        let view = RenderView::from_viewer(Vec3::new(0.0, 5.0, 0.0), 0.0, 0.0);
        assert!((view.direction() - Vec3::Z).length() < 1e-6);
        assert_eq!(view.fov_degrees, 70.0);

        let down = RenderView::from_viewer(Vec3::ZERO, 0.0, -1.2);
        assert!(down.direction().y < -0.9);
    }
}
