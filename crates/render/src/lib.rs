//! Rendering Adapter: renderer-agnostic scene and view.
//!
//! # Invariants
//! - The scene holds one node per resident chunk and nothing else.
//! - Materials are shared by identity for the life of the process.
//! - Renderers read the scene; only streaming attaches and detaches nodes.
//!
//! GPU back ends consume the change queue; the debug text renderer reads the
//! scene directly and is what headless tools use.

mod material;
mod renderer;
mod scene;

pub use material::{FOG_FAR, FOG_NEAR, Material, MaterialLibrary, SKY_COLOR};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use scene::{Scene, SceneBatch, SceneChange, SceneNode};

pub fn crate_info() -> &'static str {
    "minegame-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
