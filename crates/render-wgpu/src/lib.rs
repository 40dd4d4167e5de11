//! wgpu render backend for the voxel world.
//!
//! Draws every chunk node of the scene as instanced boxes, one draw call per
//! material batch, with distance fog blending into the sky colour.
//!
//! # Invariants
//! - GPU buffers exist only for attached chunk nodes and are dropped on detach.
//! - The cube mesh is shared by every batch.
//! - The renderer never mutates streaming state.

mod camera;
mod gpu;
mod shaders;

pub use camera::FirstPersonCamera;
pub use gpu::WgpuRenderer;
