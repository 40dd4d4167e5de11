use glam::{Mat4, Vec3};
use minegame_common::look_direction;
use minegame_render::RenderView;

/// Perspective camera that follows the viewer's eye.
pub struct FirstPersonCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for FirstPersonCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 12.0),
            yaw: std::f32::consts::PI,
            pitch: -0.35,
            fov: 70.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 450.0,
        }
    }
}

impl FirstPersonCamera {
    /// Move the camera to the viewer's eye and look angles.
    pub fn follow(&mut self, eye: Vec3, yaw: f32, pitch: f32) {
        self.position = eye;
        self.yaw = yaw;
        self.pitch = pitch;
    }

    pub fn forward(&self) -> Vec3 {
        look_direction(self.yaw, self.pitch)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The same view in renderer-agnostic form.
    pub fn render_view(&self) -> RenderView {
        RenderView {
            eye: self.position,
            target: self.position + self.forward(),
            fov_degrees: self.fov.to_degrees(),
        }
    }
}
