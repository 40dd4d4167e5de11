use std::collections::HashSet;

use glam::{IVec3, Vec2, Vec3};
use minegame_common::{ChunkCoord, look_direction};
use minegame_input::{Action, InputState};
use minegame_stream::OccupancyIndex;
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Read-only view of solid blocks, as seen by collision.
pub trait SolidQuery {
    fn is_solid(&self, pos: IVec3) -> bool;
}

impl SolidQuery for OccupancyIndex {
    fn is_solid(&self, pos: IVec3) -> bool {
        OccupancyIndex::is_solid(self, pos)
    }
}

impl SolidQuery for HashSet<IVec3> {
    fn is_solid(&self, pos: IVec3) -> bool {
        self.contains(&pos)
    }
}

/// Movement and collision tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub gravity: f32,
    pub jump_velocity: f32,
    /// Distance from the feet to the eye.
    pub height: f32,
    pub radius: f32,
    /// Gap between the top of the collision box and the eye.
    pub head_clearance: f32,
    pub max_step_height: f32,
    pub step_increment: f32,
    pub grounded_epsilon: f32,
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub ground_responsiveness: f32,
    pub air_responsiveness: f32,
    pub vertical_substep: f32,
    /// Longest frame delta simulated in one tick, in seconds.
    pub max_frame_delta: f32,
    pub look_sensitivity: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            gravity: 30.0,
            jump_velocity: 10.0,
            height: 1.7,
            radius: 0.32,
            head_clearance: 0.1,
            max_step_height: 1.05,
            step_increment: 0.2,
            grounded_epsilon: 0.08,
            walk_speed: 6.0,
            sprint_speed: 11.0,
            ground_responsiveness: 16.0,
            air_responsiveness: 5.0,
            vertical_substep: 0.12,
            max_frame_delta: 0.05,
            look_sensitivity: 0.004,
            min_pitch: -1.2,
            max_pitch: 0.6,
        }
    }
}

impl PlayerConfig {
    /// Reject tuning that would panic or stall the controller.
    pub fn validate(&self) -> Result<(), SessionError> {
        let positive = [
            ("max_frame_delta", self.max_frame_delta),
            ("vertical_substep", self.vertical_substep),
            ("step_increment", self.step_increment),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SessionError::InvalidPlayerConfig {
                    field,
                    reason: "must be finite and greater than zero",
                });
            }
        }

        let non_negative = [
            ("height", self.height),
            ("radius", self.radius),
            ("head_clearance", self.head_clearance),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SessionError::InvalidPlayerConfig {
                    field,
                    reason: "must be finite and not negative",
                });
            }
        }

        if self.min_pitch.is_nan() || self.max_pitch.is_nan() || self.min_pitch > self.max_pitch {
            return Err(SessionError::InvalidPlayerConfig {
                field: "min_pitch",
                reason: "must not exceed max_pitch",
            });
        }
        Ok(())
    }
}

/// The viewer: eye position, look angles, and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerState {
    /// Eye position. The feet are `height` below it.
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub velocity_y: f32,
    /// Horizontal velocity as (x, z).
    pub horizontal_velocity: Vec2,
}

impl ViewerState {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
            velocity_y: 0.0,
            horizontal_velocity: Vec2::ZERO,
        }
    }

    /// Unit look vector for the current yaw and pitch.
    pub fn look_direction(&self) -> Vec3 {
        look_direction(self.yaw, self.pitch)
    }

    pub fn look_target(&self) -> Vec3 {
        self.position + self.look_direction()
    }

    pub fn chunk(&self) -> ChunkCoord {
        ChunkCoord::from_position(self.position)
    }
}

/// Movement intent for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    /// `x` strafes right, `y` moves forward.
    pub axes: Vec2,
    pub jump: bool,
    pub sprint: bool,
}

impl MoveInput {
    pub fn from_input(input: &InputState) -> Self {
        Self {
            axes: input.move_axes(),
            jump: input.is_held(Action::Jump),
            sprint: input.is_held(Action::Sprint),
        }
    }
}

/// How the horizontal part of a step resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizontalMove {
    Idle,
    Free,
    Stepped { lift: f32 },
    Slid { moved_x: bool, moved_z: bool },
    Blocked,
}

/// Outcome of one `PlayerController::step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Grounded state sampled at the start of the step.
    pub grounded: bool,
    pub jumped: bool,
    pub horizontal: HorizontalMove,
    pub vertical_blocked: bool,
    /// The delta actually simulated after clamping.
    pub dt: f32,
}

/// Kinematic first-person controller against an axis-aligned block world.
#[derive(Debug, Clone, Default)]
pub struct PlayerController {
    config: PlayerConfig,
}

impl PlayerController {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Whether the player box with its eye at `pos` overlaps any solid block.
    pub fn collides_at(&self, world: &dyn SolidQuery, pos: Vec3) -> bool {
        let c = &self.config;
        let min_x = (pos.x - c.radius).floor() as i32;
        let max_x = (pos.x + c.radius).floor() as i32;
        let min_y = (pos.y - c.height).floor() as i32;
        let max_y = (pos.y - c.head_clearance).floor() as i32;
        let min_z = (pos.z - c.radius).floor() as i32;
        let max_z = (pos.z + c.radius).floor() as i32;

        for x in min_x..=max_x {
            for y in min_y..=max_y {
                for z in min_z..=max_z {
                    if world.is_solid(IVec3::new(x, y, z)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn is_grounded(&self, world: &dyn SolidQuery, pos: Vec3) -> bool {
        self.collides_at(world, pos - Vec3::Y * self.config.grounded_epsilon)
    }

    /// Clamp a frame delta into `0..=max_frame_delta`. NaN counts as zero.
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        if dt.is_nan() {
            return 0.0;
        }
        dt.clamp(0.0, self.config.max_frame_delta)
    }

    /// Advance the viewer by one frame.
    pub fn step(
        &self,
        viewer: &mut ViewerState,
        input: &MoveInput,
        world: &dyn SolidQuery,
        dt: f32,
    ) -> StepReport {
        let c = &self.config;
        let dt = self.clamp_dt(dt);
        let grounded = self.is_grounded(world, viewer.position);

        let forward = Vec2::new(viewer.yaw.sin(), viewer.yaw.cos());
        let right = Vec2::new(forward.y, -forward.x);
        let mut desired = input.axes;
        if desired.length_squared() > 1.0 {
            desired = desired.normalize();
        }
        let speed = if input.sprint { c.sprint_speed } else { c.walk_speed };
        let target = (forward * desired.y + right * desired.x) * speed;

        let responsiveness = if grounded {
            c.ground_responsiveness
        } else {
            c.air_responsiveness
        };
        let blend = 1.0 - (-responsiveness * dt).exp();
        viewer.horizontal_velocity = viewer.horizontal_velocity.lerp(target, blend);

        let delta = viewer.horizontal_velocity * dt;
        let horizontal = self.move_horizontally(viewer, world, delta, grounded);

        let jumped = input.jump && grounded;
        if jumped {
            viewer.velocity_y = c.jump_velocity;
        }
        viewer.velocity_y -= c.gravity * dt;
        let vertical_blocked = self.move_vertically(viewer, world, viewer.velocity_y * dt);

        StepReport {
            grounded,
            jumped,
            horizontal,
            vertical_blocked,
            dt,
        }
    }

    /// Move by `delta` (x, z): the full move, then a step-up when grounded, then
    /// each axis on its own.
    pub fn move_horizontally(
        &self,
        viewer: &mut ViewerState,
        world: &dyn SolidQuery,
        delta: Vec2,
        grounded: bool,
    ) -> HorizontalMove {
        if delta == Vec2::ZERO {
            return HorizontalMove::Idle;
        }

        let pos = viewer.position;
        let target = Vec3::new(pos.x + delta.x, pos.y, pos.z + delta.y);
        if !self.collides_at(world, target) {
            viewer.position = target;
            return HorizontalMove::Free;
        }

        if grounded && self.config.step_increment > 0.0 {
            let steps = (self.config.max_step_height / self.config.step_increment).floor() as u32;
            for i in 1..=steps {
                let lift = self.config.step_increment * i as f32;
                let lifted = target + Vec3::Y * lift;
                if !self.collides_at(world, lifted) {
                    viewer.position = lifted;
                    return HorizontalMove::Stepped { lift };
                }
            }
        }

        let mut moved_x = false;
        let mut moved_z = false;
        let along_x = Vec3::new(target.x, pos.y, pos.z);
        if delta.x != 0.0 && !self.collides_at(world, along_x) {
            viewer.position = along_x;
            moved_x = true;
        }
        let along_z = Vec3::new(viewer.position.x, pos.y, target.z);
        if delta.y != 0.0 && !self.collides_at(world, along_z) {
            viewer.position = along_z;
            moved_z = true;
        }

        if moved_x || moved_z {
            HorizontalMove::Slid { moved_x, moved_z }
        } else {
            HorizontalMove::Blocked
        }
    }

    /// Move vertically in bounded substeps. On contact the vertical velocity is
    /// zeroed and the remaining motion discarded; returns whether that happened.
    pub fn move_vertically(&self, viewer: &mut ViewerState, world: &dyn SolidQuery, delta: f32) -> bool {
        if delta == 0.0 || !delta.is_finite() {
            return false;
        }

        let direction = delta.signum();
        let (count, last) = self.vertical_substeps(delta.abs());
        for i in 0..count {
            let step = if i + 1 == count {
                last
            } else {
                self.config.vertical_substep
            };
            let next = viewer.position + Vec3::Y * (step * direction);
            if self.collides_at(world, next) {
                viewer.velocity_y = 0.0;
                return true;
            }
            viewer.position = next;
        }
        false
    }

    /// Split a vertical distance into full substeps plus a final partial one.
    /// Returns the number of substeps and the length of the last.
    fn vertical_substeps(&self, distance: f32) -> (u32, f32) {
        let substep = self.config.vertical_substep;
        if distance <= 0.0 || !distance.is_finite() || substep.is_nan() || substep <= 0.0 {
            return (0, 0.0);
        }
        let (distance, substep) = (f64::from(distance), f64::from(substep));
        let count = (distance / substep).ceil().max(1.0) as u32;
        let last = distance - substep * f64::from(count - 1);
        (count, last.clamp(0.0, substep) as f32)
    }

    /// Apply a pointer delta to yaw and pitch.
    pub fn apply_look(&self, viewer: &mut ViewerState, delta: Vec2) {
        let c = &self.config;
        viewer.yaw -= delta.x * c.look_sensitivity;
        viewer.pitch = (viewer.pitch - delta.y * c.look_sensitivity).clamp(c.min_pitch, c.max_pitch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    /// A 16x16 floor whose top surface is at y = 1.
    fn floor() -> HashSet<IVec3> {
        let mut blocks = HashSet::new();
        for x in -8..8 {
            for z in -8..8 {
                blocks.insert(IVec3::new(x, 0, z));
            }
        }
        blocks
    }

    fn standing(feet: Vec3, yaw: f32) -> ViewerState {
        ViewerState::new(feet + Vec3::Y * PlayerConfig::default().height, yaw, 0.0)
    }

    fn feet(viewer: &ViewerState) -> f32 {
        viewer.position.y - PlayerConfig::default().height
    }

    fn forward() -> MoveInput {
        MoveInput {
            axes: Vec2::new(0.0, 1.0),
            ..Default::default()
        }
    }

    #[test]
    fn grounded_within_epsilon() {
        let player = PlayerController::default();
        let world = floor();
        let eye = Vec3::new(0.5, 1.0 + 1.7 + 0.05, 0.5);
        assert!(player.is_grounded(&world, eye));
        assert!(!player.collides_at(&world, eye));
    }

    #[test]
    fn vertical_substeps_cover_distance() {
        let player = PlayerController::default();
        let (count, last) = player.vertical_substeps(1.0);
        assert_eq!(count, 9);
        assert!((last - 0.04).abs() < 1e-5);
        assert_eq!(player.vertical_substeps(0.0), (0, 0.0));
        assert_eq!(player.vertical_substeps(f32::NAN), (0, 0.0));
    }

    #[test]
    fn huge_vertical_delta_has_bounded_substeps() {
        let player = PlayerController::default();
        // 0.12 is below half an ulp of 3e6, so repeated subtraction would never finish
        let (count, last) = player.vertical_substeps(3.0e6);
        assert!((25_000_000..=25_000_001).contains(&count));
        assert!(last > 0.0 && last <= 0.12);
    }

    #[test]
    fn free_vertical_move_travels_full_delta() {
        let player = PlayerController::default();
        let mut viewer = ViewerState::new(Vec3::new(0.5, 10.0, 0.5), 0.0, 0.0);
        assert!(!player.move_vertically(&mut viewer, &HashSet::new(), -1.0));
        assert!((viewer.position.y - 9.0).abs() < 1e-4);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(PlayerConfig::default().validate().is_ok());
        let inverted = PlayerConfig {
            min_pitch: 1.0,
            max_pitch: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(SessionError::InvalidPlayerConfig { field: "min_pitch", .. })
        ));
        let stalled = PlayerConfig {
            vertical_substep: 0.0,
            ..Default::default()
        };
        assert!(stalled.validate().is_err());
        let nan_dt = PlayerConfig {
            max_frame_delta: f32::NAN,
            ..Default::default()
        };
        assert!(nan_dt.validate().is_err());
    }

    #[test]
    fn not_grounded_above_epsilon() {
        let player = PlayerController::default();
        let world = floor();
        let eye = Vec3::new(0.5, 1.0 + 1.7 + 0.2, 0.5);
        assert!(!player.is_grounded(&world, eye));
    }

    #[test]
    fn unknown_space_is_empty() {
        let player = PlayerController::default();
        let world = HashSet::new();
        assert!(!player.collides_at(&world, Vec3::new(1000.0, -50.0, -1000.0)));
    }

    #[test]
    fn fast_fall_cannot_tunnel_through_floor() {
        let player = PlayerController::default();
        let world = floor();
        let mut viewer = standing(Vec3::new(0.5, 9.0, 0.5), 0.0);
        viewer.velocity_y = -500.0;

        let report = player.step(&mut viewer, &MoveInput::default(), &world, 1.0);
        assert!(report.vertical_blocked);
        assert_eq!(viewer.velocity_y, 0.0);
        let f = feet(&viewer);
        assert!((1.0..1.12).contains(&f), "feet at {f}");
    }

    #[test]
    fn large_substepped_move_stops_on_floor() {
        let player = PlayerController::default();
        let world = floor();
        let mut viewer = standing(Vec3::new(-3.5, 30.0, 2.5), 0.0);
        viewer.velocity_y = -100.0;

        assert!(player.move_vertically(&mut viewer, &world, -100.0));
        let f = feet(&viewer);
        assert!((1.0..1.12).contains(&f), "feet at {f}");
    }

    #[test]
    fn settles_and_becomes_grounded() {
        let player = PlayerController::default();
        let world = floor();
        let mut viewer = standing(Vec3::new(0.5, 4.0, 0.5), 0.0);

        for _ in 0..40 {
            player.step(&mut viewer, &MoveInput::default(), &world, 0.05);
        }
        assert!(player.is_grounded(&world, viewer.position));
        assert!(feet(&viewer) >= 1.0);
    }

    #[test]
    fn jump_only_when_grounded() {
        let player = PlayerController::default();
        let world = floor();
        let jump = MoveInput {
            jump: true,
            ..Default::default()
        };

        let mut viewer = standing(Vec3::new(0.5, 1.01, 0.5), 0.0);
        let report = player.step(&mut viewer, &jump, &world, 0.05);
        assert!(report.grounded);
        assert!(report.jumped);
        assert!((viewer.velocity_y - 8.5).abs() < 1e-4);
        assert!(feet(&viewer) > 1.3);

        let report = player.step(&mut viewer, &jump, &world, 0.05);
        assert!(!report.grounded);
        assert!(!report.jumped);
        assert!((viewer.velocity_y - 7.0).abs() < 1e-4);
    }

    #[test]
    fn wall_blocks_horizontal_motion() {
        let player = PlayerController::default();
        let mut world = floor();
        for y in 1..=3 {
            for z in -8..8 {
                world.insert(IVec3::new(2, y, z));
            }
        }

        let mut viewer = standing(Vec3::new(0.0, 1.01, 0.5), FRAC_PI_2);
        for _ in 0..60 {
            player.step(&mut viewer, &forward(), &world, 0.05);
        }
        assert!(viewer.position.x > 1.0);
        assert!(viewer.position.x < 1.68 + 1e-4, "x = {}", viewer.position.x);
    }

    #[test]
    fn slides_along_wall() {
        let player = PlayerController::default();
        let mut world = floor();
        for y in 1..=3 {
            for z in -8..8 {
                world.insert(IVec3::new(2, y, z));
            }
        }

        // Heading diagonally into the wall: x is blocked, z keeps moving.
        let mut viewer = standing(Vec3::new(1.6, 1.01, 0.5), FRAC_PI_2 / 2.0);
        let start_z = viewer.position.z;
        for _ in 0..10 {
            player.step(&mut viewer, &forward(), &world, 0.05);
        }
        assert!(viewer.position.x < 1.68 + 1e-4);
        assert!(viewer.position.z > start_z + 0.5);
    }

    #[test]
    fn steps_onto_one_block_ledge() {
        let player = PlayerController::default();
        let mut world = floor();
        for x in 2..8 {
            for z in -8..8 {
                world.insert(IVec3::new(x, 1, z));
            }
        }

        let mut viewer = standing(Vec3::new(0.0, 1.01, 0.5), FRAC_PI_2);
        let mut stepped = false;
        for _ in 0..15 {
            let report = player.step(&mut viewer, &forward(), &world, 0.05);
            stepped |= matches!(report.horizontal, HorizontalMove::Stepped { .. });
        }
        assert!(stepped);
        assert!(viewer.position.x > 2.5);
        assert!(feet(&viewer) >= 2.0 - 1e-4);
    }

    #[test]
    fn no_step_up_while_airborne() {
        let player = PlayerController::default();
        let mut world = HashSet::new();
        for y in 0..2 {
            for z in -4..4 {
                world.insert(IVec3::new(2, y, z));
            }
        }
        let mut viewer = standing(Vec3::new(1.5, 1.5, 0.5), 0.0);
        let result = player.move_horizontally(&mut viewer, &world, Vec2::new(0.3, 0.0), false);
        assert_eq!(result, HorizontalMove::Blocked);
    }

    #[test]
    fn sprint_covers_more_ground() {
        let player = PlayerController::default();
        let world = floor();
        let sprint = MoveInput {
            sprint: true,
            ..forward()
        };

        let mut walker = standing(Vec3::new(0.5, 1.01, -6.0), 0.0);
        let mut runner = walker;
        for _ in 0..20 {
            player.step(&mut walker, &forward(), &world, 0.05);
            player.step(&mut runner, &sprint, &world, 0.05);
        }
        assert!(runner.position.z > walker.position.z + 1.0);
    }

    #[test]
    fn air_control_is_weaker() {
        let player = PlayerController::default();
        let world = floor();

        let mut ground = standing(Vec3::new(0.5, 1.01, 0.5), 0.0);
        let mut air = standing(Vec3::new(0.5, 5.0, 0.5), 0.0);
        player.step(&mut ground, &forward(), &world, 0.05);
        player.step(&mut air, &forward(), &world, 0.05);
        assert!(air.horizontal_velocity.length() < ground.horizontal_velocity.length());
    }

    #[test]
    fn diagonal_input_is_normalised() {
        let player = PlayerController::default();
        let world = floor();
        let diagonal = MoveInput {
            axes: Vec2::new(1.0, 1.0),
            ..Default::default()
        };
        let mut viewer = standing(Vec3::new(-4.5, 1.01, -4.5), 0.0);
        for _ in 0..20 {
            player.step(&mut viewer, &diagonal, &world, 0.05);
        }
        let speed = viewer.horizontal_velocity.length();
        assert!(speed > 5.0 && speed <= 6.0 + 1e-3, "speed {speed}");
    }

    #[test]
    fn frame_delta_is_clamped() {
        let player = PlayerController::default();
        let world = HashSet::new();
        let mut viewer = standing(Vec3::new(0.5, 50.0, 0.5), 0.0);

        let report = player.step(&mut viewer, &MoveInput::default(), &world, 10.0);
        assert_eq!(report.dt, 0.05);
        assert!((viewer.velocity_y + 1.5).abs() < 1e-5);
        assert_eq!(player.clamp_dt(f32::NAN), 0.0);
        assert_eq!(player.clamp_dt(-1.0), 0.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let player = PlayerController::default();
        let mut viewer = ViewerState::new(Vec3::ZERO, 0.0, 0.0);

        player.apply_look(&mut viewer, Vec2::new(0.0, -1000.0));
        assert_eq!(viewer.pitch, 0.6);
        player.apply_look(&mut viewer, Vec2::new(0.0, 1000.0));
        assert_eq!(viewer.pitch, -1.2);

        player.apply_look(&mut viewer, Vec2::new(250.0, 0.0));
        assert!((viewer.yaw + 1.0).abs() < 1e-5);
    }

    #[test]
    fn look_direction_matches_yaw() {
        let viewer = ViewerState::new(Vec3::ZERO, FRAC_PI_2, 0.0);
        let dir = viewer.look_direction();
        assert!((dir - Vec3::X).length() < 1e-5);
        assert!((viewer.look_direction().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn move_input_reads_held_actions() {
        let mut input = InputState::new();
        input.press(Action::MoveForward);
        input.press(Action::Sprint);
        let m = MoveInput::from_input(&input);
        assert_eq!(m.axes, Vec2::new(0.0, 1.0));
        assert!(m.sprint);
        assert!(!m.jump);
    }
}
