use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A movement action that any input device can produce.
///
/// The simulation consumes actions, never raw key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    Jump,
    /// Modifier: held together with a movement action to run.
    Sprint,
}

/// Per-frame input: the set of held actions plus pointer movement accumulated since
/// the last tick.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Action>,
    look_delta: Vec2,
    pointer_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    /// Apply a key-down (`pressed = true`) or key-up event.
    pub fn set(&mut self, action: Action, pressed: bool) {
        if pressed {
            self.press(action);
        } else {
            self.release(action);
        }
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Drop every held action, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    /// Desired movement in view space: `x` strafes right, `y` moves forward.
    /// Components are in `-1..=1`; opposing keys cancel.
    pub fn move_axes(&self) -> Vec2 {
        let mut axes = Vec2::ZERO;
        if self.is_held(Action::MoveForward) {
            axes.y += 1.0;
        }
        if self.is_held(Action::MoveBackward) {
            axes.y -= 1.0;
        }
        if self.is_held(Action::StrafeRight) {
            axes.x += 1.0;
        }
        if self.is_held(Action::StrafeLeft) {
            axes.x -= 1.0;
        }
        axes
    }

    /// Accumulate pointer movement. Ignored unless the pointer is locked.
    pub fn add_look_delta(&mut self, dx: f32, dy: f32) {
        if self.pointer_locked {
            self.look_delta += Vec2::new(dx, dy);
        }
    }

    /// Take the pointer movement accumulated since the last call.
    pub fn take_look_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    pub fn set_pointer_locked(&mut self, locked: bool) {
        if self.pointer_locked != locked {
            tracing::debug!(locked, "pointer lock changed");
        }
        self.pointer_locked = locked;
        if !locked {
            self.look_delta = Vec2::ZERO;
        }
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }
}
