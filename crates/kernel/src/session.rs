use std::f32::consts::PI;

use glam::Vec3;
use minegame_common::{ChunkCoord, SessionSettings, WorldSeed};
use minegame_input::InputState;
use minegame_stream::{ChunkSink, StreamConfig, StreamState, StreamUpdate};
use serde::{Deserialize, Serialize};

use crate::SessionError;
use crate::player::{MoveInput, PlayerConfig, PlayerController, StepReport, ViewerState};

/// Spawn column, relative to the world origin.
const SPAWN_X: i32 = 0;
const SPAWN_Z: i32 = 12;
/// Eye height above the spawn column's surface.
const SPAWN_DROP: f32 = 5.0;
const SPAWN_YAW: f32 = PI;
const SPAWN_PITCH: f32 = -0.35;
/// Upper bound on the whole-block lifts applied to clear a spawn inside a tree.
const MAX_SPAWN_LIFT: u32 = 16;

/// Everything a session can be tuned with, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub stream: StreamConfig,
    pub player: PlayerConfig,
}

/// What happened during one `Session::tick`.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub step: StepReport,
    /// `None` when the viewer stayed in the same chunk.
    pub stream: Option<StreamUpdate>,
}

/// A running world: streaming state, the viewer, and the controller moving it.
///
/// Each tick moves the viewer against the chunks resident at the start of the
/// tick, then streams around the new position. A chunk loaded this tick becomes
/// solid for collision on the next one.
pub struct Session {
    settings: SessionSettings,
    config: SessionConfig,
    stream: StreamState,
    player: PlayerController,
    viewer: ViewerState,
    ticks: u64,
}

impl Session {
    /// Spawn a viewer and stream in the chunks around it.
    pub fn start(
        settings: SessionSettings,
        config: SessionConfig,
        sink: &mut dyn ChunkSink,
    ) -> Result<Self, SessionError> {
        config.player.validate()?;
        let stream = StreamState::new(config.stream.clone(), settings.seed)?;
        let player = PlayerController::new(config.player.clone());
        let viewer = spawn_viewer(&stream);

        let mut session = Self {
            settings,
            config,
            stream,
            player,
            viewer,
            ticks: 0,
        };
        let update = session.stream.force_update(session.viewer.position, sink)?;
        session.clear_spawn();
        tracing::info!(
            name = %session.settings.name,
            seed = %session.settings.seed,
            loaded = update.loaded.len(),
            "session started"
        );
        Ok(session)
    }

    /// Advance one frame: look, move, then stream.
    pub fn tick(
        &mut self,
        dt: f32,
        input: &mut InputState,
        sink: &mut dyn ChunkSink,
    ) -> Result<TickReport, SessionError> {
        let look = input.take_look_delta();
        self.player.apply_look(&mut self.viewer, look);

        let movement = MoveInput::from_input(input);
        let step = self
            .player
            .step(&mut self.viewer, &movement, self.stream.occupancy(), dt);
        let stream = self.stream.update(self.viewer.position, sink)?;

        self.ticks += 1;
        Ok(TickReport {
            tick: self.ticks,
            step,
            stream,
        })
    }

    /// Unload everything, respawn the viewer, and stream again.
    pub fn reset(&mut self, sink: &mut dyn ChunkSink) -> Result<StreamUpdate, SessionError> {
        let dropped = self.stream.clear(sink);
        self.viewer = spawn_viewer(&self.stream);
        self.ticks = 0;
        let update = self.stream.force_update(self.viewer.position, sink)?;
        self.clear_spawn();
        tracing::info!(dropped, loaded = update.loaded.len(), "session reset");
        Ok(update)
    }

    /// Move the viewer to `position` at rest. Streaming follows on the next tick.
    pub fn teleport(&mut self, position: Vec3) {
        self.viewer.position = position;
        self.viewer.velocity_y = 0.0;
        self.viewer.horizontal_velocity = glam::Vec2::ZERO;
        tracing::debug!(?position, "viewer teleported");
    }

    /// Raise a freshly spawned viewer out of any foliage or trunk it landed in.
    fn clear_spawn(&mut self) {
        let world = self.stream.occupancy();
        let mut lifts = 0;
        while lifts < MAX_SPAWN_LIFT && self.player.collides_at(world, self.viewer.position) {
            self.viewer.position.y += 1.0;
            lifts += 1;
        }
        if lifts > 0 {
            tracing::debug!(lifts, "spawn lifted clear of blocks");
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn seed(&self) -> WorldSeed {
        self.settings.seed
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn viewer(&self) -> &ViewerState {
        &self.viewer
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn stream(&self) -> &StreamState {
        &self.stream
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn viewer_chunk(&self) -> ChunkCoord {
        self.viewer.chunk()
    }

    pub fn is_grounded(&self) -> bool {
        self.player
            .is_grounded(self.stream.occupancy(), self.viewer.position)
    }
}

fn spawn_viewer(stream: &StreamState) -> ViewerState {
    let surface = stream.builder().terrain().height(SPAWN_X, SPAWN_Z);
    let position = Vec3::new(SPAWN_X as f32, surface as f32 + SPAWN_DROP, SPAWN_Z as f32);
    ViewerState::new(position, SPAWN_YAW, SPAWN_PITCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minegame_input::Action;
    use minegame_stream::NullSink;
    use minegame_terrain::Chunk;

    fn settings(seed: i64) -> SessionSettings {
        SessionSettings {
            name: "Test".to_string(),
            seed: WorldSeed(seed),
        }
    }

    fn small_config() -> SessionConfig {
        SessionConfig {
            stream: StreamConfig { render_distance: 1 },
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct CountingSink {
        attached: usize,
        detached: usize,
    }

    impl ChunkSink for CountingSink {
        fn attach(&mut self, _chunk: &Chunk) {
            self.attached += 1;
        }
        fn detach(&mut self, _coord: ChunkCoord) {
            self.detached += 1;
        }
    }

    #[test]
    fn start_spawns_above_terrain_and_streams() {
        let mut sink = CountingSink::default();
        let session = Session::start(settings(1337), small_config(), &mut sink).unwrap();

        let surface = session.stream().builder().terrain().height(0, 12);
        let eye = session.viewer().position;
        assert_eq!((eye.x, eye.z), (0.0, 12.0));
        assert!(eye.y >= surface as f32 + 5.0);
        assert!(!session.player().collides_at(session.stream().occupancy(), eye));
        assert_eq!(session.viewer().yaw, PI);
        assert_eq!(session.stream().resident_count(), 9);
        assert_eq!(sink.attached, 9);
        assert_eq!(session.viewer_chunk(), ChunkCoord::new(0, 0));
    }

    #[test]
    fn default_distance_settles_81_chunks() {
        let session = Session::start(settings(1337), SessionConfig::default(), &mut NullSink).unwrap();
        assert_eq!(session.stream().resident_count(), 81);
    }

    #[test]
    fn invalid_render_distance_is_rejected() {
        let config = SessionConfig {
            stream: StreamConfig { render_distance: -1 },
            ..Default::default()
        };
        let err = Session::start(settings(1), config, &mut NullSink).err();
        assert!(matches!(err, Some(SessionError::Stream(_))));
    }

    #[test]
    fn invalid_player_config_is_rejected() {
        for json in [
            r#"{"min_pitch": 1.0, "max_pitch": -1.0}"#,
            r#"{"max_frame_delta": -0.05}"#,
            r#"{"vertical_substep": 0.0}"#,
            r#"{"radius": -0.3}"#,
        ] {
            let config = SessionConfig {
                player: serde_json::from_str(json).unwrap(),
                ..small_config()
            };
            let err = Session::start(settings(1), config, &mut NullSink).err();
            assert!(
                matches!(err, Some(SessionError::InvalidPlayerConfig { .. })),
                "{json} was accepted"
            );
        }
    }

    #[test]
    fn viewer_falls_and_lands() {
        let mut session = Session::start(settings(1337), small_config(), &mut NullSink).unwrap();
        let mut input = InputState::new();
        let start_y = session.viewer().position.y;

        for _ in 0..120 {
            session.tick(1.0 / 60.0, &mut input, &mut NullSink).unwrap();
        }
        assert!(session.viewer().position.y < start_y);
        assert!(session.is_grounded());
        assert_eq!(session.ticks(), 120);
    }

    #[test]
    fn walking_moves_along_yaw() {
        let mut session = Session::start(settings(1337), small_config(), &mut NullSink).unwrap();
        let mut input = InputState::new();
        input.press(Action::MoveForward);
        input.press(Action::Sprint);
        input.press(Action::Jump);

        for _ in 0..40 {
            session.tick(0.05, &mut input, &mut NullSink).unwrap();
        }
        // spawn yaw is pi, so forward is -z
        assert!(session.viewer().position.z < 11.0);
    }

    #[test]
    fn changing_chunk_streams_on_next_tick() {
        let mut session = Session::start(settings(1337), small_config(), &mut NullSink).unwrap();
        let mut input = InputState::new();

        let idle = session.tick(0.016, &mut input, &mut NullSink).unwrap();
        assert!(idle.stream.is_none());

        session.teleport(Vec3::new(80.0, 60.0, -50.0));
        let report = session.tick(0.016, &mut input, &mut NullSink).unwrap();
        let update = report.stream.expect("chunk changed");
        assert_eq!(update.center, Some(ChunkCoord::new(5, -4)));
        assert_eq!(update.loaded.len(), 9);
        assert_eq!(session.stream().resident_count(), 9);
        assert_eq!(session.stream().center(), Some(session.viewer_chunk()));
    }

    #[test]
    fn look_delta_is_consumed_each_tick() {
        let mut session = Session::start(settings(7), small_config(), &mut NullSink).unwrap();
        let mut input = InputState::new();
        input.set_pointer_locked(true);
        input.add_look_delta(100.0, 0.0);

        let yaw = session.viewer().yaw;
        session.tick(0.016, &mut input, &mut NullSink).unwrap();
        assert!((session.viewer().yaw - (yaw - 0.4)).abs() < 1e-5);

        session.tick(0.016, &mut input, &mut NullSink).unwrap();
        assert!((session.viewer().yaw - (yaw - 0.4)).abs() < 1e-5);
    }

    #[test]
    fn reset_respawns() {
        let mut sink = CountingSink::default();
        let mut session = Session::start(settings(99), small_config(), &mut sink).unwrap();
        let spawn = session.viewer().position;
        let mut input = InputState::new();
        for _ in 0..30 {
            session.tick(0.05, &mut input, &mut sink).unwrap();
        }

        session.reset(&mut sink).unwrap();
        assert_eq!(session.viewer().position, spawn);
        assert_eq!(session.ticks(), 0);
        assert_eq!(sink.detached, 9);
        assert_eq!(sink.attached, 18);
    }

    #[test]
    fn config_fills_missing_fields() {
        let config: SessionConfig =
            serde_json::from_str(r#"{ "stream": { "render_distance": 2 }, "player": { "gravity": 9.8 } }"#)
                .unwrap();
        assert_eq!(config.stream.render_distance, 2);
        assert_eq!(config.player.gravity, 9.8);
        assert_eq!(config.player.jump_velocity, 10.0);
    }
}
