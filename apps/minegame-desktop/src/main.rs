use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};
use minegame_common::SessionSettings;
use minegame_input::{Action, InputState};
use minegame_kernel::{Session, SessionConfig};
use minegame_persist::{Autosave, AutosaveOutcome, LevelRecord, LevelStore};
use minegame_render::{MaterialLibrary, Scene};
use minegame_render_wgpu::{FirstPersonCamera, WgpuRenderer};
use minegame_tools::{FrameTimer, SessionInspector};

#[derive(Parser)]
#[command(name = "minegame-desktop", about = "Walk a procedurally generated voxel world")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Saved level directory
    #[arg(long, default_value = "./minegame_data")]
    data_dir: PathBuf,

    /// Level name (blank uses the default)
    #[arg(long, default_value = "")]
    name: String,

    /// Seed: an integer, any text (hashed), or blank for random
    #[arg(long, default_value = "")]
    seed: String,

    /// Resume a saved level by name, ignoring --name and --seed
    #[arg(long)]
    load: Option<String>,

    /// Chunks kept resident around the viewer in each direction
    #[arg(long)]
    render_distance: Option<i32>,

    /// JSON file overriding stream and player tuning
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>, render_distance: Option<i32>) -> Result<SessionConfig> {
    let mut config = match path {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening config {}", path.display()))?;
            serde_json::from_reader(file).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    if let Some(distance) = render_distance {
        config.stream.render_distance = distance;
    }
    Ok(config)
}

/// Desktop key bindings.
fn action_for(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::KeyW => Some(Action::MoveForward),
        KeyCode::KeyS => Some(Action::MoveBackward),
        KeyCode::KeyA => Some(Action::StrafeLeft),
        KeyCode::KeyD => Some(Action::StrafeRight),
        KeyCode::Space => Some(Action::Jump),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Action::Sprint),
        _ => None,
    }
}

/// Application state.
struct AppState {
    session: Session,
    scene: Scene,
    input: InputState,
    camera: FirstPersonCamera,
    store: Option<LevelStore>,
    autosave: Autosave,
    frame_timer: FrameTimer,
    show_hud: bool,
    status: Option<String>,
    last_frame: Instant,
}

impl AppState {
    fn new(settings: SessionSettings, config: SessionConfig, store: Option<LevelStore>) -> Result<Self> {
        let mut scene = Scene::new(MaterialLibrary::new());
        let session = Session::start(settings, config, &mut scene)?;
        let mut camera = FirstPersonCamera::default();
        let viewer = session.viewer();
        camera.follow(viewer.position, viewer.yaw, viewer.pitch);

        Ok(Self {
            session,
            scene,
            input: InputState::new(),
            camera,
            store,
            autosave: Autosave::default(),
            frame_timer: FrameTimer::default(),
            show_hud: true,
            status: None,
            last_frame: Instant::now(),
        })
    }

    fn update(&mut self, dt: Duration) {
        self.frame_timer.record(dt);
        if let Err(e) = self.session.tick(dt.as_secs_f32(), &mut self.input, &mut self.scene) {
            tracing::error!("session tick failed: {e}");
        }
        let viewer = self.session.viewer();
        self.camera.follow(viewer.position, viewer.yaw, viewer.pitch);

        if let Some(store) = &self.store {
            let (name, seed) = (self.session.name().to_string(), self.session.seed());
            match self.autosave.poll(dt, store, || LevelRecord::now(name, seed)) {
                AutosaveOutcome::Saved => tracing::debug!("autosaved"),
                // already logged by the autosave, retried next interval
                AutosaveOutcome::Failed | AutosaveOutcome::NotDue => {}
            }
        }
    }

    /// Handle a key event. Returns true when the pointer should be released.
    fn handle_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        if let Some(action) = action_for(key) {
            self.input.set(action, pressed);
            return false;
        }
        if !pressed {
            return false;
        }

        match key {
            KeyCode::Escape => return true,
            KeyCode::F1 => self.show_hud = !self.show_hud,
            KeyCode::F5 => self.save_level(),
            KeyCode::F9 => self.respawn(),
            _ => {}
        }
        false
    }

    fn save_level(&mut self) {
        let Some(store) = &self.store else {
            self.status = Some("No save directory".into());
            return;
        };
        let record = LevelRecord::now(self.session.name(), self.session.seed());
        match store.save(&record) {
            Ok(()) => {
                self.autosave.reset();
                self.status = Some(format!("Saved '{}'", record.name));
            }
            Err(e) => {
                tracing::error!("failed to save level: {e}");
                self.status = Some("Save failed".into());
            }
        }
    }

    fn respawn(&mut self) {
        match self.session.reset(&mut self.scene) {
            Ok(_) => self.status = Some("Respawned".into()),
            Err(e) => tracing::error!("failed to respawn: {e}"),
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        // crosshair
        let center = ctx.screen_rect().center();
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("crosshair"),
        ));
        let stroke = egui::Stroke::new(2.0, egui::Color32::WHITE);
        painter.line_segment([center - egui::vec2(8.0, 0.0), center + egui::vec2(8.0, 0.0)], stroke);
        painter.line_segment([center - egui::vec2(0.0, 8.0), center + egui::vec2(0.0, 8.0)], stroke);

        if !self.show_hud {
            return;
        }

        let summary = SessionInspector::summary(&self.session);
        egui::Window::new(format!("Mine Game: {}", summary.name))
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.label(summary.to_string());
                ui.label(format!("Seed: {}", summary.seed));
                ui.label(format!(
                    "Position: ({:.1}, {:.1}, {:.1}){}",
                    summary.position.x,
                    summary.position.y,
                    summary.position.z,
                    if summary.grounded { "" } else { " airborne" }
                ));
                ui.separator();
                ui.label(format!(
                    "FPS: {:.0}  frame {:.1} ms (max {:.1})",
                    self.frame_timer.fps(),
                    self.frame_timer.average().as_secs_f64() * 1000.0,
                    self.frame_timer.max().as_secs_f64() * 1000.0
                ));
                ui.label(format!(
                    "Stream: {} blocks, last pass {:.2} ms",
                    summary.solid_blocks,
                    summary.last_update.as_secs_f64() * 1000.0
                ));
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
                ui.separator();
                if !self.input.pointer_locked() {
                    ui.small("Click to capture the mouse");
                }
                ui.small("WASD: Move | Space: Jump | Shift: Sprint | Esc: Release mouse");
                ui.small("F1: Toggle HUD | F5: Save | F9: Respawn");
            });
    }
}

/// Everything that exists only once a window is up.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Mine Game")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("minegame_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, size.width, size.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn set_pointer_lock(&mut self, locked: bool) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        let window = &gpu.window;
        if locked {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                tracing::warn!("pointer lock unavailable: {e}");
                return;
            }
        } else if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            tracing::warn!("failed to release pointer: {e}");
        }
        window.set_cursor_visible(!locked);
        self.state.input.set_pointer_locked(locked);
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = now - self.state.last_frame;
        self.state.last_frame = now;
        self.state.update(dt);

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        self.state
            .camera
            .set_viewport(gpu.config.width, gpu.config.height);
        gpu.renderer.sync_scene(&gpu.device, &mut self.state.scene);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer
            .render(&gpu.device, &gpu.queue, &view, &self.state.camera);

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });

        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            // egui only sees events while the pointer is free
            if !self.state.input.pointer_locked() {
                let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::Focused(false) => {
                self.state.input.release_all();
                self.set_pointer_lock(false);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let release = self
                    .state
                    .handle_key(key, key_state == ElementState::Pressed);
                if release {
                    self.set_pointer_lock(false);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                if !self.state.input.pointer_locked() {
                    self.set_pointer_lock(true);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state
                .input
                .add_look_delta(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.state.save_level();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("minegame-desktop starting");

    let config = load_config(cli.config.as_ref(), cli.render_distance)?;
    let store = match LevelStore::open(&cli.data_dir) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!("saving disabled, cannot open {}: {e}", cli.data_dir.display());
            None
        }
    };

    let settings = match (&cli.load, &store) {
        (Some(name), Some(store)) => match store.load(name)? {
            Some(record) => record.settings(),
            None => anyhow::bail!("no saved level named '{name}'"),
        },
        (Some(_), None) => anyhow::bail!("cannot load a level without a save directory"),
        (None, _) => SessionSettings::from_input(&cli.name, &cli.seed),
    };

    let state = AppState::new(settings, config, store)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_map_to_actions() {
        assert_eq!(action_for(KeyCode::KeyW), Some(Action::MoveForward));
        assert_eq!(action_for(KeyCode::KeyA), Some(Action::StrafeLeft));
        assert_eq!(action_for(KeyCode::Space), Some(Action::Jump));
        assert_eq!(action_for(KeyCode::ShiftRight), Some(Action::Sprint));
        assert_eq!(action_for(KeyCode::F5), None);
    }

    #[test]
    fn render_distance_flag_overrides_config() {
        let config = load_config(None, Some(2)).unwrap();
        assert_eq!(config.stream.render_distance, 2);
        assert_eq!(load_config(None, None).unwrap(), SessionConfig::default());
    }

    #[test]
    fn escape_releases_pointer() {
        let settings = SessionSettings::from_input("Test", "3");
        let config = load_config(None, Some(0)).unwrap();
        let mut state = AppState::new(settings, config, None).unwrap();

        assert!(state.handle_key(KeyCode::Escape, true));
        assert!(!state.handle_key(KeyCode::KeyW, true));
        assert!(state.input.is_held(Action::MoveForward));
        assert!(!state.handle_key(KeyCode::KeyW, false));
        assert!(!state.input.is_held(Action::MoveForward));
    }

    #[test]
    fn save_without_store_reports_status() {
        let settings = SessionSettings::from_input("Test", "3");
        let mut state = AppState::new(settings, load_config(None, Some(0)).unwrap(), None).unwrap();
        state.save_level();
        assert_eq!(state.status.as_deref(), Some("No save directory"));
    }

    #[test]
    fn failed_autosave_leaves_hud_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LevelStore::open(tmp.path()).unwrap();
        let settings = SessionSettings::from_input("Test", "3");
        let mut state = AppState::new(settings, load_config(None, Some(0)).unwrap(), Some(store)).unwrap();
        std::fs::remove_dir_all(tmp.path().join("levels")).unwrap();

        state.update(Duration::from_secs(31));
        assert!(state.status.is_none());
    }
}
