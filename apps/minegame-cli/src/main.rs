use std::path::PathBuf;

use clap::{Parser, Subcommand};
use minegame_common::{BlockCategory, ChunkCoord, SessionSettings, sanitize_seed};
use minegame_input::{Action, InputState};
use minegame_kernel::{Session, SessionConfig};
use minegame_persist::{LevelRecord, LevelStore};
use minegame_render::{DebugTextRenderer, MaterialLibrary, RenderView, Renderer, Scene};
use minegame_stream::StreamConfig;
use minegame_terrain::{ChunkBuilder, TerrainModel};
use minegame_tools::SessionInspector;
use tracing_subscriber::EnvFilter;

/// Simulated frame length for headless walks.
const WALK_DT: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(name = "minegame-cli", about = "CLI tool for minegame worlds and saved levels")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the terrain height of one column
    Height {
        /// Seed: an integer or any text
        #[arg(short, long, default_value = "1337")]
        seed: String,
        #[arg(short, allow_negative_numbers = true)]
        x: i32,
        #[arg(short, allow_negative_numbers = true)]
        z: i32,
    },
    /// Build one chunk and print its block counts
    Chunk {
        #[arg(short, long, default_value = "1337")]
        seed: String,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        cx: i32,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        cz: i32,
    },
    /// Walk forward headlessly and report where the viewer ends up
    Walk {
        #[arg(short, long, default_value = "1337")]
        seed: String,
        /// Number of 60 Hz ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Hold sprint while walking
        #[arg(long)]
        sprint: bool,
        /// Chunks kept resident around the viewer
        #[arg(long, default_value = "2")]
        render_distance: i32,
        /// Print per-chunk scene detail at the end
        #[arg(long)]
        scene: bool,
    },
    /// Save a level record
    Save {
        #[arg(short, long, default_value = "")]
        name: String,
        #[arg(short, long, default_value = "")]
        seed: String,
        #[arg(long, default_value = "./minegame_data")]
        data_dir: PathBuf,
    },
    /// List saved levels, newest first
    Levels {
        #[arg(long, default_value = "./minegame_data")]
        data_dir: PathBuf,
    },
    /// Delete a saved level
    Delete {
        name: String,
        #[arg(long, default_value = "./minegame_data")]
        data_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("minegame-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("stream: {}", minegame_stream::crate_info());
            println!("render: {}", minegame_render::crate_info());
            let materials = MaterialLibrary::new();
            for material in materials.iter() {
                println!(
                    "  {:<8} base={:?} accent={:?}",
                    material.name(),
                    material.base,
                    material.accent
                );
            }
        }
        Commands::Height { seed, x, z } => {
            let seed = sanitize_seed(&seed);
            let terrain = TerrainModel::new(seed);
            let h = terrain.height(x, z);
            println!("seed={seed} column=({x}, {z}) height={h}");
            if let Some(tree) = terrain.tree_at(x, z, h) {
                println!("tree: trunk height {}", tree.trunk_height);
            }
        }
        Commands::Chunk { seed, cx, cz } => {
            let seed = sanitize_seed(&seed);
            let coord = ChunkCoord::new(cx, cz);
            let chunk = ChunkBuilder::new(seed).build(coord);
            println!("seed={seed} chunk=[{coord}] blocks={}", chunk.blocks.len());
            for category in BlockCategory::ALL {
                println!("  {:<8} {}", category.name(), chunk.blocks.of(category).len());
            }
        }
        Commands::Walk {
            seed,
            ticks,
            sprint,
            render_distance,
            scene: show_scene,
        } => {
            let settings = SessionSettings::from_input("Walk", &seed);
            let config = SessionConfig {
                stream: StreamConfig { render_distance },
                ..Default::default()
            };
            let mut scene = Scene::new(MaterialLibrary::new());
            let mut session = Session::start(settings, config, &mut scene)?;
            let mut input = InputState::new();
            input.press(Action::MoveForward);
            if sprint {
                input.press(Action::Sprint);
            }

            println!("Walking {ticks} ticks from {}", SessionInspector::summary(&session));
            let mut crossings = 0usize;
            for _ in 0..ticks {
                let report = session.tick(WALK_DT, &mut input, &mut scene)?;
                if let Some(update) = report.stream {
                    crossings += 1;
                    tracing::debug!(
                        tick = report.tick,
                        center = ?update.center,
                        loaded = update.loaded.len(),
                        unloaded = update.unloaded.len(),
                        "crossed chunk boundary"
                    );
                }
                scene.drain_changes();
            }

            let summary = SessionInspector::summary(&session);
            println!("{summary}");
            println!("{}", summary.details());
            println!("chunk crossings: {crossings}");

            let viewer = session.viewer();
            let view = RenderView::from_viewer(viewer.position, viewer.yaw, viewer.pitch);
            let renderer = if show_scene {
                DebugTextRenderer::verbose()
            } else {
                DebugTextRenderer::new()
            };
            print!("{}", renderer.render(&scene, &view));
        }
        Commands::Save {
            name,
            seed,
            data_dir,
        } => {
            let store = LevelStore::open(&data_dir)?;
            let settings = SessionSettings::from_input(&name, &seed);
            let record = LevelRecord::now(settings.name, settings.seed);
            store.save(&record)?;
            println!(
                "Saved '{}' seed={} key={}",
                record.name,
                record.seed,
                LevelStore::key_for(&record.name)
            );
        }
        Commands::Levels { data_dir } => {
            let store = LevelStore::open(&data_dir)?;
            let levels = store.list()?;
            if levels.is_empty() {
                println!("No saved levels in {}", data_dir.display());
            }
            for level in levels {
                println!("{:<24} seed={:<12} savedAt={}", level.name, level.seed, level.saved_at);
            }
        }
        Commands::Delete { name, data_dir } => {
            let store = LevelStore::open(&data_dir)?;
            if store.delete(&name)? {
                println!("Deleted '{name}'");
            } else {
                println!("No saved level named '{name}'");
            }
        }
    }

    Ok(())
}
