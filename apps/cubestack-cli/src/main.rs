use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cubestack_input::InputEvent;
use cubestack_render::RecordingBackend;
use cubestack_scene::{FrameStats, SceneConfig, StackScene};

#[derive(Parser)]
#[command(name = "cubestack-cli", about = "Headless driver for the block tower scene")]
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
    /// Render frames against the recording backend and report what was drawn
    Run {
        /// Number of frames to render
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Milliseconds between frames
        #[arg(long, default_value = "16.67")]
        frame_ms: f64,
        /// Scene config (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Input event delivered before a frame, as FRAME@EVENT
        /// (e.g. 10@down:Space, 20@drag:15,-4, 30@wheel:1)
        #[arg(short, long = "event", value_parser = parse_scripted_event)]
        events: Vec<(u64, InputEvent)>,
        /// Frame before which pending texture loads complete
        #[arg(long, default_value = "30")]
        complete_loads_at: u64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective scene config as YAML
    Config {
        /// Config file to load instead of the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn parse_scripted_event(text: &str) -> Result<(u64, InputEvent), String> {
    let (frame, event) = text
        .split_once('@')
        .ok_or_else(|| format!("expected FRAME@EVENT, got '{text}'"))?;
    let frame = frame
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("bad frame number '{frame}': {e}"))?;
    let event = event.parse::<InputEvent>().map_err(|e| e.to_string())?;
    Ok((frame, event))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

#[derive(Serialize)]
struct RunReport {
    frames: u64,
    drops: u64,
    blocks: usize,
    avg_frame_ms: f64,
    fps: f64,
    draws: usize,
    skipped: usize,
    uniform_uploads: usize,
    uniform_bytes: usize,
    texture_binds: usize,
    framebuffer_binds: usize,
    type_mismatches: usize,
    last_frame: Option<FrameStats>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("cubestack-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", cubestack_common::crate_info());
            println!("cache: {}", cubestack_cache::crate_info());
            println!("render: {}", cubestack_render::crate_info());
            println!("input: {}", cubestack_input::crate_info());
            println!("animation: {}", cubestack_animation::crate_info());
            println!("scene: {}", cubestack_scene::crate_info());
        }
        Commands::Run {
            frames,
            frame_ms,
            config,
            events,
            complete_loads_at,
            json,
        } => {
            let config = load_config(config.as_ref())?;
            let mut backend = RecordingBackend::new();
            let mut scene = StackScene::setup(&mut backend, config).context("scene setup")?;
            tracing::info!(frames, frame_ms, events = events.len(), "running scene");

            let mut skipped = 0;
            let mut last_frame = None;
            for index in 0..frames {
                if index == complete_loads_at {
                    let completed = backend.complete_all_loads();
                    tracing::info!(frame = index, completed, "pending loads completed");
                }
                for (_, event) in events.iter().filter(|(at, _)| *at == index) {
                    let action = scene.handle(event);
                    tracing::debug!(frame = index, ?event, ?action, "input");
                }

                backend.drain_commands();
                let stats = scene.frame(&mut backend, index as f64 * frame_ms)?;
                skipped += stats.skipped;
                last_frame = Some(stats);
            }

            let totals = backend.stats();
            let timer = scene.frame_timer();
            let report = RunReport {
                frames,
                drops: scene.state().tower.drops(),
                blocks: scene.state().tower.len(),
                avg_frame_ms: timer.average(),
                fps: timer.fps(),
                draws: totals.draws,
                skipped,
                uniform_uploads: totals.uniform_uploads,
                uniform_bytes: totals.uniform_bytes,
                texture_binds: totals.texture_binds,
                framebuffer_binds: totals.framebuffer_binds,
                type_mismatches: totals.type_mismatches,
                last_frame,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Rendered {} frame(s): {} draw(s), {} skipped, {:.1} fps simulated",
                    report.frames, report.draws, report.skipped, report.fps
                );
                println!(
                    "Tower: {} block(s) after {} drop(s)",
                    report.blocks, report.drops
                );
                println!(
                    "Uniforms: {} upload(s), {} byte(s), {} type mismatch(es)",
                    report.uniform_uploads, report.uniform_bytes, report.type_mismatches
                );
                println!("Last frame:");
                print!("{}", backend.summary());
            }
        }
        Commands::Config { config } => {
            let config = load_config(config.as_ref())?;
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
