use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dunes_input::{InputState, Key};
use dunes_kernel::{Game, Settings};
use dunes_scene::RecordingScene;
use dunes_stream::Readiness;
use dunes_tools::GameInspector;
use glam::Vec3;
use tracing_subscriber::EnvFilter;

/// Upper bound on ticks spent waiting for templates before giving up.
const WARMUP_TICKS: u64 = 1000;

#[derive(Parser)]
#[command(name = "dunes-cli", about = "Headless desert flight demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SettingsArgs {
    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory of .gltf models (procedural stand-ins when omitted)
    #[arg(long)]
    assets: Option<PathBuf>,
    /// Override the render distance in chunks
    #[arg(long)]
    render_distance: Option<i32>,
    /// Use a finite world of this edge length instead of streaming
    #[arg(long)]
    bounds: Option<f32>,
}

impl SettingsArgs {
    fn load(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(root) = &self.assets {
            settings.assets.root = Some(root.clone());
        }
        if let Some(r) = self.render_distance {
            settings.stream.render_distance = r;
        }
        if self.bounds.is_some() {
            settings.stream.bounds = self.bounds;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Fly for a number of ticks and report streaming and leak statistics
    Fly {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Keys held for the whole flight, e.g. "WA"
        #[arg(short, long, default_value = "")]
        keys: String,
        /// Print the scene graph after the flight
        #[arg(long)]
        dump: bool,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Teleport far away and show the window converging in one advance
    Teleport {
        #[arg(short, default_value = "10000", allow_negative_numbers = true)]
        x: f32,
        #[arg(short, default_value = "10000", allow_negative_numbers = true)]
        z: f32,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Print the effective settings as YAML
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Step until terrain templates settle. Returns the ticks spent.
fn warm_up(game: &mut Game, input: &mut InputState, scene: &mut RecordingScene) -> u64 {
    let mut ticks = 0;
    while game.streamer().readiness() == Readiness::Pending && ticks < WARMUP_TICKS {
        game.step(input, scene);
        ticks += 1;
    }
    ticks
}

fn report_leaks(game: &mut Game, scene: &mut RecordingScene) -> anyhow::Result<()> {
    game.streamer().check_invariants()?;
    println!(
        "Scene: attached={} meshes={} leaked={} double_releases={}",
        scene.attached_count(),
        scene.attached_meshes(),
        scene.leaked(),
        scene.double_releases()
    );
    game.shutdown(scene);
    tracing::info!(
        attached = scene.attached_count(),
        live_geometry = scene.live_geometry(),
        live_material = scene.live_material(),
        leaked = scene.leaked(),
        "run finished"
    );
    println!(
        "After shutdown: attached={} live_geometry={} live_material={}",
        scene.attached_count(),
        scene.live_geometry(),
        scene.live_material()
    );
    if scene.leaked() > 0 || scene.live_geometry() > 0 || scene.live_material() > 0 {
        anyhow::bail!("resources leaked");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("dunes-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", dunes_common::crate_info());
            println!("scene: {}", dunes_scene::crate_info());
            println!("assets: {}", dunes_assets::crate_info());
            println!("stream: {}", dunes_stream::crate_info());
            println!("input: {}", dunes_input::crate_info());
            println!("kernel: {}", dunes_kernel::crate_info());
            println!("tools: {}", dunes_tools::crate_info());
        }
        Commands::Fly {
            ticks,
            keys,
            dump,
            settings,
        } => {
            let mut game = Game::new(settings.load()?)?;
            let mut input = InputState::new();
            let mut scene = RecordingScene::new();
            for c in keys.chars() {
                input.press(Key::try_from(c)?);
            }
            tracing::info!(ticks, keys = %keys, "starting flight");

            let warm = warm_up(&mut game, &mut input, &mut scene);
            println!("Templates settled after {warm} ticks: {:?}", game.streamer().readiness());
            for _ in warm..ticks {
                game.step(&mut input, &mut scene);
            }

            println!("{}", GameInspector::summary(&game));
            if let Some(center) = game.streamer().center() {
                if let Some(info) = GameInspector::inspect_chunk(&game, center) {
                    println!("{info}");
                }
            }
            if dump {
                print!("{}", scene.dump());
            }
            report_leaks(&mut game, &mut scene)?;
        }
        Commands::Teleport { x, z, settings } => {
            let mut game = Game::new(settings.load()?)?;
            let mut input = InputState::new();
            let mut scene = RecordingScene::new();
            warm_up(&mut game, &mut input, &mut scene);
            game.step(&mut input, &mut scene);

            let before = GameInspector::list_chunks(&game);
            println!(
                "Before: {} chunks around {:?}",
                before.len(),
                game.streamer().center()
            );

            tracing::info!(x, z, "teleporting");
            let altitude = game.airplane().position().y;
            let report = game.teleport(Vec3::new(x, altitude, z), &mut scene);
            println!(
                "Teleport to ({x}, {z}): center={} evicted={} created={} released geometry={} material={}",
                report.center,
                report.evicted.len(),
                report.created.len(),
                report.released_geometry,
                report.released_material
            );
            println!("{}", GameInspector::summary(&game));
            report_leaks(&mut game, &mut scene)?;
        }
        Commands::Config { out, settings } => {
            let yaml = settings.load()?.to_yaml()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, yaml)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{yaml}"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fly_arguments() {
        let args = ["dunes-cli", "fly", "--ticks", "30", "--keys", "WA", "--render-distance", "1"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Fly { ticks, keys, settings, .. } => {
                assert_eq!(ticks, 30);
                assert_eq!(keys, "WA");
                assert_eq!(settings.load().unwrap().stream.render_distance, 1);
            }
            _ => panic!("expected fly"),
        }
    }

    #[test]
    fn short_flight_reports_no_leaks() {
        let settings = SettingsArgs {
            config: None,
            assets: None,
            render_distance: Some(1),
            bounds: None,
        };
        let mut game = Game::new(settings.load().unwrap()).unwrap();
        let mut input = InputState::new();
        let mut scene = RecordingScene::new();
        warm_up(&mut game, &mut input, &mut scene);
        assert_eq!(game.streamer().readiness(), Readiness::Ready);
        for _ in 0..20 {
            game.step(&mut input, &mut scene);
        }
        assert!(report_leaks(&mut game, &mut scene).is_ok());
        assert_eq!(scene.attached_count(), 0);
    }
}
