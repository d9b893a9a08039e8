use std::hint::black_box;
use std::time::Instant;

use dunes_assets::{ModelCache, ProceduralSource};
use dunes_scene::RecordingScene;
use dunes_stream::{
    ChunkContentBuilder, ChunkCoord, ChunkStreamer, FieldSampler, PoolSizes, PropConfig,
    StreamConfig,
};
use glam::Vec3;

fn warmed(config: StreamConfig) -> (ChunkStreamer, ModelCache, RecordingScene) {
    let mut streamer = ChunkStreamer::new(config).expect("valid config");
    let mut assets = ModelCache::new(ProceduralSource::new());
    let mut scene = RecordingScene::new();
    streamer.advance(Vec3::ZERO, &mut assets, &mut scene);
    assets.pump();
    streamer.advance(Vec3::ZERO, &mut assets, &mut scene);
    (streamer, assets, scene)
}

fn bench_specs(iterations: usize) {
    let builder = ChunkContentBuilder::new(50.0, PropConfig::default(), FieldSampler::default());
    let sizes = PoolSizes::from(&PropConfig::default());

    let start = Instant::now();
    for i in 0..iterations {
        let coord = ChunkCoord::new(i as i32 % 97, i as i32 / 97);
        let _ = black_box(builder.specs(black_box(coord), sizes));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  chunk specs ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_flight(render_distance: i32, steps: usize) {
    let config = StreamConfig {
        render_distance,
        ..StreamConfig::default()
    };
    let (mut streamer, mut assets, mut scene) = warmed(config);

    let start = Instant::now();
    for i in 0..steps {
        // Straight flight at airplane speed, crossing a chunk every 100 steps.
        let player = Vec3::new(i as f32 * 0.5, 20.0, 0.0);
        let _ = black_box(streamer.advance(black_box(player), &mut assets, &mut scene));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / steps as u32;
    println!(
        "  flight (r={render_distance}, {steps} steps, {} created): {per_iter:?}/step, total {elapsed:?}",
        streamer.stats().chunks_created_total
    );
}

fn bench_teleport(render_distance: i32, jumps: usize) {
    let config = StreamConfig {
        render_distance,
        ..StreamConfig::default()
    };
    let (mut streamer, mut assets, mut scene) = warmed(config);

    let start = Instant::now();
    for i in 0..jumps {
        let player = Vec3::new((i % 2) as f32 * 10_000.0, 20.0, 0.0);
        let _ = black_box(streamer.advance(black_box(player), &mut assets, &mut scene));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / jumps as u32;
    println!(
        "  teleport (r={render_distance}, {jumps} jumps, leaked {}): {per_iter:?}/jump, total {elapsed:?}",
        scene.leaked()
    );
}

fn main() {
    println!("=== Stream Advance Benchmarks ===\n");

    println!("Chunk specs:");
    bench_specs(10_000);

    println!("\nFlight (one advance per frame):");
    bench_flight(1, 10_000);
    bench_flight(2, 10_000);
    bench_flight(4, 10_000);

    println!("\nTeleport (full window rebuild):");
    bench_teleport(1, 100);
    bench_teleport(2, 100);
    bench_teleport(4, 20);

    println!("\n=== Done ===");
}
