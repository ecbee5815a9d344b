//! Build every cell of a synthetic scene and report what the pipeline produced.
//!
//! Usage: cargo run --release --bin build_cell -- [--size 128] [--seed 42]
//!        [--config pipeline.json] [--catalog catalog.json] [--inline]

use std::time::Instant;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use cellforge::catalog::{VegetationCatalog, VegetationCode};
use cellforge::cell::{BuildContext, BuildOutcome, CellBuildQueue};
use cellforge::core::Result;
use cellforge::render::RecordingSink;
use cellforge::scene::{PipelineConfig, SceneGrid, TileCoord};

const SEA_LEVEL: u16 = 14_000;

fn arg<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Rolling terrain with a sea, one canal across the middle and vegetation by altitude.
fn synthesize_scene(size: u32, seed: u32) -> SceneGrid {
    let elevation_noise = Fbm::<Perlin>::new(seed)
        .set_octaves(5)
        .set_persistence(0.5)
        .set_lacunarity(2.0);
    let moisture_noise = Fbm::<Perlin>::new(seed.wrapping_add(1000))
        .set_octaves(3)
        .set_persistence(0.5)
        .set_lacunarity(2.0);

    let mut scene = SceneGrid::new(size, size, 200.0);
    let canal_row = (size / 2) as i32;

    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let tile = TileCoord::new(x, y);
            let p = [x as f64 * 0.03, y as f64 * 0.03];
            let n = (elevation_noise.get(p) * 0.5 + 0.5).clamp(0.0, 1.0);
            let elevation = (n * 40_000.0) as u16;
            scene.set_elevation(tile, elevation);
            scene.set_water(tile, SEA_LEVEL);

            if y == canal_row && elevation > SEA_LEVEL {
                scene.set_canal(tile, if x % 8 == 0 { 3 } else { 1 });
            }

            let wet = moisture_noise.get(p) > 0.0;
            let code = if elevation <= SEA_LEVEL + 500 {
                VegetationCode::pack(3, 0, 0)
            } else if elevation < 20_000 {
                VegetationCode::pack(1, 0, ((x + y) % 2) as u8)
            } else if elevation < 30_000 {
                VegetationCode::pack(2, if wet { 0 } else { 1 }, 0)
            } else {
                VegetationCode::pack(0, 0, ((x * y) % 2) as u8)
            };
            scene.set_vegetation(tile, code);
        }
    }
    scene
}

fn main() -> Result<()> {
    cellforge::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let size = arg(&args, "--size").and_then(|s| s.parse().ok()).unwrap_or(128u32);
    let seed = arg(&args, "--seed").and_then(|s| s.parse().ok()).unwrap_or(42u32);

    let mut config = match arg(&args, "--config") {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if args.iter().any(|a| a == "--inline") {
        config.multithreaded = false;
    }
    let catalog = match arg(&args, "--catalog") {
        Some(path) => VegetationCatalog::load(path)?,
        None => VegetationCatalog::default(),
    };

    log::info!(
        "Catalog: {} successions, {} decals",
        catalog.succession_count(), catalog.decal_count()
    );
    log::info!("Synthesizing {}x{} scene (seed {})", size, size, seed);
    let scene = synthesize_scene(size, seed);

    let max_concurrent = rayon::current_num_threads().max(1);
    let mut queue = CellBuildQueue::new(BuildContext::new(scene, catalog, config), max_concurrent);
    let mut sink = RecordingSink::new();

    let requested = queue.request_all();
    log::info!("Building {} cells, {} at a time", requested, max_concurrent);

    let start = Instant::now();
    let mut completed = 0usize;
    let mut failed = 0usize;
    let mut polls = 0usize;
    while !queue.is_idle() {
        polls += 1;
        for outcome in queue.poll_all(&mut sink) {
            match outcome {
                BuildOutcome::Completed(_) => completed += 1,
                BuildOutcome::Failed(cell, e) => {
                    log::error!("Cell ({}, {}) failed: {}", cell.x, cell.y, e);
                    sink.discard(cell);
                    failed += 1;
                }
            }
        }
        std::thread::yield_now();
    }
    let elapsed = start.elapsed();

    let trees: usize = sink.trees.values().map(Vec::len).sum();
    let density: u32 = sink.density_layers.values().flatten().map(|l| l.total()).sum();
    let meshes: usize = sink.meshes.values().map(Vec::len).sum();

    log::info!(
        "Built {} cells ({} failed) in {:.2}s over {} polls",
        completed, failed, elapsed.as_secs_f64(), polls
    );
    log::info!(
        "{} meshes, {} vertices ({:.1} MiB), {} trees, {} ground-cover instances",
        meshes,
        sink.total_vertices(),
        sink.uploaded_bytes as f64 / (1024.0 * 1024.0),
        trees,
        density
    );

    Ok(())
}
