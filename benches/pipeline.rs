use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, black_box};

use cellforge::catalog::{VegetationCatalog, VegetationCode};
use cellforge::content::{build_tile_content, ContentInputs};
use cellforge::scene::{CellCoord, PipelineConfig, SceneGrid, TileCoord};
use cellforge::terrain::build_height_field;

fn test_scene(size: u32) -> SceneGrid {
    let mut scene = SceneGrid::new(size, size, 200.0);
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let tile = TileCoord::new(x, y);
            let h = ((x * 7919 + y * 104729) % 40_000) as u16;
            scene.set_elevation(tile, h);
            scene.set_water(tile, 15_000);
            scene.set_vegetation(tile, VegetationCode::pack((x % 4) as u8, 0, 0));
            if y == 20 {
                scene.set_canal(tile, 1);
            }
        }
    }
    scene
}

fn bench_height_field_16(c: &mut Criterion) {
    let scene = test_scene(64);
    let config = PipelineConfig { cell_size: 16, ..Default::default() };
    let cell = CellCoord::new(1, 1);

    c.bench_function("height_field_16", |b| {
        b.iter(|| build_height_field(black_box(&scene), cell, &config))
    });
}

fn bench_tile_content_16(c: &mut Criterion) {
    let scene = test_scene(64);
    let config = PipelineConfig { cell_size: 16, ..Default::default() };
    let cell = CellCoord::new(1, 1);
    let Ok(heights) = build_height_field(&scene, cell, &config) else { return };

    let inputs = ContentInputs {
        scene: Arc::new(scene),
        catalog: Arc::new(VegetationCatalog::default()),
        heights: heights.heights,
        external_props: Arc::from(Vec::new()),
        config: Arc::new(config),
    };

    c.bench_function("tile_content_16", |b| {
        b.iter(|| build_tile_content(black_box(&inputs), cell))
    });
}

criterion_group!(benches, bench_height_field_16, bench_tile_content_16);
criterion_main!(benches);
