//! Height field builder: tile samples to one cell's dense ground and water grids.

use std::sync::Arc;
use std::time::Instant;

use super::canal;
use super::heightfield::{FinishedHeights, HeightGrid};
use super::upsample::{self, Accumulator};
use super::water;
use crate::core::{Error, Result};
use crate::job::{Apply, CellJob, Job, WorkerMode};
use crate::mesh::{MeshData, StencilAccumulator, StencilTile};
use crate::render::{MeshKind, RenderSink};
use crate::scene::{CellCoord, PipelineConfig, SceneGrid};

/// Layer id given to water surface meshes.
pub const WATER_LAYER: u32 = 0;

/// Everything the compute phase produces for one cell.
#[derive(Clone, Debug)]
pub struct HeightFieldOutput {
    pub cell: CellCoord,
    pub heights: Arc<FinishedHeights>,
    /// Per-tile surface water level (canal clamp applied), row-major
    pub tile_water: Vec<f32>,
    /// Per-tile visibility before dilation, row-major
    pub water_visible: Vec<bool>,
    /// Tiles that receive water geometry (after dilation)
    pub water_tiles: Vec<StencilTile>,
    pub water_meshes: Vec<MeshData>,
    pub carved_samples: usize,
}

impl Apply for HeightFieldOutput {
    fn step_count(&self) -> usize {
        1 + self.water_meshes.len()
    }

    fn apply_step(&self, step: usize, sink: &mut dyn RenderSink) -> Result<()> {
        match step {
            0 => sink.upload_heightfield(self.cell, &self.heights.ground),
            n => sink.create_mesh(self.cell, MeshKind::Water, &self.water_meshes[n - 1]),
        }
    }
}

/// Compute one cell's grids. Pure function of its inputs.
pub fn build_height_field(
    scene: &SceneGrid,
    cell: CellCoord,
    config: &PipelineConfig,
) -> Result<HeightFieldOutput> {
    let started = Instant::now();
    let n = config.cell_size;
    let side = config.dense_side();
    let origin = cell.tile_origin(n);

    if !scene.contains(origin) {
        return Err(Error::DataShape(format!(
            "cell ({}, {}) starts at tile ({}, {}) outside the {}x{} scene",
            cell.x, cell.y, origin.x, origin.y, scene.width(), scene.height()
        )));
    }

    let sources = upsample::source_tiles(scene, origin, n);
    let mut ground_acc = Accumulator::new(side);
    let mut water_acc = Accumulator::new(side);
    for &(tx, ty) in &sources {
        let tile = origin.offset(tx, ty);
        ground_acc.splat(tx, ty, scene.elevation_or(tile, 0.0));
        water_acc.splat(tx, ty, water::tile_water_level(scene, tile, config));
    }

    let reach = upsample::reach(scene, origin, side);
    let mut ground = ground_acc.finish(reach);
    let water_grid = HeightGrid::from_samples(side, water_acc.finish(reach));
    let carved_samples = canal::carve(&mut ground, side, scene, origin, &sources, config);
    let ground = HeightGrid::from_samples(side, ground);

    let tiles_per_cell = (n * n) as usize;
    let mut tile_water = Vec::with_capacity(tiles_per_cell);
    let mut water_visible = Vec::with_capacity(tiles_per_cell);
    for ty in 0..n as i32 {
        for tx in 0..n as i32 {
            let tile = origin.offset(tx, ty);
            tile_water.push(water::tile_water_level(scene, tile, config));
            water_visible.push(water::tile_water_visible(scene, tile));
        }
    }

    let water_tiles = water::dilated_water_tiles(scene, origin, n, config.water_dilation);
    let water_meshes = StencilAccumulator::new(config.mesh_vertex_cap)
        .build(WATER_LAYER, &water_tiles, &water_grid);

    let (lo, hi) = ground.min_max();
    log::debug!(
        "Height field ({}, {}): {} samples/side, ground {:.2}..{:.2}, {} carved, \
         {} water tiles in {} meshes, {:.2}ms",
        cell.x, cell.y, side, lo, hi, carved_samples, water_tiles.len(), water_meshes.len(),
        started.elapsed().as_secs_f64() * 1000.0
    );

    Ok(HeightFieldOutput {
        cell,
        heights: Arc::new(FinishedHeights { ground, water: water_grid }),
        tile_water,
        water_visible,
        water_tiles,
        water_meshes,
        carved_samples,
    })
}

/// Job wrapper around [`build_height_field`].
pub struct HeightFieldBuilder {
    cell: CellCoord,
    job: Job<HeightFieldOutput>,
}

impl HeightFieldBuilder {
    pub fn new(scene: Arc<SceneGrid>, cell: CellCoord, config: Arc<PipelineConfig>) -> Self {
        let mode = WorkerMode::from_flag(config.multithreaded);
        let ops_per_poll = config.ops_per_poll;
        let job = Job::new(
            format!("height field ({}, {})", cell.x, cell.y),
            mode,
            ops_per_poll,
            move || build_height_field(&scene, cell, &config),
        );
        Self { cell, job }
    }

    /// Output once every step has been applied.
    pub fn output(&self) -> Option<&HeightFieldOutput> {
        self.job.output()
    }

    /// Finished grids, for the tile content builder and later same-cell builds.
    pub fn finished_heights(&self) -> Option<Arc<FinishedHeights>> {
        self.job.output().map(|o| Arc::clone(&o.heights))
    }

    pub fn into_output(self) -> Option<HeightFieldOutput> {
        self.job.into_output()
    }
}

impl CellJob for HeightFieldBuilder {
    fn cell(&self) -> CellCoord {
        self.cell
    }

    fn start(&mut self) -> Result<()> {
        self.job.start()
    }

    fn poll(&mut self, sink: &mut dyn RenderSink) -> Result<bool> {
        self.job.poll(sink)
    }
}
