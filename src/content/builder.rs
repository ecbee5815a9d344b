//! Tile content builder: vegetation, ground cover, props and decals for one cell.
//!
//! Runs after the height field phase and reads its finished grids. Every tile
//! draws from its own seeded stream, in a fixed order (trees, density, props),
//! so the output depends only on the inputs.

use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Instant;

use glam::{Vec2, Vec3};

use super::batch::batch_props;
use super::placement::{DensityLayer, ExternalProp, PropPlacement, TreeInstance};
use super::rng::TileRng;
use crate::catalog::{HeightSource, VegetationCatalog};
use crate::core::{Error, Result};
use crate::job::{Apply, CellJob, Job, WorkerMode};
use crate::mesh::{MeshData, StencilAccumulator, StencilTile};
use crate::render::{MeshKind, RenderSink};
use crate::scene::{CellCoord, PipelineConfig, SceneGrid};
use crate::terrain::{FinishedHeights, HeightGrid};

/// Jittered positions stay this far inside their tile.
const TILE_INSET: f32 = 0.01;

/// Blend weights for tiles past the scene edge: all remainder channel.
const EMPTY_WEIGHTS: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Everything the compute phase produces for one cell.
#[derive(Clone, Debug, Default)]
pub struct ContentOutput {
    pub cell: CellCoord,
    /// Per-tile blend weights, row-major
    pub blend_weights: Vec<[f32; 4]>,
    pub trees: Vec<TreeInstance>,
    /// Only layers with a nonzero count somewhere in the cell
    pub density_layers: Vec<DensityLayer>,
    pub prop_meshes: Vec<MeshData>,
    pub decal_meshes: Vec<MeshData>,
}

impl Apply for ContentOutput {
    fn step_count(&self) -> usize {
        3 + self.prop_meshes.len() + self.decal_meshes.len()
    }

    fn apply_step(&self, step: usize, sink: &mut dyn RenderSink) -> Result<()> {
        let props = self.prop_meshes.len();
        match step {
            0 => sink.set_blend_weights(self.cell, &self.blend_weights),
            1 => sink.set_tree_instances(self.cell, &self.trees),
            2 => sink.set_density_layers(self.cell, &self.density_layers),
            n if n - 3 < props => {
                sink.create_mesh(self.cell, MeshKind::Props, &self.prop_meshes[n - 3])
            }
            n => sink.create_mesh(self.cell, MeshKind::Decal, &self.decal_meshes[n - 3 - props]),
        }
    }
}

/// Inputs to the content phase, all shared read-only with the caller.
#[derive(Clone)]
pub struct ContentInputs {
    pub scene: Arc<SceneGrid>,
    pub catalog: Arc<VegetationCatalog>,
    pub heights: Arc<FinishedHeights>,
    pub external_props: Arc<[ExternalProp]>,
    pub config: Arc<PipelineConfig>,
}

/// Random position within `jitter` tiles of `center`, kept inside the tile.
fn jittered(rng: &mut TileRng, center: Vec2, jitter: f32) -> Vec2 {
    if jitter <= 0.0 {
        return center;
    }
    let angle = rng.next_f32() * TAU;
    let radius = rng.next_f32() * jitter;
    let pos = center + Vec2::new(angle.cos(), angle.sin()) * radius;

    let lo = center - Vec2::splat(0.5 - TILE_INSET);
    let hi = center + Vec2::splat(0.5 - TILE_INSET);
    pos.clamp(lo, hi)
}

fn grid_for(heights: &FinishedHeights, source: HeightSource) -> &HeightGrid {
    match source {
        HeightSource::Ground => &heights.ground,
        HeightSource::Water => &heights.water,
    }
}

/// Compute one cell's content. Pure function of its inputs.
pub fn build_tile_content(inputs: &ContentInputs, cell: CellCoord) -> Result<ContentOutput> {
    let started = Instant::now();
    let ContentInputs { scene, catalog, heights, external_props, config } = inputs;
    let n = config.cell_size;
    let origin = cell.tile_origin(n);

    if heights.ground.side() != config.dense_side() || heights.water.side() != config.dense_side() {
        return Err(Error::DataShape(format!(
            "height grids are {}/{} samples per side, cell size {} needs {}",
            heights.ground.side(), heights.water.side(), n, config.dense_side()
        )));
    }

    let tile_count = (n * n) as usize;
    let mut blend_weights = Vec::with_capacity(tile_count);
    let mut trees = Vec::new();
    let mut layers: BTreeMap<u32, Vec<u16>> = BTreeMap::new();
    let mut groups: BTreeMap<u32, Vec<PropPlacement>> = BTreeMap::new();
    let mut decal_sets: BTreeMap<u32, Vec<StencilTile>> = BTreeMap::new();

    for ly in 0..n {
        for lx in 0..n {
            let tile = origin.offset(lx as i32, ly as i32);
            let found = (scene.linear_index(tile), scene.vegetation_at(tile));
            let (Some(index), Some(code)) = found else {
                blend_weights.push(EMPTY_WEIGHTS);
                continue;
            };
            let entry = catalog.entry(code)?;
            let tile_slot = (ly * n + lx) as usize;
            let center = Vec2::new(lx as f32 + 0.5, ly as f32 + 0.5);
            let mut rng = TileRng::for_tile(index, config.seed_multiplier);

            blend_weights.push(entry.blend_weights());

            for template in &entry.trees {
                let pos = jittered(&mut rng, center, template.jitter);
                let height = heights.ground.sample(pos);
                let scale = rng.range(template.scale_range[0], template.scale_range[1]);
                let width = rng.range(template.width_range[0], template.width_range[1]);
                let tint = rng.next_f32();
                let color = Vec3::from_array(template.color_a)
                    .lerp(Vec3::from_array(template.color_b), tint);
                trees.push(TreeInstance {
                    position: [pos.x, height, pos.y],
                    scale,
                    color: color.to_array(),
                    width,
                    template_id: template.template_id,
                    _pad: [0; 3],
                });
            }

            for detail in &entry.details {
                let count = rng.range_u16(detail.count_range[0], detail.count_range[1]);
                if count == 0 {
                    continue;
                }
                let counts = layers.entry(detail.layer).or_insert_with(|| vec![0; tile_count]);
                counts[tile_slot] = counts[tile_slot].saturating_add(count);
            }

            for template in &entry.props {
                let pos = jittered(&mut rng, center, template.jitter);
                let rotation = if template.random_rotation { rng.next_f32() * TAU } else { 0.0 };
                let scale = rng.range(template.scale_range[0], template.scale_range[1]);
                let y = template.anchor.map_or(0.0, |source| grid_for(heights, source).sample(pos));
                groups.entry(template.material).or_default().push(PropPlacement {
                    mesh: template.mesh,
                    position: Vec3::new(pos.x, y, pos.y),
                    rotation,
                    scale,
                });
            }

            for &decal in &entry.decals {
                decal_sets.entry(decal).or_default().push(StencilTile::new(lx, ly));
            }
        }
    }

    for external in external_props.iter() {
        groups.entry(external.material).or_default().push(external.placement);
    }

    let mut prop_meshes = Vec::new();
    for (material, placements) in &groups {
        let budget = config.batch_vertex_budget;
        prop_meshes.extend(batch_props(*material, placements, catalog, budget)?);
    }

    let density_layers: Vec<DensityLayer> = layers
        .into_iter()
        .map(|(layer, counts)| DensityLayer { layer, counts })
        .filter(|layer| !layer.is_empty())
        .collect();

    let stencil = StencilAccumulator::new(config.mesh_vertex_cap);
    let mut decal_meshes = Vec::new();
    for (decal, tiles) in &decal_sets {
        let template = catalog.decal(*decal)?;
        let grid = grid_for(heights, template.height_source);
        decal_meshes.extend(stencil.build(template.material, tiles, grid));
    }

    log::debug!(
        "Tile content ({}, {}): {} trees, {} density layers, {} prop meshes ({} materials), \
         {} decal meshes, {:.2}ms",
        cell.x, cell.y, trees.len(), density_layers.len(), prop_meshes.len(), groups.len(),
        decal_meshes.len(), started.elapsed().as_secs_f64() * 1000.0
    );

    Ok(ContentOutput { cell, blend_weights, trees, density_layers, prop_meshes, decal_meshes })
}

/// Job wrapper around [`build_tile_content`].
pub struct TileContentBuilder {
    cell: CellCoord,
    job: Job<ContentOutput>,
}

impl TileContentBuilder {
    pub fn new(inputs: ContentInputs, cell: CellCoord) -> Self {
        let mode = WorkerMode::from_flag(inputs.config.multithreaded);
        let ops_per_poll = inputs.config.ops_per_poll;
        let job = Job::new(
            format!("tile content ({}, {})", cell.x, cell.y),
            mode,
            ops_per_poll,
            move || build_tile_content(&inputs, cell),
        );
        Self { cell, job }
    }

    pub fn output(&self) -> Option<&ContentOutput> {
        self.job.output()
    }

    pub fn into_output(self) -> Option<ContentOutput> {
        self.job.into_output()
    }
}

impl CellJob for TileContentBuilder {
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
