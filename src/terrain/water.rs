//! Per-tile water level and visibility.

use crate::mesh::StencilTile;
use crate::scene::{PipelineConfig, SceneGrid, TileCoord};

/// Water level used for a tile's surface.
///
/// Canal water is held at least `canal_water_epsilon` below the uncarved ground,
/// so it never floats above its own trench.
pub fn tile_water_level(scene: &SceneGrid, tile: TileCoord, config: &PipelineConfig) -> f32 {
    let ground = scene.elevation_or(tile, 0.0);
    let water = scene.water_or(tile, 0.0);
    if scene.canal_or(tile, 0) != 0 {
        water.min(ground - config.canal_water_epsilon)
    } else {
        water
    }
}

/// A tile shows water if its level reaches its ground (inclusive) or it is a canal.
pub fn tile_water_visible(scene: &SceneGrid, tile: TileCoord) -> bool {
    if !scene.contains(tile) {
        return false;
    }
    scene.canal_or(tile, 0) != 0 || scene.water_or(tile, 0.0) >= scene.elevation_or(tile, 0.0)
}

/// Grow the visible set by `radius` tiles in every direction, clipped to the cell.
///
/// Visibility is evaluated on the halo as well, so water in a neighboring cell
/// still reaches across the seam.
pub fn dilated_water_tiles(
    scene: &SceneGrid,
    origin: TileCoord,
    cell_size: u32,
    radius: i32,
) -> Vec<StencilTile> {
    let n = cell_size as i32;
    let span = (n + 2 * radius) as usize;
    let mut visible = vec![false; span * span];
    for y in -radius..n + radius {
        for x in -radius..n + radius {
            visible[(y + radius) as usize * span + (x + radius) as usize] =
                tile_water_visible(scene, origin.offset(x, y));
        }
    }

    let mut tiles = Vec::new();
    for y in 0..n {
        for x in 0..n {
            let hit = (-radius..=radius).any(|dy| {
                (-radius..=radius).any(|dx| {
                    let vx = (x + dx + radius) as usize;
                    let vy = (y + dy + radius) as usize;
                    visible[vy * span + vx]
                })
            });
            if hit && scene.contains(origin.offset(x, y)) {
                tiles.push(StencilTile::new(x as u32, y as u32));
            }
        }
    }
    tiles
}
