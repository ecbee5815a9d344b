//! Canal trench carving.
//!
//! A canal tile lowers the middle 2x2 of its 4x4 samples. Toward each of its four
//! neighbors that is also a canal, the trench runs out to the tile edge, so
//! adjacent canal tiles join into one channel. Each tile only ever carves its own
//! samples, which keeps the carve additive and applied at most once per sample.

use crate::scene::{PipelineConfig, SceneGrid, TileCoord};

/// 4x4 carve mask of one tile, indexed `[y][x]` in tile-local samples.
pub fn trench_mask(left: bool, right: bool, up: bool, down: bool) -> [[bool; 4]; 4] {
    let mut mask = [[false; 4]; 4];
    let x_lo = if left { 0 } else { 1 };
    let x_hi = if right { 3 } else { 2 };
    let y_lo = if up { 0 } else { 1 };
    let y_hi = if down { 3 } else { 2 };

    for row in mask.iter_mut().take(3).skip(1) {
        for cell in row.iter_mut().take(x_hi + 1).skip(x_lo) {
            *cell = true;
        }
    }
    for row in mask.iter_mut().take(y_hi + 1).skip(y_lo) {
        row[1] = true;
        row[2] = true;
    }
    mask
}

/// Lower `heights` (a dense grid of `side` samples) under every canal tile that
/// feeds this cell, including halo tiles whose samples reach the border row.
pub fn carve(
    heights: &mut [f32],
    side: usize,
    scene: &SceneGrid,
    origin: TileCoord,
    tiles: &[(i32, i32)],
    config: &PipelineConfig,
) -> usize {
    let mut carved = 0;
    for &(tx, ty) in tiles {
        let tile = origin.offset(tx, ty);
        let depth = config.trench_depth_for(scene.canal_or(tile, 0));
        if depth == 0.0 {
            continue;
        }

        let is_canal = |dx, dy| scene.canal_or(tile.offset(dx, dy), 0) != 0;
        let mask = trench_mask(is_canal(-1, 0), is_canal(1, 0), is_canal(0, -1), is_canal(0, 1));

        for (ly, row) in mask.iter().enumerate() {
            let sy = ty * 4 + ly as i32;
            if sy < 0 || sy >= side as i32 {
                continue;
            }
            for (lx, &hit) in row.iter().enumerate() {
                let sx = tx * 4 + lx as i32;
                if !hit || sx < 0 || sx >= side as i32 {
                    continue;
                }
                heights[sy as usize * side + sx as usize] -= depth;
                carved += 1;
            }
        }
    }
    carved
}
