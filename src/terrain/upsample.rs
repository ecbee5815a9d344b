//! 4x tile-to-sample upsampling with a separable 6-tap kernel.
//!
//! Tile `t` covers samples `4t..4t+3`; its kernel spans `4t-1..4t+4`, centered on
//! the tile. Neighboring kernels overlap by one tap on each side, and the weights
//! at every interior sample add up to exactly 1 (all weights are multiples of 1/16).
//!
//! Tiles are scattered in increasing scene order (row-major), so two cells that
//! share a border sample add the same contributions in the same order and get
//! bit-identical results.

use crate::scene::{SceneGrid, TileCoord};

/// Per-tap weights, centered across the four samples of one tile.
pub const KERNEL: [f32; 6] = [0.25, 0.75, 1.0, 1.0, 0.75, 0.25];

const SUB: i32 = 4;

/// Weighted accumulation of per-tile values into one cell's dense grid.
pub struct Accumulator {
    side: usize,
    sums: Vec<f32>,
    weights: Vec<f32>,
}

impl Accumulator {
    pub fn new(side: usize) -> Self {
        Self {
            side,
            sums: vec![0.0; side * side],
            weights: vec![0.0; side * side],
        }
    }

    /// Spread `value` of cell-local tile `(tx, ty)` over its 6x6 footprint.
    pub fn splat(&mut self, tx: i32, ty: i32, value: f32) {
        let side = self.side as i32;
        for (ky, wy) in KERNEL.iter().enumerate() {
            let sy = ty * SUB - 1 + ky as i32;
            if sy < 0 || sy >= side {
                continue;
            }
            for (kx, wx) in KERNEL.iter().enumerate() {
                let sx = tx * SUB - 1 + kx as i32;
                if sx < 0 || sx >= side {
                    continue;
                }
                let i = sy as usize * self.side + sx as usize;
                let w = wx * wy;
                self.sums[i] += value * w;
                self.weights[i] += w;
            }
        }
    }

    fn normalized(&self, i: usize) -> Option<f32> {
        let w = self.weights[i];
        (w > 0.0).then(|| self.sums[i] / w)
    }

    /// Normalized samples.
    ///
    /// `reach` is the last sample on each axis that a scene tile can reach (see
    /// [`reach`]). Samples past it lie beyond the scene edge and repeat the edge
    /// sample of their row or column, so they depend only on scene position.
    pub fn finish(self, reach: (usize, usize)) -> Vec<f32> {
        let (last_x, last_y) = reach;
        let mut out = Vec::with_capacity(self.side * self.side);
        for sy in 0..self.side {
            for sx in 0..self.side {
                let i = sy * self.side + sx;
                let edge = sy.min(last_y) * self.side + sx.min(last_x);
                out.push(self.normalized(i).or_else(|| self.normalized(edge)).unwrap_or(0.0));
            }
        }
        out
    }
}

/// Last local sample on each axis covered by some scene tile's kernel.
///
/// The final scene tile `w - 1` reaches global sample `4w`; partial cells at the
/// far scene edge have samples beyond that.
pub fn reach(scene: &SceneGrid, origin: TileCoord, side: usize) -> (usize, usize) {
    let axis = |size: u32, start: i32| {
        let last = (size as i64 - start as i64) * SUB as i64;
        last.clamp(0, side as i64 - 1) as usize
    };
    (axis(scene.width(), origin.x), axis(scene.height(), origin.y))
}

/// Cell-local tiles that feed a cell's grid, in scene row-major order.
///
/// That is the cell itself plus a one-tile halo, minus anything past the scene
/// bounds. At an outer scene edge the halo strip is simply absent and the
/// border samples renormalize over the tiles that remain.
pub fn source_tiles(scene: &SceneGrid, origin: TileCoord, cell_size: u32) -> Vec<(i32, i32)> {
    let n = cell_size as i32;
    let mut tiles = Vec::with_capacity(((n + 2) * (n + 2)) as usize);
    for ty in -1..=n {
        for tx in -1..=n {
            if scene.contains(origin.offset(tx, ty)) {
                tiles.push((tx, ty));
            }
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_partition_of_unity() {
        // Every sample of tile 1 collects weight 1 from tiles 0, 1 and 2
        let mut acc = Accumulator::new(13);
        for t in 0..3 {
            acc.splat(t, 1, 1.0);
        }
        for sx in 4..8 {
            let i = 5 * 13 + sx;
            assert_eq!(acc.weights[i], 1.0);
        }
    }

    #[test]
    fn test_uniform_value_is_exact() {
        let mut acc = Accumulator::new(9);
        for ty in -1..=2 {
            for tx in -1..=2 {
                acc.splat(tx, ty, 10.0);
            }
        }
        assert!(acc.finish((8, 8)).iter().all(|&h| h == 10.0));
    }

    #[test]
    fn test_step_is_smoothed() {
        // Tiles 0 and 1 of a one-row strip hold 0 and 8
        let mut acc = Accumulator::new(9);
        for ty in -1..=1 {
            acc.splat(-1, ty, 0.0);
            acc.splat(0, ty, 0.0);
            acc.splat(1, ty, 8.0);
            acc.splat(2, ty, 8.0);
        }
        let samples = acc.finish((8, 8));
        let row: Vec<f32> = samples[9 * 2..9 * 3].to_vec();
        // 0.25 * 8 bleeds into the last sample of tile 0 and 0.25 * 0 into the first of tile 1
        assert_eq!(row[3], 2.0);
        assert_eq!(row[4], 6.0);
        assert_eq!(row[2], 0.0);
        assert_eq!(row[5], 8.0);
    }

    #[test]
    fn test_source_tiles_clip_at_scene_edge() {
        let scene = SceneGrid::new(4, 4, 1.0);
        // Cell (0,0) of size 2: halo only on the right and bottom
        let tiles = source_tiles(&scene, TileCoord::new(0, 0), 2);
        assert_eq!(tiles.len(), 9);
        assert_eq!(tiles[0], (0, 0));

        // Interior-facing on every side for a 2-tile cell at (1,1) in a 4x4 scene
        let tiles = source_tiles(&scene, TileCoord::new(1, 1), 2);
        assert_eq!(tiles.len(), 16);
        assert_eq!(tiles[0], (-1, -1));
    }

    #[test]
    fn test_reach_stops_at_scene_edge() {
        let scene = SceneGrid::new(11, 10, 1.0);
        // 3-tile cells have 13 samples per side
        assert_eq!(reach(&scene, TileCoord::new(0, 0), 13), (12, 12));
        assert_eq!(reach(&scene, TileCoord::new(9, 9), 13), (8, 4));
    }

    #[test]
    fn test_samples_past_reach_repeat_edge() {
        // Single tile at the origin of a 9-sample grid reaches samples 0..=4
        let mut acc = Accumulator::new(9);
        acc.splat(0, 0, 3.0);
        acc.splat(1, 0, 5.0);
        let samples = acc.finish((8, 4));
        for sx in 0..9 {
            assert_eq!(samples[8 * 9 + sx], samples[4 * 9 + sx]);
        }
    }
}
