//! Dense per-cell height grid.
//!
//! A cell of `n` tiles is sampled at `n * 4 + 1` points per side: four samples per
//! tile plus the shared border sample that also belongs to the next cell. Positions
//! are expressed in cell-local tile units, so tile `(x, y)` spans `[x, x + 1)`.

use glam::Vec2;

use crate::scene::PipelineConfig;

const SUB: f32 = PipelineConfig::SUBDIVISION as f32;

/// Square grid of heights in world units.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
    side: usize,
    samples: Vec<f32>,
}

impl HeightGrid {
    pub fn new(side: usize, fill: f32) -> Self {
        Self { side, samples: vec![fill; side * side] }
    }

    pub(crate) fn from_samples(side: usize, samples: Vec<f32>) -> Self {
        debug_assert_eq!(samples.len(), side * side);
        Self { side, samples }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[inline]
    pub fn get(&self, sx: usize, sy: usize) -> f32 {
        self.samples[sy * self.side + sx]
    }

    #[inline]
    pub fn set(&mut self, sx: usize, sy: usize, value: f32) {
        self.samples[sy * self.side + sx] = value;
    }

    /// Height at the minimum corner of a cell-local tile.
    pub fn tile_corner(&self, tx: u32, ty: u32) -> f32 {
        let sx = ((tx as f32 * SUB) as usize).min(self.side - 1);
        let sy = ((ty as f32 * SUB) as usize).min(self.side - 1);
        self.get(sx, sy)
    }

    /// Bilinear height at a cell-local tile-space position (clamped to the grid).
    pub fn sample(&self, pos: Vec2) -> f32 {
        let max = (self.side - 1) as f32;
        let sx = (pos.x * SUB).clamp(0.0, max);
        let sy = (pos.y * SUB).clamp(0.0, max);

        let x0 = sx.floor() as usize;
        let y0 = sy.floor() as usize;
        let x1 = (x0 + 1).min(self.side - 1);
        let y1 = (y0 + 1).min(self.side - 1);
        let fx = sx - x0 as f32;
        let fy = sy - y0 as f32;

        let a = self.get(x0, y0) + (self.get(x1, y0) - self.get(x0, y0)) * fx;
        let b = self.get(x0, y1) + (self.get(x1, y1) - self.get(x0, y1)) * fx;
        a + (b - a) * fy
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.samples.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
            (lo.min(h), hi.max(h))
        })
    }
}

/// The two finished grids for a cell, shared with later builds through `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct FinishedHeights {
    pub ground: HeightGrid,
    pub water: HeightGrid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(side: usize) -> HeightGrid {
        let mut grid = HeightGrid::new(side, 0.0);
        for sy in 0..side {
            for sx in 0..side {
                grid.set(sx, sy, sx as f32);
            }
        }
        grid
    }

    #[test]
    fn test_sample_at_grid_points() {
        let grid = ramp(9);
        assert_eq!(grid.sample(Vec2::new(1.0, 0.5)), 4.0);
        assert_eq!(grid.tile_corner(2, 0), 8.0);
    }

    #[test]
    fn test_sample_interpolates() {
        let grid = ramp(9);
        // 0.375 tiles = 1.5 samples
        assert!((grid.sample(Vec2::new(0.375, 1.0)) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_sample_clamps_outside() {
        let grid = ramp(9);
        assert_eq!(grid.sample(Vec2::new(-3.0, 0.0)), 0.0);
        assert_eq!(grid.sample(Vec2::new(10.0, 10.0)), 8.0);
    }

    #[test]
    fn test_min_max() {
        let grid = ramp(5);
        assert_eq!(grid.min_max(), (0.0, 4.0));
    }
}
