//! Scene-wide tile grid: elevation, water, canal overlay and vegetation codes.
//!
//! All per-tile arrays are flat and row-major over the whole scene. The grid is
//! shared read-only between builders for the duration of a build, so out-of-scene
//! queries never fail: every accessor takes the value to return past the bounds.

use crate::catalog::VegetationCode;
use crate::core::{Error, Result};

/// Integer coordinate of a tile in scene space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Integer coordinate identifying a cell in the cell grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Scene-space tile at the minimum corner of this cell
    pub fn tile_origin(self, cell_size: u32) -> TileCoord {
        TileCoord::new(self.x * cell_size as i32, self.y * cell_size as i32)
    }

    /// Cell containing the given tile
    pub fn from_tile(tile: TileCoord, cell_size: u32) -> Self {
        let size = cell_size as i32;
        Self::new(tile.x.div_euclid(size), tile.y.div_euclid(size))
    }
}

/// Per-tile simulation data for the whole scene.
#[derive(Clone, Debug)]
pub struct SceneGrid {
    width: u32,
    height: u32,
    /// World height of a full-range (65535) elevation or water sample
    vertical_scale: f32,
    elevation: Vec<u16>,
    water: Vec<u16>,
    canals: Vec<u8>,
    vegetation: Vec<u32>,
}

impl SceneGrid {
    /// Create a flat, dry scene with no canals and vegetation code 0 everywhere.
    pub fn new(width: u32, height: u32, vertical_scale: f32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            vertical_scale,
            elevation: vec![0; len],
            water: vec![0; len],
            canals: vec![0; len],
            vegetation: vec![0; len],
        }
    }

    /// Wrap existing scene arrays, checking that each covers `width * height` tiles.
    pub fn from_arrays(
        width: u32,
        height: u32,
        vertical_scale: f32,
        elevation: Vec<u16>,
        water: Vec<u16>,
        canals: Vec<u8>,
        vegetation: Vec<u32>,
    ) -> Result<Self> {
        let len = width as usize * height as usize;
        let lengths = [
            ("elevation", elevation.len()),
            ("water", water.len()),
            ("canals", canals.len()),
            ("vegetation", vegetation.len()),
        ];
        for (name, actual) in lengths {
            if actual != len {
                return Err(Error::DataShape(format!(
                    "{} array has {} samples, scene {}x{} needs {}",
                    name, actual, width, height, len
                )));
            }
        }
        if !(vertical_scale.is_finite() && vertical_scale > 0.0) {
            return Err(Error::DataShape(format!("invalid vertical scale {}", vertical_scale)));
        }

        Ok(Self { width, height, vertical_scale, elevation, water, canals, vegetation })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn vertical_scale(&self) -> f32 {
        self.vertical_scale
    }

    /// Number of cells needed to cover the scene along each axis.
    pub fn cell_span(&self, cell_size: u32) -> (u32, u32) {
        (self.width.div_ceil(cell_size), self.height.div_ceil(cell_size))
    }

    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.x >= 0 && tile.y >= 0 && (tile.x as u32) < self.width && (tile.y as u32) < self.height
    }

    /// Row-major index of a tile, `None` outside the scene.
    pub fn linear_index(&self, tile: TileCoord) -> Option<usize> {
        if self.contains(tile) {
            Some(tile.y as usize * self.width as usize + tile.x as usize)
        } else {
            None
        }
    }

    fn to_height(&self, raw: u16) -> f32 {
        f32::from(raw) * (self.vertical_scale / f32::from(u16::MAX))
    }

    /// Ground elevation in world units, or `default` outside the scene.
    pub fn elevation_or(&self, tile: TileCoord, default: f32) -> f32 {
        self.linear_index(tile)
            .map_or(default, |i| self.to_height(self.elevation[i]))
    }

    /// Water level in world units, or `default` outside the scene.
    pub fn water_or(&self, tile: TileCoord, default: f32) -> f32 {
        self.linear_index(tile)
            .map_or(default, |i| self.to_height(self.water[i]))
    }

    /// Canal overlay value (0 = none, 1 = shallow, >=3 = deep), or `default` outside the scene.
    pub fn canal_or(&self, tile: TileCoord, default: u8) -> u8 {
        self.linear_index(tile).map_or(default, |i| self.canals[i])
    }

    pub fn vegetation_at(&self, tile: TileCoord) -> Option<VegetationCode> {
        self.linear_index(tile).map(|i| VegetationCode(self.vegetation[i]))
    }

    // --- Mutation (only between builds; builders see the grid through Arc) ---

    pub fn set_elevation(&mut self, tile: TileCoord, raw: u16) {
        if let Some(i) = self.linear_index(tile) {
            self.elevation[i] = raw;
        }
    }

    pub fn set_water(&mut self, tile: TileCoord, raw: u16) {
        if let Some(i) = self.linear_index(tile) {
            self.water[i] = raw;
        }
    }

    pub fn set_canal(&mut self, tile: TileCoord, value: u8) {
        if let Some(i) = self.linear_index(tile) {
            self.canals[i] = value;
        }
    }

    pub fn set_vegetation(&mut self, tile: TileCoord, code: VegetationCode) {
        if let Some(i) = self.linear_index(tile) {
            self.vegetation[i] = code.0;
        }
    }

    /// Fill every tile's elevation and water sample with the same raw values.
    pub fn fill(&mut self, elevation: u16, water: u16) {
        self.elevation.fill(elevation);
        self.water.fill(water);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_origin_roundtrip() {
        let cell = CellCoord::new(2, 3);
        let origin = cell.tile_origin(16);
        assert_eq!(origin, TileCoord::new(32, 48));
        assert_eq!(CellCoord::from_tile(origin.offset(15, 15), 16), cell);
        assert_eq!(CellCoord::from_tile(TileCoord::new(-1, 0), 16), CellCoord::new(-1, 0));
    }

    #[test]
    fn test_out_of_bounds_returns_default() {
        let grid = SceneGrid::new(4, 4, 65535.0);
        assert_eq!(grid.elevation_or(TileCoord::new(-1, 0), 7.0), 7.0);
        assert_eq!(grid.water_or(TileCoord::new(4, 0), -3.0), -3.0);
        assert_eq!(grid.canal_or(TileCoord::new(0, 9), 2), 2);
        assert!(grid.vegetation_at(TileCoord::new(0, 4)).is_none());
    }

    #[test]
    fn test_vertical_scale_conversion() {
        let mut grid = SceneGrid::new(2, 2, 65535.0);
        grid.set_elevation(TileCoord::new(1, 1), 10);
        assert_eq!(grid.elevation_or(TileCoord::new(1, 1), 0.0), 10.0);

        let mut half = SceneGrid::new(1, 1, 100.0);
        half.set_water(TileCoord::new(0, 0), u16::MAX);
        assert!((half.water_or(TileCoord::new(0, 0), 0.0) - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_from_arrays_rejects_bad_lengths() {
        let err = SceneGrid::from_arrays(2, 2, 1.0, vec![0; 4], vec![0; 3], vec![0; 4], vec![0; 4]);
        assert!(matches!(err, Err(Error::DataShape(_))));

        let ok = SceneGrid::from_arrays(2, 2, 1.0, vec![0; 4], vec![0; 4], vec![0; 4], vec![0; 4]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_cell_span_rounds_up() {
        let grid = SceneGrid::new(33, 16, 1.0);
        assert_eq!(grid.cell_span(16), (3, 1));
    }
}
