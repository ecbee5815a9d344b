//! Stencil accumulator: sparse tile sets to quad meshes.
//!
//! Used for water surfaces and decals. Each tile becomes one quad whose corners
//! take their height from the supplied grid. Output is split into several meshes
//! whenever the next quad would exceed the per-mesh vertex cap.

use std::collections::BTreeSet;

use glam::Vec3;

use super::data::{MeshData, Vertex};
use crate::terrain::HeightGrid;

/// Cell-local tile position inside a stencil set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StencilTile {
    // y first so the derived ordering is row-major
    pub y: u32,
    pub x: u32,
}

impl StencilTile {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

const QUAD_VERTICES: usize = 4;

/// Builds stencil meshes under a fixed per-mesh vertex cap.
#[derive(Clone, Copy, Debug)]
pub struct StencilAccumulator {
    vertex_cap: usize,
}

impl StencilAccumulator {
    pub fn new(vertex_cap: usize) -> Self {
        Self { vertex_cap: vertex_cap.max(QUAD_VERTICES) }
    }

    /// Emit meshes covering exactly `tiles` (duplicates collapse), tagged with `layer`.
    ///
    /// Tiles outside the grid are skipped. Output order is row-major, so the
    /// result depends on nothing but the arguments.
    pub fn build(&self, layer: u32, tiles: &[StencilTile], heights: &HeightGrid) -> Vec<MeshData> {
        let max_tile = ((heights.side() - 1) / 4) as u32;
        let ordered: BTreeSet<StencilTile> = tiles
            .iter()
            .copied()
            .filter(|t| t.x < max_tile && t.y < max_tile)
            .collect();

        let mut meshes = Vec::new();
        let mut current = MeshData::new(layer);

        for tile in ordered {
            if current.vertex_count() + QUAD_VERTICES > self.vertex_cap {
                meshes.push(std::mem::replace(&mut current, MeshData::new(layer)));
            }
            push_quad(&mut current, tile, heights);
        }

        if !current.is_empty() {
            meshes.push(current);
        }
        meshes
    }
}

fn push_quad(mesh: &mut MeshData, tile: StencilTile, heights: &HeightGrid) {
    let base = mesh.vertices.len() as u32;
    let corners = [(0, 0), (1, 0), (1, 1), (0, 1)];

    for (dx, dy) in corners {
        let tx = tile.x + dx;
        let ty = tile.y + dy;
        let position = Vec3::new(tx as f32, heights.tile_corner(tx, ty), ty as f32);
        mesh.vertices.push(Vertex::new(position, Vec3::Y, [dx as f32, dy as f32]));
    }
    // Counter-clockwise seen from +Y
    mesh.indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(tiles_per_side: usize, height: f32) -> HeightGrid {
        HeightGrid::new(tiles_per_side * 4 + 1, height)
    }

    #[test]
    fn test_one_quad_per_tile() {
        let acc = StencilAccumulator::new(1000);
        let tiles = [StencilTile::new(0, 0), StencilTile::new(1, 0), StencilTile::new(1, 0)];
        let meshes = acc.build(7, &tiles, &flat(4, 2.0));

        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].layer, 7);
        assert_eq!(meshes[0].vertex_count(), 8);
        assert_eq!(meshes[0].triangle_count(), 4);
        assert!(meshes[0].vertices.iter().all(|v| v.position[1] == 2.0));
    }

    #[test]
    fn test_splits_at_vertex_cap() {
        // Cap of 10 fits two quads per mesh
        let acc = StencilAccumulator::new(10);
        let tiles: Vec<_> = (0..5).map(|x| StencilTile::new(x, 0)).collect();
        let meshes = acc.build(0, &tiles, &flat(8, 0.0));

        assert_eq!(meshes.len(), 3);
        assert!(meshes.iter().all(|m| m.vertex_count() <= 10));
        assert_eq!(meshes.iter().map(|m| m.vertex_count()).sum::<usize>(), 20);
        // Indices stay local to their own mesh
        assert!(meshes[1].indices.iter().all(|&i| i < 8));
    }

    #[test]
    fn test_heights_follow_grid() {
        let mut grid = flat(2, 0.0);
        grid.set(4, 4, 3.0);
        let acc = StencilAccumulator::new(100);
        let meshes = acc.build(0, &[StencilTile::new(0, 0)], &grid);

        let corner = meshes[0].vertices[2].position;
        assert_eq!(corner, [1.0, 3.0, 1.0]);
    }

    #[test]
    fn test_empty_and_out_of_range() {
        let acc = StencilAccumulator::new(100);
        assert!(acc.build(0, &[], &flat(2, 0.0)).is_empty());
        assert!(acc.build(0, &[StencilTile::new(2, 0)], &flat(2, 0.0)).is_empty());
    }

    #[test]
    fn test_deterministic_order() {
        let acc = StencilAccumulator::new(100);
        let grid = flat(4, 1.0);
        let a = acc.build(1, &[StencilTile::new(3, 1), StencilTile::new(0, 2)], &grid);
        let b = acc.build(1, &[StencilTile::new(0, 2), StencilTile::new(3, 1)], &grid);
        assert_eq!(a, b);
    }
}
