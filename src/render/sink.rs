//! Consumer-side interface to the rendering engine.
//!
//! Builders never touch engine resources from the worker. Everything that creates
//! or updates a renderable goes through a `RenderSink`, called only from `poll()`
//! on the owning thread.

use crate::content::{DensityLayer, TreeInstance};
use crate::core::Result;
use crate::mesh::MeshData;
use crate::scene::CellCoord;
use crate::terrain::HeightGrid;

/// What a mesh created under a cell is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Water,
    Decal,
    Props,
}

/// Engine operations performed while applying a finished build.
///
/// Errors are not retried; they abort the build and leave the cell partially
/// updated for the caller to discard.
pub trait RenderSink {
    /// Replace the cell's terrain surface heights in place.
    fn upload_heightfield(&mut self, cell: CellCoord, heights: &HeightGrid) -> Result<()>;

    /// Create a child renderable under the cell.
    fn create_mesh(&mut self, cell: CellCoord, kind: MeshKind, mesh: &MeshData) -> Result<()>;

    /// Per-tile four-channel texture blend weights, row-major.
    fn set_blend_weights(&mut self, cell: CellCoord, weights: &[[f32; 4]]) -> Result<()>;

    fn set_tree_instances(&mut self, cell: CellCoord, trees: &[TreeInstance]) -> Result<()>;

    /// Only layers with at least one nonzero count are passed.
    fn set_density_layers(&mut self, cell: CellCoord, layers: &[DensityLayer]) -> Result<()>;
}
