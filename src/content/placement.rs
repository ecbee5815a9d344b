//! Placement records produced by the tile content builder.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// One instanced tree (48 bytes, upload-ready).
///
/// Positions are cell-local: x/z in tiles, y in world height.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TreeInstance {
    pub position: [f32; 3],
    pub scale: f32,
    pub color: [f32; 3],
    pub width: f32,
    pub template_id: u32,
    pub _pad: [u32; 3],
}

/// A prop waiting to be merged into a combined mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropPlacement {
    /// Index into the catalog's prop meshes
    pub mesh: u32,
    pub position: Vec3,
    /// Radians about +Y
    pub rotation: f32,
    pub scale: f32,
}

/// Prop supplied from outside the vegetation catalog (buildings and the like).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExternalProp {
    pub material: u32,
    pub placement: PropPlacement,
}

/// Per-tile ground-cover counts for one layer, row-major over the cell.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityLayer {
    pub layer: u32,
    pub counts: Vec<u16>,
}

impl DensityLayer {
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&c| u32::from(c)).sum()
    }
}
