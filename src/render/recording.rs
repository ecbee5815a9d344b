//! Headless sink that records every call.

use std::collections::HashMap;

use super::sink::{MeshKind, RenderSink};
use crate::content::{DensityLayer, TreeInstance};
use crate::core::Result;
use crate::mesh::MeshData;
use crate::scene::CellCoord;
use crate::terrain::HeightGrid;

/// One recorded sink call.
#[derive(Clone, Debug, PartialEq)]
pub enum SinkCall {
    Heightfield { cell: CellCoord, side: usize },
    Mesh { cell: CellCoord, kind: MeshKind, layer: u32, vertices: usize },
    BlendWeights { cell: CellCoord, tiles: usize },
    Trees { cell: CellCoord, count: usize },
    DensityLayers { cell: CellCoord, layers: usize },
}

/// Keeps the last applied state per cell and a log of every call.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    pub heightfields: HashMap<CellCoord, HeightGrid>,
    pub meshes: HashMap<CellCoord, Vec<(MeshKind, MeshData)>>,
    pub blend_weights: HashMap<CellCoord, Vec<[f32; 4]>>,
    pub trees: HashMap<CellCoord, Vec<TreeInstance>>,
    pub density_layers: HashMap<CellCoord, Vec<DensityLayer>>,
    /// Vertex buffer bytes handed over by `create_mesh`
    pub uploaded_bytes: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meshes_of(&self, cell: CellCoord, kind: MeshKind) -> Vec<&MeshData> {
        self.meshes
            .get(&cell)
            .map(|m| m.iter().filter(|(k, _)| *k == kind).map(|(_, mesh)| mesh).collect())
            .unwrap_or_default()
    }

    pub fn total_vertices(&self) -> usize {
        self.meshes.values().flatten().map(|(_, m)| m.vertex_count()).sum()
    }

    /// Drop everything recorded for a cell (the caller discarding a failed build).
    pub fn discard(&mut self, cell: CellCoord) {
        self.heightfields.remove(&cell);
        self.meshes.remove(&cell);
        self.blend_weights.remove(&cell);
        self.trees.remove(&cell);
        self.density_layers.remove(&cell);
    }
}

impl RenderSink for RecordingSink {
    fn upload_heightfield(&mut self, cell: CellCoord, heights: &HeightGrid) -> Result<()> {
        self.calls.push(SinkCall::Heightfield { cell, side: heights.side() });
        self.heightfields.insert(cell, heights.clone());
        Ok(())
    }

    fn create_mesh(&mut self, cell: CellCoord, kind: MeshKind, mesh: &MeshData) -> Result<()> {
        self.calls.push(SinkCall::Mesh {
            cell,
            kind,
            layer: mesh.layer,
            vertices: mesh.vertex_count(),
        });
        self.uploaded_bytes += mesh.vertex_bytes().len();
        self.meshes.entry(cell).or_default().push((kind, mesh.clone()));
        Ok(())
    }

    fn set_blend_weights(&mut self, cell: CellCoord, weights: &[[f32; 4]]) -> Result<()> {
        self.calls.push(SinkCall::BlendWeights { cell, tiles: weights.len() });
        self.blend_weights.insert(cell, weights.to_vec());
        Ok(())
    }

    fn set_tree_instances(&mut self, cell: CellCoord, trees: &[TreeInstance]) -> Result<()> {
        self.calls.push(SinkCall::Trees { cell, count: trees.len() });
        self.trees.insert(cell, trees.to_vec());
        Ok(())
    }

    fn set_density_layers(&mut self, cell: CellCoord, layers: &[DensityLayer]) -> Result<()> {
        self.calls.push(SinkCall::DensityLayers { cell, layers: layers.len() });
        self.density_layers.insert(cell, layers.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_and_discards() {
        let mut sink = RecordingSink::new();
        let cell = CellCoord::new(1, 0);
        sink.upload_heightfield(cell, &HeightGrid::new(5, 1.0)).unwrap();
        let mut mesh = MeshData::new(2);
        mesh.vertices.push(crate::mesh::Vertex::default());
        sink.create_mesh(cell, MeshKind::Water, &mesh).unwrap();

        assert_eq!(sink.calls.len(), 2);
        assert_eq!(sink.uploaded_bytes, 32);
        assert_eq!(sink.meshes_of(cell, MeshKind::Water).len(), 1);
        assert!(sink.meshes_of(cell, MeshKind::Decal).is_empty());

        sink.discard(cell);
        assert!(sink.heightfields.is_empty());
        assert!(sink.meshes_of(cell, MeshKind::Water).is_empty());
    }
}
