//! CPU-side mesh data produced by the builders.
//!
//! `Vertex` is laid out for direct upload; `MeshData` is what a `RenderSink`
//! receives. `PropMesh` is a catalog template that gets transformed and appended
//! into combined prop meshes.

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};
use serde::Deserialize;

/// Interleaved vertex (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
        }
    }
}

/// Indexed triangle mesh tagged with the layer (material) it renders with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub layer: u32,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(layer: u32) -> Self {
        Self { layer, vertices: Vec::new(), indices: Vec::new() }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw vertex bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Append `source` transformed by scale, rotation about +Y, then translation.
    pub fn append_transformed(
        &mut self,
        source: &PropMesh,
        translation: Vec3,
        rotation_y: f32,
        scale: f32,
    ) {
        let base = self.vertices.len() as u32;
        let rotation = Quat::from_rotation_y(rotation_y);

        for (i, p) in source.positions.iter().enumerate() {
            let position = rotation * (Vec3::from_array(*p) * scale) + translation;
            let normal = source
                .normals
                .get(i)
                .map_or(Vec3::Y, |n| rotation * Vec3::from_array(*n));
            let uv = source.uvs.get(i).copied().unwrap_or([0.0, 0.0]);
            self.vertices.push(Vertex::new(position, normal, uv));
        }
        self.indices.extend(source.indices.iter().map(|i| base + i));
    }
}

/// Prop geometry template from the catalog (trees excluded; those are instanced).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PropMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl PropMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Axis-aligned box resting on y = 0 (8 shared-corner vertices).
    pub fn unit_box(name: impl Into<String>, half_width: f32, height: f32) -> Self {
        let w = half_width;
        let positions = vec![
            [-w, 0.0, -w], [w, 0.0, -w], [w, 0.0, w], [-w, 0.0, w],
            [-w, height, -w], [w, height, -w], [w, height, w], [-w, height, w],
        ];
        let normals = positions
            .iter()
            .map(|p| Vec3::new(p[0], p[1] - height * 0.5, p[2]).normalize_or_zero().to_array())
            .collect();
        let span = (2.0 * w).max(f32::EPSILON);
        let uvs = positions.iter().map(|p| [(p[0] + w) / span, p[1]]).collect();
        let indices = vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4,
            1, 2, 6, 1, 6, 5,
            2, 3, 7, 2, 7, 6,
            3, 0, 4, 3, 4, 7,
        ];
        Self { name: name.into(), positions, normals, uvs, indices }
    }

    /// Two crossed vertical quads, the usual cheap shrub/reed card (8 vertices).
    pub fn crossed_quads(name: impl Into<String>, half_width: f32, height: f32) -> Self {
        let w = half_width;
        let positions = vec![
            [-w, 0.0, 0.0], [w, 0.0, 0.0], [w, height, 0.0], [-w, height, 0.0],
            [0.0, 0.0, -w], [0.0, 0.0, w], [0.0, height, w], [0.0, height, -w],
        ];
        let normals = vec![
            [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0],
        ];
        let uvs = vec![
            [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
            [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        ];
        let indices = vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7];
        Self { name: name.into(), positions, normals, uvs, indices }
    }
}
