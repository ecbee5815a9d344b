//! Mesh data and the stencil accumulator shared by both builders

pub mod data;
pub mod stencil;

pub use data::{MeshData, PropMesh, Vertex};
pub use stencil::{StencilAccumulator, StencilTile};
