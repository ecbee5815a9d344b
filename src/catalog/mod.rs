//! Vegetation classification catalog.
//!
//! Maps each tile's packed vegetation code to splat ratios and the tree, prop,
//! ground-cover and decal templates placed by the tile content builder.

pub mod library;
pub mod vegetation;

pub use library::{CatalogDef, SuccessionDef, VariantDef, VegetationCatalog};
pub use vegetation::{
    DecalTemplate, DetailTemplate, HeightSource, PropTemplate, TileEntry, TreeTemplate,
    VegetationCode,
};
