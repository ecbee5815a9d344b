//! Height field phase of a cell build.
//!
//! Upsamples per-tile elevation and water into dense per-cell grids, carves canal
//! trenches, works out where water shows and meshes the water surface.

pub mod builder;
pub mod canal;
pub mod heightfield;
pub mod upsample;
pub mod water;

pub use builder::{build_height_field, HeightFieldBuilder, HeightFieldOutput, WATER_LAYER};
pub use heightfield::{FinishedHeights, HeightGrid};
