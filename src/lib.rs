//! Cellforge - terrain cell build pipeline
//!
//! Turns scene-wide tile data into per-cell render content: a dense ground and
//! water height field with carved canals, water surfaces, blend weights, tree
//! instances, ground-cover density, batched props and decals.

pub mod core;
pub mod scene;
pub mod catalog;
pub mod job;
pub mod mesh;
pub mod render;
pub mod terrain;
pub mod content;
pub mod cell;
