//! Scene data consumed by the pipeline: the tile grid and pipeline configuration

pub mod config;
pub mod grid;

pub use config::PipelineConfig;
pub use grid::{CellCoord, SceneGrid, TileCoord};
