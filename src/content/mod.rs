//! Tile content: blend weights, tree instances, ground-cover density,
//! batched props and decal surfaces for one cell.

pub mod batch;
pub mod builder;
pub mod placement;
pub mod rng;

pub use batch::batch_props;
pub use builder::{build_tile_content, ContentInputs, ContentOutput, TileContentBuilder};
pub use placement::{DensityLayer, ExternalProp, PropPlacement, TreeInstance};
pub use rng::TileRng;
