//! Cell-level orchestration: running both builders for a cell and scheduling
//! builds across the scene.

pub mod pipeline;
pub mod queue;

pub use pipeline::{BuildContext, CellPipeline};
pub use queue::{BuildOutcome, BuildRequest, CellBuildQueue};
