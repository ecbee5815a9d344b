//! Rendering-side collaborators: the sink interface builders apply their output to

pub mod recording;
pub mod sink;

pub use recording::{RecordingSink, SinkCall};
pub use sink::{MeshKind, RenderSink};
