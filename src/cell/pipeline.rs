//! One cell's full build: height field phase, then tile content phase.

use std::sync::Arc;

use crate::catalog::VegetationCatalog;
use crate::content::{ContentInputs, ContentOutput, ExternalProp, TileContentBuilder};
use crate::core::{Error, Result};
use crate::job::CellJob;
use crate::render::RenderSink;
use crate::scene::{CellCoord, PipelineConfig, SceneGrid};
use crate::terrain::{FinishedHeights, HeightFieldBuilder};

/// Shared read-only inputs for every build.
#[derive(Clone)]
pub struct BuildContext {
    pub scene: Arc<SceneGrid>,
    pub catalog: Arc<VegetationCatalog>,
    pub config: Arc<PipelineConfig>,
}

impl BuildContext {
    pub fn new(scene: SceneGrid, catalog: VegetationCatalog, config: PipelineConfig) -> Self {
        Self { scene: Arc::new(scene), catalog: Arc::new(catalog), config: Arc::new(config) }
    }

    /// Every cell touching the scene, row-major.
    pub fn cells(&self) -> Vec<CellCoord> {
        let (cw, ch) = self.scene.cell_span(self.config.cell_size);
        (0..ch as i32)
            .flat_map(|y| (0..cw as i32).map(move |x| CellCoord::new(x, y)))
            .collect()
    }
}

enum Phase {
    Ready,
    Heights(HeightFieldBuilder),
    Content(TileContentBuilder),
    Done(ContentOutput),
    Failed,
}

/// Drives both builders for one cell back to back.
///
/// The content phase starts as soon as the height phase reports done, using its
/// finished grids. A pipeline created with [`CellPipeline::with_heights`] skips
/// straight to the content phase.
pub struct CellPipeline {
    cell: CellCoord,
    ctx: BuildContext,
    external_props: Arc<[ExternalProp]>,
    heights: Option<Arc<FinishedHeights>>,
    phase: Phase,
}

impl CellPipeline {
    pub fn new(ctx: BuildContext, cell: CellCoord, external_props: Vec<ExternalProp>) -> Self {
        Self {
            cell,
            ctx,
            external_props: external_props.into(),
            heights: None,
            phase: Phase::Ready,
        }
    }

    /// Content-only rebuild on top of grids from an earlier build of this cell.
    pub fn with_heights(
        ctx: BuildContext,
        cell: CellCoord,
        heights: Arc<FinishedHeights>,
        external_props: Vec<ExternalProp>,
    ) -> Self {
        Self { heights: Some(heights), ..Self::new(ctx, cell, external_props) }
    }

    /// Finished grids, available once the height phase is done.
    pub fn heights(&self) -> Option<&Arc<FinishedHeights>> {
        self.heights.as_ref()
    }

    pub fn content(&self) -> Option<&ContentOutput> {
        match &self.phase {
            Phase::Done(output) => Some(output),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done(_))
    }

    fn start_content(&self, heights: Arc<FinishedHeights>) -> Result<TileContentBuilder> {
        let inputs = ContentInputs {
            scene: Arc::clone(&self.ctx.scene),
            catalog: Arc::clone(&self.ctx.catalog),
            heights,
            external_props: Arc::clone(&self.external_props),
            config: Arc::clone(&self.ctx.config),
        };
        let mut builder = TileContentBuilder::new(inputs, self.cell);
        builder.start()?;
        Ok(builder)
    }
}

impl CellJob for CellPipeline {
    fn cell(&self) -> CellCoord {
        self.cell
    }

    fn start(&mut self) -> Result<()> {
        if !matches!(self.phase, Phase::Ready) {
            return Err(Error::Job("job already started"));
        }
        self.phase = Phase::Failed;
        self.phase = match self.heights.clone() {
            Some(heights) => Phase::Content(self.start_content(heights)?),
            None => {
                let mut builder = HeightFieldBuilder::new(
                    Arc::clone(&self.ctx.scene),
                    self.cell,
                    Arc::clone(&self.ctx.config),
                );
                builder.start()?;
                Phase::Heights(builder)
            }
        };
        Ok(())
    }

    fn poll(&mut self, sink: &mut dyn RenderSink) -> Result<bool> {
        // Anything that returns early with `?` leaves the pipeline Failed
        match std::mem::replace(&mut self.phase, Phase::Failed) {
            Phase::Ready => {
                self.phase = Phase::Ready;
                Err(Error::Job("job polled before start"))
            }
            Phase::Heights(mut builder) => {
                if !builder.poll(sink)? {
                    self.phase = Phase::Heights(builder);
                    return Ok(false);
                }
                let heights = builder
                    .finished_heights()
                    .ok_or(Error::Job("height phase finished without output"))?;
                self.heights = Some(Arc::clone(&heights));
                self.phase = Phase::Content(self.start_content(heights)?);
                Ok(false)
            }
            Phase::Content(mut builder) => {
                if !builder.poll(sink)? {
                    self.phase = Phase::Content(builder);
                    return Ok(false);
                }
                let output = builder
                    .into_output()
                    .ok_or(Error::Job("content phase finished without output"))?;
                self.phase = Phase::Done(output);
                Ok(true)
            }
            Phase::Done(output) => {
                self.phase = Phase::Done(output);
                Ok(true)
            }
            Phase::Failed => Err(Error::JobFailed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VegetationCode;
    use crate::job::drive;
    use crate::render::{MeshKind, RecordingSink, SinkCall};
    use crate::scene::TileCoord;

    fn context(multithreaded: bool) -> BuildContext {
        let mut scene = SceneGrid::new(8, 8, 65535.0);
        scene.fill(10, 10);
        scene.set_canal(TileCoord::new(2, 1), 1);
        for x in 0..8 {
            scene.set_vegetation(TileCoord::new(x, 5), VegetationCode::pack(2, 0, 0));
            scene.set_vegetation(TileCoord::new(x, 6), VegetationCode::pack(3, 0, 0));
        }
        let config = PipelineConfig { cell_size: 4, multithreaded, ..Default::default() };
        BuildContext::new(scene, VegetationCatalog::default(), config)
    }

    #[test]
    fn test_cells_cover_scene() {
        let cells = context(false).cells();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[1], CellCoord::new(1, 0));
    }

    #[test]
    fn test_heights_then_content() {
        let cell = CellCoord::new(0, 1);
        let mut pipeline = CellPipeline::new(context(false), cell, Vec::new());
        let mut sink = RecordingSink::new();
        pipeline.start().unwrap();
        drive(&mut pipeline, &mut sink).unwrap();

        assert!(matches!(sink.calls[0], SinkCall::Heightfield { .. }));
        let first_content = sink
            .calls
            .iter()
            .position(|c| matches!(c, SinkCall::BlendWeights { .. }))
            .unwrap();
        assert!(sink.calls[..first_content].iter().all(|c| matches!(
            c,
            SinkCall::Heightfield { .. } | SinkCall::Mesh { kind: MeshKind::Water, .. }
        )));
        assert!(pipeline.heights().is_some());
        assert!(!pipeline.content().unwrap().trees.is_empty());
    }

    #[test]
    fn test_background_matches_inline() {
        let cell = CellCoord::new(1, 1);
        let mut inline = CellPipeline::new(context(false), cell, Vec::new());
        let mut background = CellPipeline::new(context(true), cell, Vec::new());
        let mut sink_a = RecordingSink::new();
        let mut sink_b = RecordingSink::new();
        inline.start().unwrap();
        background.start().unwrap();
        drive(&mut inline, &mut sink_a).unwrap();
        drive(&mut background, &mut sink_b).unwrap();

        assert_eq!(sink_a.calls, sink_b.calls);
        assert_eq!(inline.content().unwrap().trees, background.content().unwrap().trees);
    }

    #[test]
    fn test_content_only_rebuild_skips_heights() {
        let ctx = context(false);
        let cell = CellCoord::new(0, 1);
        let mut full = CellPipeline::new(ctx.clone(), cell, Vec::new());
        full.start().unwrap();
        drive(&mut full, &mut RecordingSink::new()).unwrap();

        let heights = Arc::clone(full.heights().unwrap());
        let mut rebuild = CellPipeline::with_heights(ctx, cell, heights, Vec::new());
        let mut sink = RecordingSink::new();
        rebuild.start().unwrap();
        drive(&mut rebuild, &mut sink).unwrap();

        assert!(!sink.calls.iter().any(|c| matches!(c, SinkCall::Heightfield { .. })));
        assert_eq!(rebuild.content().unwrap().trees, full.content().unwrap().trees);
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut pipeline = CellPipeline::new(context(false), CellCoord::new(4, 4), Vec::new());
        let mut sink = RecordingSink::new();
        assert!(matches!(pipeline.poll(&mut sink), Err(Error::Job(_))));
        pipeline.start().unwrap();
        assert!(matches!(pipeline.start(), Err(Error::Job(_))));
        assert!(matches!(pipeline.poll(&mut sink), Err(Error::DataShape(_))));
        assert!(matches!(pipeline.poll(&mut sink), Err(Error::JobFailed)));
    }
}
