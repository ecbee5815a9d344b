//! Cell build queue with per-cell exclusivity and bounded concurrency.
//!
//! A cell has at most one pipeline in flight. Requesting a cell that is already
//! building parks the request until the running build retires, then restarts it.
//! Failed builds are reported once and dropped.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use super::pipeline::{BuildContext, CellPipeline};
use crate::content::{ContentOutput, ExternalProp};
use crate::core::Error;
use crate::job::CellJob;
use crate::render::RenderSink;
use crate::scene::CellCoord;
use crate::terrain::FinishedHeights;

/// A pending build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub cell: CellCoord,
    pub external_props: Vec<ExternalProp>,
    /// Reuse the last finished grids for this cell if there are any
    pub content_only: bool,
}

/// Result of a retired pipeline
#[derive(Debug)]
pub enum BuildOutcome {
    Completed(CellCoord),
    Failed(CellCoord, Error),
}

impl BuildOutcome {
    pub fn cell(&self) -> CellCoord {
        match self {
            Self::Completed(cell) | Self::Failed(cell, _) => *cell,
        }
    }
}

/// Schedules cell pipelines and polls them against one sink.
pub struct CellBuildQueue {
    ctx: BuildContext,
    max_concurrent: usize,
    queued: VecDeque<BuildRequest>,
    active: BTreeMap<CellCoord, CellPipeline>,
    /// Requests that arrived while their cell was in flight
    deferred: HashMap<CellCoord, BuildRequest>,
    heights: HashMap<CellCoord, Arc<FinishedHeights>>,
    content: HashMap<CellCoord, ContentOutput>,
}

impl CellBuildQueue {
    pub fn new(ctx: BuildContext, max_concurrent: usize) -> Self {
        Self {
            ctx,
            max_concurrent: max_concurrent.max(1),
            queued: VecDeque::new(),
            active: BTreeMap::new(),
            deferred: HashMap::new(),
            heights: HashMap::new(),
            content: HashMap::new(),
        }
    }

    /// Queue a full build of `cell`.
    ///
    /// Returns `false` if the request was merged into one already waiting or
    /// deferred behind a build in flight.
    pub fn request(&mut self, cell: CellCoord, external_props: Vec<ExternalProp>) -> bool {
        self.push(BuildRequest { cell, external_props, content_only: false })
    }

    /// Queue a content-only rebuild of `cell` on its last finished grids.
    pub fn request_content(&mut self, cell: CellCoord, external_props: Vec<ExternalProp>) -> bool {
        self.push(BuildRequest { cell, external_props, content_only: true })
    }

    /// Queue a full build of every cell in the scene.
    pub fn request_all(&mut self) -> usize {
        self.ctx.cells().into_iter().filter(|&cell| self.request(cell, Vec::new())).count()
    }

    fn push(&mut self, request: BuildRequest) -> bool {
        let cell = request.cell;
        if self.active.contains_key(&cell) {
            log::debug!("Cell ({}, {}) in flight, deferring rebuild", cell.x, cell.y);
            let merged = match self.deferred.remove(&cell) {
                Some(prev) => merge(prev, request),
                None => request,
            };
            self.deferred.insert(cell, merged);
            return false;
        }
        if let Some(pos) = self.queued.iter().position(|r| r.cell == cell) {
            if let Some(prev) = self.queued.remove(pos) {
                self.queued.insert(pos, merge(prev, request));
            }
            return false;
        }
        self.queued.push_back(request);
        true
    }

    /// Start waiting builds up to the concurrency limit, then poll everything in
    /// flight once. Returns the builds that retired during this call.
    pub fn poll_all(&mut self, sink: &mut dyn RenderSink) -> Vec<BuildOutcome> {
        let mut outcomes = Vec::new();

        while self.active.len() < self.max_concurrent {
            let Some(request) = self.queued.pop_front() else { break };
            let cell = request.cell;
            let mut pipeline = self.pipeline_for(request);
            match pipeline.start() {
                Ok(()) => {
                    self.active.insert(cell, pipeline);
                }
                Err(e) => {
                    log::warn!("Cell ({}, {}) failed to start: {}", cell.x, cell.y, e);
                    outcomes.push(BuildOutcome::Failed(cell, e));
                }
            }
        }

        let mut retired = Vec::new();
        for (&cell, pipeline) in self.active.iter_mut() {
            match pipeline.poll(sink) {
                Ok(false) => {}
                Ok(true) => retired.push((cell, None)),
                Err(e) => retired.push((cell, Some(e))),
            }
        }

        for (cell, error) in retired {
            let Some(pipeline) = self.active.remove(&cell) else { continue };
            match error {
                None => {
                    if let Some(heights) = pipeline.heights() {
                        self.heights.insert(cell, Arc::clone(heights));
                    }
                    if let Some(content) = pipeline.content() {
                        self.content.insert(cell, content.clone());
                    }
                    log::debug!("Cell ({}, {}) built", cell.x, cell.y);
                    outcomes.push(BuildOutcome::Completed(cell));
                }
                Some(e) => {
                    log::warn!("Cell ({}, {}) build failed: {}", cell.x, cell.y, e);
                    outcomes.push(BuildOutcome::Failed(cell, e));
                }
            }
            if let Some(request) = self.deferred.remove(&cell) {
                self.queued.push_front(request);
            }
        }

        outcomes
    }

    fn pipeline_for(&self, request: BuildRequest) -> CellPipeline {
        let ctx = self.ctx.clone();
        match self.heights.get(&request.cell) {
            Some(heights) if request.content_only => CellPipeline::with_heights(
                ctx,
                request.cell,
                Arc::clone(heights),
                request.external_props,
            ),
            _ => CellPipeline::new(ctx, request.cell, request.external_props),
        }
    }

    /// Latest finished grids for `cell`.
    pub fn heights(&self, cell: CellCoord) -> Option<&Arc<FinishedHeights>> {
        self.heights.get(&cell)
    }

    /// Latest finished content for `cell`.
    pub fn content(&self, cell: CellCoord) -> Option<&ContentOutput> {
        self.content.get(&cell)
    }

    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    pub fn waiting(&self) -> usize {
        self.queued.len() + self.deferred.len()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty() && self.queued.is_empty() && self.deferred.is_empty()
    }
}

/// Later request wins; a full build is never downgraded to content-only.
fn merge(prev: BuildRequest, next: BuildRequest) -> BuildRequest {
    BuildRequest { content_only: prev.content_only && next.content_only, ..next }
}
