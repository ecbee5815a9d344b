//! Two-phase cell build jobs.
//!
//! `start()` launches the pure-data compute phase, which only writes buffers it
//! owns. `poll()` is then called once per frame on the owning thread: `false`
//! means call again, `true` means every output has been applied to the sink. An
//! error is fatal; the job never resumes and later polls report `JobFailed`.

pub mod worker;

pub use worker::{Handoff, WorkerMode};

use crate::core::{Error, Result};
use crate::render::RenderSink;
use crate::scene::CellCoord;

/// Contract shared by every cell builder.
pub trait CellJob {
    fn cell(&self) -> CellCoord;

    /// Begin the compute phase. Calling it twice is an error.
    fn start(&mut self) -> Result<()>;

    /// Advance the job by a bounded amount of consumer-side work.
    fn poll(&mut self, sink: &mut dyn RenderSink) -> Result<bool>;
}

/// Finished compute output, applied to a sink one step at a time.
pub trait Apply {
    fn step_count(&self) -> usize;
    fn apply_step(&self, step: usize, sink: &mut dyn RenderSink) -> Result<()>;
}

type Work<T> = Box<dyn FnOnce() -> Result<T> + Send>;

enum JobState<T> {
    Ready(Work<T>),
    Computing(Handoff<T>),
    Applying { output: T, cursor: usize },
    Done(T),
    Failed,
}

/// State machine behind both builders.
pub struct Job<T> {
    label: String,
    mode: WorkerMode,
    ops_per_poll: usize,
    state: JobState<T>,
}

impl<T: Apply + Send + 'static> Job<T> {
    pub fn new<F>(label: impl Into<String>, mode: WorkerMode, ops_per_poll: usize, work: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Self {
            label: label.into(),
            mode,
            ops_per_poll: ops_per_poll.max(1),
            state: JobState::Ready(Box::new(work)),
        }
    }

    pub fn start(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, JobState::Failed) {
            JobState::Ready(work) => {
                log::debug!("{}: starting ({:?})", self.label, self.mode);
                let handoff = Handoff::spawn(self.mode, self.label.clone(), work);
                self.state = JobState::Computing(handoff);
                Ok(())
            }
            other => {
                self.state = other;
                Err(Error::Job("job already started"))
            }
        }
    }

    pub fn poll(&mut self, sink: &mut dyn RenderSink) -> Result<bool> {
        // Anything that returns early with `?` leaves the job Failed
        let (output, mut cursor) = match std::mem::replace(&mut self.state, JobState::Failed) {
            JobState::Ready(work) => {
                self.state = JobState::Ready(work);
                return Err(Error::Job("job polled before start"));
            }
            JobState::Computing(mut handoff) => match handoff.try_take() {
                None => {
                    self.state = JobState::Computing(handoff);
                    return Ok(false);
                }
                Some(outcome) => (outcome?, 0),
            },
            JobState::Applying { output, cursor } => (output, cursor),
            JobState::Done(output) => {
                self.state = JobState::Done(output);
                return Ok(true);
            }
            JobState::Failed => return Err(Error::JobFailed),
        };

        let total = output.step_count();
        let end = (cursor + self.ops_per_poll).min(total);
        while cursor < end {
            output.apply_step(cursor, sink)?;
            cursor += 1;
        }

        if cursor >= total {
            log::debug!("{}: applied {} steps", self.label, total);
            self.state = JobState::Done(output);
            Ok(true)
        } else {
            self.state = JobState::Applying { output, cursor };
            Ok(false)
        }
    }

    /// Output of a fully applied job.
    pub fn output(&self) -> Option<&T> {
        match &self.state {
            JobState::Done(output) => Some(output),
            _ => None,
        }
    }

    pub fn into_output(self) -> Option<T> {
        match self.state {
            JobState::Done(output) => Some(output),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, JobState::Done(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, JobState::Failed)
    }
}

/// Poll a started job until it finishes, returning how many polls it took.
pub fn drive(job: &mut dyn CellJob, sink: &mut dyn RenderSink) -> Result<usize> {
    let mut polls = 0;
    loop {
        polls += 1;
        if job.poll(sink)? {
            return Ok(polls);
        }
        std::thread::yield_now();
    }
}
