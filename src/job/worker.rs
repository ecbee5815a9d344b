//! Worker-to-consumer handoff.
//!
//! The compute phase of a job runs either inline or on the rayon pool and hands
//! its result back through a single-slot oneshot channel. The slot carries the
//! output or the captured error and can be taken exactly once; the channel's
//! send/receive pair orders every write of the producer before the read.

use std::panic::{self, AssertUnwindSafe};

use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::core::{Error, Result};

/// Where the compute phase runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerMode {
    /// Run on the calling thread during `start()`
    Inline,
    /// Run on the rayon global pool
    Background,
}

impl WorkerMode {
    pub fn from_flag(multithreaded: bool) -> Self {
        if multithreaded {
            Self::Background
        } else {
            Self::Inline
        }
    }
}

/// Receiving end of a running compute phase.
pub struct Handoff<T> {
    label: String,
    rx: oneshot::Receiver<Result<T>>,
}

impl<T: Send + 'static> Handoff<T> {
    /// Start `work` and return the slot its result will arrive in.
    pub fn spawn<F>(mode: WorkerMode, label: impl Into<String>, work: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let label = label.into();
        let task_label = label.clone();

        let task = move || {
            let outcome = run_guarded(&task_label, work);
            // A dropped receiver means the job was discarded
            let _ = tx.send(outcome);
        };

        match mode {
            WorkerMode::Inline => task(),
            WorkerMode::Background => rayon::spawn(task),
        }

        Self { label, rx }
    }

    /// Take the result if the worker has finished; `None` while it is still running.
    pub fn try_take(&mut self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(Error::Build(format!(
                "{}: worker exited without a result",
                self.label
            )))),
        }
    }
}

/// Run the compute phase, converting panics into `Error::Build` and logging failures.
fn run_guarded<T>(label: &str, work: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            log::error!("{}: compute phase failed: {}", label, e);
            Err(e)
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("{}: compute phase panicked: {}", label, message);
            Err(Error::Build(format!("{}: {}", label, message)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait<T: Send + 'static>(handoff: &mut Handoff<T>) -> Result<T> {
        loop {
            if let Some(outcome) = handoff.try_take() {
                return outcome;
            }
            std::thread::yield_now();
        }
    }

    #[test]
    fn test_inline_is_ready_immediately() {
        let mut h = Handoff::spawn(WorkerMode::Inline, "inline", || Ok(41 + 1));
        assert_eq!(h.try_take().unwrap().unwrap(), 42);
    }

    #[test]
    fn test_background_delivers() {
        let mut h = Handoff::spawn(WorkerMode::Background, "bg", || Ok(vec![1u8; 1024]));
        assert_eq!(wait(&mut h).unwrap().len(), 1024);
    }

    #[test]
    fn test_error_is_carried() {
        let mut h: Handoff<()> = Handoff::spawn(WorkerMode::Background, "err", || {
            Err(Error::DataShape("bad".into()))
        });
        assert!(matches!(wait(&mut h), Err(Error::DataShape(_))));
    }

    #[test]
    fn test_panic_becomes_build_error() {
        let mut h: Handoff<u32> = Handoff::spawn(WorkerMode::Inline, "panicky", || panic!("boom"));
        match h.try_take() {
            Some(Err(Error::Build(msg))) => assert!(msg.contains("boom")),
            other => panic!("unexpected outcome: {:?}", other.map(|r| r.is_ok())),
        }
    }

    #[test]
    fn test_slot_taken_once() {
        let mut h = Handoff::spawn(WorkerMode::Inline, "once", || Ok(1));
        assert!(h.try_take().unwrap().is_ok());
        // Receiver is spent; a second take reports the closed slot instead of a value
        assert!(matches!(h.try_take(), Some(Err(Error::Build(_)))));
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(WorkerMode::from_flag(true), WorkerMode::Background);
        assert_eq!(WorkerMode::from_flag(false), WorkerMode::Inline);
    }
}
