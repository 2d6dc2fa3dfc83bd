//! Iterative filter runs
//!
//! A run applies the blur `N` times, each pass reading the previous pass's
//! output, and reports every intermediate image. Cancellation is checked
//! before and after each pass, so a cancelled run stops at the next pass
//! boundary and never reports a frame computed after the request.

use crate::{CancelToken, TaskError, TaskResult};
use filterer_core::RasterImage;
use filterer_filter::{AveragingStrategy, blur};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Lifecycle of a background run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created, worker not yet started
    Idle,
    /// Passes in progress
    Running,
    /// All passes done and the completion callback has returned
    Completed,
    /// Stopped early; no completion callback was made
    Cancelled,
}

/// One intermediate result.
#[derive(Debug, Clone)]
pub struct RunProgress {
    /// Image after `iteration` passes
    pub image: RasterImage,
    /// 1-based pass number
    pub iteration: u32,
    /// Total passes requested
    pub total: u32,
}

/// How a blocking run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Every pass finished; holds the final image
    Completed(RasterImage),
    /// Stopped after `completed` reported passes
    Cancelled { completed: u32 },
}

impl RunOutcome {
    /// The final image, if the run completed.
    pub fn into_image(self) -> Option<RasterImage> {
        match self {
            Self::Completed(image) => Some(image),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Applies a blur strategy a fixed number of times.
#[derive(Clone)]
pub struct IterativeFilterRunner {
    strategy: Arc<dyn AveragingStrategy>,
    iterations: NonZeroU32,
}

impl std::fmt::Debug for IterativeFilterRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterativeFilterRunner")
            .field("strategy", &self.strategy.name())
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl IterativeFilterRunner {
    pub fn new(strategy: Arc<dyn AveragingStrategy>, iterations: NonZeroU32) -> Self {
        Self {
            strategy,
            iterations,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }

    pub fn strategy(&self) -> &dyn AveragingStrategy {
        self.strategy.as_ref()
    }

    /// Run all passes on the calling thread.
    ///
    /// `on_progress` is called once per finished pass, in order `1..=N`,
    /// unless cancellation is observed first.
    pub fn run(
        &self,
        source: &RasterImage,
        token: &CancelToken,
        mut on_progress: impl FnMut(RunProgress),
    ) -> RunOutcome {
        let total = self.iterations.get();
        let mut current = source.clone();

        for iteration in 1..=total {
            if token.is_cancelled() {
                return self.cancelled(iteration - 1);
            }
            current = blur(&current, self.strategy.as_ref());
            if token.is_cancelled() {
                return self.cancelled(iteration - 1);
            }
            log::debug!("{} pass {}/{}", self.strategy.name(), iteration, total);
            on_progress(RunProgress {
                image: current.clone(),
                iteration,
                total,
            });
        }

        if token.is_cancelled() {
            return self.cancelled(total);
        }
        log::info!("{} run of {} passes completed", self.strategy.name(), total);
        RunOutcome::Completed(current)
    }

    fn cancelled(&self, completed: u32) -> RunOutcome {
        log::debug!(
            "{} run cancelled after {}/{} passes",
            self.strategy.name(),
            completed,
            self.iterations
        );
        RunOutcome::Cancelled { completed }
    }

    /// Run all passes on a new background thread.
    ///
    /// Returns immediately. `on_complete` is called exactly once with the
    /// final image if the run is not cancelled, and never otherwise.
    pub fn start<P, C>(
        &self,
        source: RasterImage,
        on_progress: P,
        on_complete: C,
    ) -> TaskResult<FilterRun>
    where
        P: FnMut(RunProgress) + Send + 'static,
        C: FnOnce(RasterImage) + Send + 'static,
    {
        let token = CancelToken::new();
        let state = Arc::new(Mutex::new(RunState::Idle));

        let runner = self.clone();
        let worker_token = token.clone();
        let worker_state = Arc::clone(&state);
        let handle = thread::Builder::new()
            .name(format!("filter-run-{}", self.strategy.name()))
            .spawn(move || {
                set_state(&worker_state, RunState::Running);
                let final_state = match runner.run(&source, &worker_token, on_progress) {
                    RunOutcome::Completed(image) => {
                        on_complete(image);
                        RunState::Completed
                    }
                    RunOutcome::Cancelled { .. } => RunState::Cancelled,
                };
                set_state(&worker_state, final_state);
            })?;

        Ok(FilterRun {
            token,
            state,
            handle: Some(handle),
        })
    }
}

fn set_state(state: &Mutex<RunState>, value: RunState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

/// Handle to a run started with [`IterativeFilterRunner::start`].
///
/// Dropping the handle does not cancel the run.
#[derive(Debug)]
pub struct FilterRun {
    token: CancelToken,
    state: Arc<Mutex<RunState>>,
    handle: Option<JoinHandle<()>>,
}

impl FilterRun {
    /// Request cancellation; takes effect at the next pass boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Current state of the run.
    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the run has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self.state(), RunState::Completed | RunState::Cancelled)
    }

    /// Token shared with the worker.
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Block until the worker exits and return the final state.
    pub fn wait(mut self) -> TaskResult<RunState> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                TaskError::Panicked(message)
            })?;
        }
        Ok(self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filterer_filter::{PackedAverage, blur_repeated};
    use std::sync::mpsc;

    fn runner(passes: u32) -> IterativeFilterRunner {
        IterativeFilterRunner::new(Arc::new(PackedAverage), NonZeroU32::new(passes).unwrap())
    }

    fn sample_image() -> RasterImage {
        RasterImage::from_fn(6, 5, |x, y| 0xff00_0000 | (x * 40) << 16 | (y * 50)).unwrap()
    }

    #[test]
    fn test_run_reports_in_order_and_matches_repeated_blur() {
        let src = sample_image();
        let mut seen = Vec::new();
        let outcome = runner(3).run(&src, &CancelToken::new(), |p| {
            seen.push((p.iteration, p.total));
        });
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
        let image = outcome.into_image().unwrap();
        assert_eq!(image, blur_repeated(&src, &PackedAverage, 3));
    }

    #[test]
    fn test_cancel_from_progress_stops_after_first_pass() {
        let token = CancelToken::new();
        let mut calls = 0;
        let outcome = runner(5).run(&sample_image(), &token, |_| {
            calls += 1;
            token.cancel();
        });
        assert_eq!(calls, 1);
        assert!(matches!(outcome, RunOutcome::Cancelled { completed: 1 }));
    }

    #[test]
    fn test_cancel_before_start_reports_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let outcome = runner(2).run(&sample_image(), &token, |_| panic!("no progress expected"));
        assert!(matches!(outcome, RunOutcome::Cancelled { completed: 0 }));
    }

    #[test]
    fn test_start_completes_once() {
        let (tx, rx) = mpsc::channel();
        let progress_tx = tx.clone();
        let run = runner(3)
            .start(
                sample_image(),
                move |p| progress_tx.send(Some(p.iteration)).unwrap(),
                move |_| tx.send(None).unwrap(),
            )
            .unwrap();
        assert_eq!(run.wait().unwrap(), RunState::Completed);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events, vec![Some(1), Some(2), Some(3), None]);
    }

    #[test]
    fn test_start_cancelled_never_completes() {
        let (tx, rx) = mpsc::channel();
        let (go_tx, go_rx) = mpsc::channel::<()>();
        let progress_tx = tx.clone();
        let run = runner(10)
            .start(
                sample_image(),
                move |p| {
                    progress_tx.send(Some(p.iteration)).unwrap();
                    if p.iteration == 1 {
                        // hold the worker until the test has cancelled
                        go_rx.recv().unwrap();
                    }
                },
                move |_| tx.send(None).unwrap(),
            )
            .unwrap();

        assert_eq!(rx.recv().unwrap(), Some(1));
        run.cancel();
        go_tx.send(()).unwrap();
        assert_eq!(run.wait().unwrap(), RunState::Cancelled);
        assert!(rx.try_iter().next().is_none());
    }
}
