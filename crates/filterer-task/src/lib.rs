//! filterer-task - Cancellable background work
//!
//! - [`IterativeFilterRunner`] applies the blur a fixed number of times,
//!   reporting every intermediate frame and stopping at the next pass
//!   boundary once cancelled
//! - [`CancellableTaskRegistry`] keeps at most one live task per identity;
//!   submitting under an identity cancels the task it replaces, and the new
//!   worker waits (bounded) for it to exit before starting

mod cancel;
mod error;
pub mod registry;
pub mod runner;

pub use cancel::CancelToken;
pub use error::{TaskError, TaskResult};
pub use registry::{CancellableTaskRegistry, DEFAULT_TERMINATION_TIMEOUT, TaskContext};
pub use runner::{FilterRun, IterativeFilterRunner, RunOutcome, RunProgress, RunState};
