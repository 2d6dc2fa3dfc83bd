//! Keyed registry of cancellable background tasks
//!
//! At most one task is live per identity. Submitting work under an
//! identity that already has a task cancels the old one; the new worker
//! thread waits for it to exit before running its own work, so the caller
//! never blocks. Every wait is bounded: a task that ignores its token is
//! abandoned after the timeout and a warning is logged.
//!
//! Each task gets a generation number, increasing across the whole
//! registry. Results carry the generation they were produced under so the
//! receiver can drop output from tasks that have since been replaced.

use crate::{CancelToken, TaskResult};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// How long cancellation waits for a task to exit.
pub const DEFAULT_TERMINATION_TIMEOUT: Duration = Duration::from_millis(1000);

/// Handed to every submitted task.
#[derive(Debug, Clone)]
pub struct TaskContext {
    token: CancelToken,
    generation: u64,
}

impl TaskContext {
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct TaskHandle {
    token: CancelToken,
    generation: u64,
    // The worker owns the sender; disconnection means the thread exited.
    exited: Receiver<()>,
}

impl TaskHandle {
    fn has_exited(&self) -> bool {
        matches!(self.exited.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Wait until `deadline` for the worker to exit.
    fn wait_until(&self, deadline: Instant) -> bool {
        let timeout = deadline.saturating_duration_since(Instant::now());
        match self.exited.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

/// Registry of background tasks keyed by identity `K`.
///
/// Dropping the registry cancels every task, waiting at most the
/// termination timeout in total.
pub struct CancellableTaskRegistry<K> {
    name: String,
    timeout: Duration,
    next_generation: AtomicU64,
    tasks: Mutex<HashMap<K, TaskHandle>>,
}

impl<K> CancellableTaskRegistry<K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Create an empty registry; worker threads are named after `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeout: DEFAULT_TERMINATION_TIMEOUT,
            next_generation: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Set the bound on termination waits.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<K, TaskHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace whatever runs under `identity` with `work`.
    ///
    /// Does not block. The previous task, if any, is cancelled and leaves
    /// the registry under the same lock that stores the new one. The new
    /// worker thread waits (bounded) for the previous one to exit and then
    /// runs `work`, unless it was itself cancelled in the meantime.
    /// Returns the new task's generation.
    ///
    /// # Errors
    ///
    /// [`TaskError::Spawn`](crate::TaskError::Spawn) if the thread cannot
    /// be created; the identity is then left empty.
    pub fn submit<F>(&self, identity: K, work: F) -> TaskResult<u64>
    where
        F: FnOnce(TaskContext) + Send + 'static,
    {
        let mut tasks = self.tasks();

        let previous = tasks.remove(&identity);
        if let Some(handle) = &previous {
            handle.token.cancel();
        }

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let token = CancelToken::new();
        let context = TaskContext {
            token: token.clone(),
            generation,
        };
        let (exit_tx, exited) = mpsc::channel::<()>();
        let name = self.name.clone();
        let timeout = self.timeout;
        let label = format!("{:?}", identity);

        thread::Builder::new()
            .name(format!("{}-{}", self.name, generation))
            .spawn(move || {
                let _exit_guard = exit_tx;
                if let Some(handle) = previous
                    && !handle.wait_until(Instant::now() + timeout)
                {
                    log::warn!(
                        "{}: {} generation {} did not stop within {:?}; abandoning it",
                        name,
                        label,
                        handle.generation,
                        timeout
                    );
                }
                if context.is_cancelled() {
                    log::debug!("{}: {} generation {} cancelled before start", name, label, generation);
                    return;
                }
                work(context);
            })?;

        log::debug!("{}: started {:?} generation {}", self.name, identity, generation);
        tasks.insert(
            identity,
            TaskHandle {
                token,
                generation,
                exited,
            },
        );
        Ok(generation)
    }

    /// Cancel the task under `identity` and wait (bounded) for it to exit.
    ///
    /// The identity is cleared either way. Returns `false` only if the task
    /// was still running when the wait timed out.
    pub fn cancel(&self, identity: &K) -> bool {
        let Some(handle) = self.tasks().remove(identity) else {
            return true;
        };
        handle.token.cancel();
        let exited = handle.wait_until(Instant::now() + self.timeout);
        if !exited {
            log::warn!(
                "{}: {:?} generation {} did not stop within {:?}; abandoning it",
                self.name,
                identity,
                handle.generation,
                self.timeout
            );
        }
        exited
    }

    /// Cancel the task under `identity` without waiting for it.
    ///
    /// The identity is cleared at once, so results the task still sends are
    /// stale. A watcher thread waits (bounded) for the exit and logs a
    /// warning on timeout. Returns whether a task was registered.
    pub fn cancel_detached(&self, identity: &K) -> bool {
        let Some(handle) = self.tasks().remove(identity) else {
            return false;
        };
        handle.token.cancel();
        if handle.has_exited() {
            return true;
        }

        let name = self.name.clone();
        let timeout = self.timeout;
        let label = format!("{:?}", identity);
        let spawned = thread::Builder::new()
            .name(format!("{}-reaper-{}", self.name, handle.generation))
            .spawn(move || {
                if !handle.wait_until(Instant::now() + timeout) {
                    log::warn!(
                        "{}: {} generation {} did not stop within {:?}; abandoning it",
                        name,
                        label,
                        handle.generation,
                        timeout
                    );
                }
            });
        if let Err(e) = spawned {
            log::warn!("{}: cannot watch {:?} for exit: {}", self.name, identity, e);
        }
        true
    }

    /// Cancel every task, waiting at most one timeout in total.
    pub fn cancel_all(&self) -> bool {
        let handles: Vec<(K, TaskHandle)> = self.tasks().drain().collect();
        for (_, handle) in &handles {
            handle.token.cancel();
        }
        let deadline = Instant::now() + self.timeout;
        let mut all_exited = true;
        for (identity, handle) in &handles {
            if !handle.wait_until(deadline) {
                log::warn!(
                    "{}: {:?} generation {} did not stop in time",
                    self.name,
                    identity,
                    handle.generation
                );
                all_exited = false;
            }
        }
        all_exited
    }

    /// Whether a task is registered under `identity` and has not exited.
    pub fn is_running(&self, identity: &K) -> bool {
        self.tasks()
            .get(identity)
            .is_some_and(|handle| !handle.has_exited())
    }

    /// Generation of the task registered under `identity`.
    pub fn generation(&self, identity: &K) -> Option<u64> {
        self.tasks().get(identity).map(|handle| handle.generation)
    }

    /// Whether `generation` is still the registered task for `identity`.
    ///
    /// A finished task stays current until it is replaced or cancelled.
    pub fn is_current(&self, identity: &K, generation: u64) -> bool {
        self.generation(identity) == Some(generation)
    }

    /// Identities with a registered task.
    pub fn identities(&self) -> Vec<K> {
        self.tasks().keys().cloned().collect()
    }
}

impl<K> Drop for CancellableTaskRegistry<K> {
    fn drop(&mut self) {
        let tasks = std::mem::take(self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner));
        for handle in tasks.values() {
            handle.token.cancel();
        }
        let deadline = Instant::now() + self.timeout;
        let stuck = tasks
            .values()
            .filter(|handle| !handle.wait_until(deadline))
            .count();
        if stuck > 0 {
            log::warn!("{}: {} task(s) still running at shutdown", self.name, stuck);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    fn spin_until_cancelled(ctx: TaskContext) {
        while !ctx.is_cancelled() {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_submit_replaces_and_cancels_previous() {
        let registry = CancellableTaskRegistry::new("test");
        let (tx, rx) = channel();

        let first_tx = tx.clone();
        let first = registry
            .submit("slot", move |ctx| {
                spin_until_cancelled(ctx.clone());
                first_tx.send(("first cancelled", ctx.generation())).unwrap();
            })
            .unwrap();
        let second_tx = tx.clone();
        let second = registry
            .submit("slot", move |ctx| {
                second_tx.send(("second started", ctx.generation())).unwrap();
                spin_until_cancelled(ctx);
            })
            .unwrap();

        // the second task starts only after the first one exited
        let timeout = Duration::from_secs(5);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), ("first cancelled", first));
        assert_eq!(rx.recv_timeout(timeout).unwrap(), ("second started", second));
        assert!(second > first);
        assert!(!registry.is_current(&"slot", first));
        assert!(registry.is_current(&"slot", second));
        assert!(registry.is_running(&"slot"));

        assert!(registry.cancel(&"slot"));
        assert_eq!(registry.generation(&"slot"), None);
    }

    #[test]
    fn test_submit_does_not_wait_for_previous() {
        let registry = CancellableTaskRegistry::new("test");
        let (tx, rx) = channel();

        // ignores its token for a while
        let first_tx = tx.clone();
        registry
            .submit("slot", move |_| {
                thread::sleep(Duration::from_millis(300));
                first_tx.send("first done").unwrap();
            })
            .unwrap();

        let started = Instant::now();
        registry
            .submit("slot", move |_| tx.send("second ran").unwrap())
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(150));

        let timeout = Duration::from_secs(5);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), "first done");
        assert_eq!(rx.recv_timeout(timeout).unwrap(), "second ran");
    }

    #[test]
    fn test_replaced_before_start_never_runs() {
        let registry = CancellableTaskRegistry::new("test");
        let (tx, rx) = channel();

        registry
            .submit("slot", |_| thread::sleep(Duration::from_millis(100)))
            .unwrap();
        let skipped_tx = tx.clone();
        registry
            .submit("slot", move |ctx| {
                skipped_tx.send(("skipped", ctx.generation())).unwrap()
            })
            .unwrap();
        let last = registry
            .submit("slot", move |ctx| tx.send(("last", ctx.generation())).unwrap())
            .unwrap();

        // the middle task is cancelled while waiting for the first
        let received: Vec<_> = rx.iter().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], ("last", last));
    }

    #[test]
    fn test_cancel_detached_clears_identity() {
        let registry = CancellableTaskRegistry::new("test");
        let generation = registry.submit("slot", spin_until_cancelled).unwrap();
        assert!(registry.cancel_detached(&"slot"));
        assert!(!registry.is_current(&"slot", generation));
        assert!(!registry.is_running(&"slot"));
        assert!(!registry.cancel_detached(&"slot"));
    }

    #[test]
    fn test_cancel_unknown_is_noop() {
        let registry: CancellableTaskRegistry<u32> = CancellableTaskRegistry::new("test");
        assert!(registry.cancel(&7));
        assert!(!registry.is_running(&7));
    }

    #[test]
    fn test_identities_are_independent() {
        let registry = CancellableTaskRegistry::new("test");
        let a = registry.submit(1, spin_until_cancelled).unwrap();
        let b = registry.submit(2, spin_until_cancelled).unwrap();
        assert!(registry.cancel(&1));
        assert!(!registry.is_current(&1, a));
        assert!(registry.is_current(&2, b));
        assert!(registry.cancel_all());
        assert!(registry.identities().is_empty());
    }

    #[test]
    fn test_finished_task_stays_current() {
        let registry = CancellableTaskRegistry::new("test");
        let (tx, rx) = channel();
        let generation = registry.submit("done", move |_| tx.send(()).unwrap()).unwrap();
        rx.recv().unwrap();
        assert!(registry.is_current(&"done", generation));
    }

    #[test]
    fn test_cancel_times_out_on_stubborn_task() {
        let registry =
            CancellableTaskRegistry::new("test").with_timeout(Duration::from_millis(20));
        registry
            .submit("stubborn", |_| thread::sleep(Duration::from_millis(300)))
            .unwrap();
        assert!(!registry.cancel(&"stubborn"));
        assert_eq!(registry.generation(&"stubborn"), None);
    }

    #[test]
    fn test_panicking_task_counts_as_exited() {
        let registry = CancellableTaskRegistry::new("test");
        registry.submit("boom", |_| panic!("task failure")).unwrap();
        assert!(registry.cancel(&"boom"));
    }
}
