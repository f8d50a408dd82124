//! Execution backends for asynchronous calls.
//!
//! A simulated call never owns threads. Asynchronous execution hands one
//! blocking task per invocation to a [`CallExecutor`] supplied by the caller.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::warn;

/// A unit of blocking work submitted by an enqueued call
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Task dispatch contract for execution backends.
///
/// Tasks block for the simulated delay, so implementations must run them on
/// a thread where blocking is acceptable.
pub trait CallExecutor: Send + Sync {
    /// Run `task` asynchronously on some backend thread.
    fn execute(&self, task: Task);
}

impl<F> CallExecutor for F
where
    F: Fn(Task) + Send + Sync,
{
    fn execute(&self, task: Task) {
        self(task);
    }
}

/// Spawns one named OS thread per task
#[derive(Debug)]
pub struct ThreadExecutor {
    name: String,
    spawned: AtomicU64,
}

impl ThreadExecutor {
    /// Create an executor whose threads are named `<name>-<n>`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spawned: AtomicU64::new(0),
        }
    }

    /// Number of tasks dispatched so far
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new("netsim-call")
    }
}

impl CallExecutor for ThreadExecutor {
    fn execute(&self, task: Task) {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}-{n}", self.name);
        spawn_or_run_inline(task, move |job| {
            std::thread::Builder::new().name(name).spawn(job).map(drop)
        });
    }
}

/// Hand `task` to `spawn`, running it on the caller's thread if `spawn` fails.
///
/// The task sits in a shared slot; whichever side takes it first runs it.
fn spawn_or_run_inline<S>(task: Task, spawn: S)
where
    S: FnOnce(Task) -> std::io::Result<()>,
{
    let slot = Arc::new(Mutex::new(Some(task)));
    let thread_slot = slot.clone();
    let spawned = spawn(Box::new(move || take_and_run(&thread_slot)));

    if let Err(err) = spawned {
        warn!(error = %err, "thread spawn refused, running call on caller thread");
        take_and_run(&slot);
    }
}

fn take_and_run(slot: &Mutex<Option<Task>>) {
    let task = slot.lock().take();
    if let Some(task) = task {
        task();
    }
}

/// Dispatches tasks onto a tokio runtime's blocking pool
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    /// Use the runtime behind `handle`
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is currently running on, if any
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl CallExecutor for TokioExecutor {
    fn execute(&self, task: Task) {
        // Detached: completion is reported through the call's callback.
        drop(self.handle.spawn_blocking(task));
    }
}
