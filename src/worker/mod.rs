//! Execution contexts for event handlers.
//!
//! A subscriber chooses where its handler runs by passing an [`Executor`] to
//! [`EventBus::subscribe_on`](crate::EventBus::subscribe_on). The bus never
//! spawns anything on its own; it only hands [`Job`]s to the executor.
//!
//! | Executor            | Where the job runs                         |
//! |---------------------|--------------------------------------------|
//! | [`Immediate`]       | the calling thread, before `execute` returns |
//! | [`WorkerPool`]      | a shared rayon thread pool                  |
//! | [`TokioExecutor`]   | a tokio runtime (async or blocking pool)    |
//! | [`NewThread`]       | a fresh OS thread per job                   |

mod pool;
mod runtime;

use std::sync::Arc;
use std::thread;

pub use pool::WorkerPool;
pub use runtime::TokioExecutor;

/// A unit of work handed to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs, now or later, possibly on another thread.
///
/// An executor may drop a job without running it (for example when its
/// runtime has shut down). The bus tolerates that: undelivered events stay
/// queued and the next matching event schedules a new job.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, job: Job);

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<X: Executor + ?Sized> Executor for Arc<X> {
    fn execute(&self, job: Job) {
        (**self).execute(job)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Runs every job synchronously on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Executor for Immediate {
    fn execute(&self, job: Job) {
        job()
    }

    fn name(&self) -> &str {
        "immediate"
    }
}

/// Spawns a dedicated OS thread for every job.
#[derive(Debug, Clone)]
pub struct NewThread {
    thread_name: String,
}

impl Default for NewThread {
    fn default() -> Self {
        Self::new("typebus-thread")
    }
}

impl NewThread {
    pub fn new(thread_name: impl Into<String>) -> Self {
        Self {
            thread_name: thread_name.into(),
        }
    }
}

impl Executor for NewThread {
    fn execute(&self, job: Job) {
        let spawned = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(job);
        if let Err(e) = spawned {
            tracing::error!("Failed to spawn handler thread {}: {}", self.thread_name, e);
        }
    }

    fn name(&self) -> &str {
        &self.thread_name
    }
}
