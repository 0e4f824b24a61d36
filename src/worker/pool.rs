use super::{Executor, Job};
use crate::config::BusConfig;
use crate::error::Result;
use rayon::ThreadPool;
use std::sync::Arc;

/// Shared thread pool for running handlers off the posting thread
#[derive(Clone)]
pub struct WorkerPool {
    pool: Arc<ThreadPool>,
    name: Arc<str>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl WorkerPool {
    pub fn new(num_threads: usize) -> Result<Self> {
        Self::from_config(&BusConfig::default().with_worker_threads(num_threads))
    }

    pub fn from_config(config: &BusConfig) -> Result<Self> {
        let prefix = config.thread_name.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(move |index| format!("{}-{}", prefix, index))
            .panic_handler(|_| {
                tracing::error!("Worker pool job panicked");
            })
            .build()?;

        tracing::debug!(
            "Worker pool '{}' started with {} threads",
            config.thread_name,
            pool.current_num_threads()
        );

        Ok(Self {
            pool: Arc::new(pool),
            name: Arc::from(config.thread_name.as_str()),
        })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Executor for WorkerPool {
    fn execute(&self, job: Job) {
        self.pool.spawn(job);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_runs_job_on_named_worker() {
        let config = BusConfig::default()
            .with_worker_threads(2)
            .with_thread_name("pool-test");
        let pool = WorkerPool::from_config(&config).unwrap();
        assert_eq!(pool.num_threads(), 2);
        assert_eq!(pool.name(), "pool-test");

        let caller = thread::current().id();
        let (tx, rx) = mpsc::channel();
        pool.execute(Box::new(move || {
            let current = thread::current();
            tx.send((current.id(), current.name().map(str::to_string)))
                .unwrap();
        }));

        let (id, name) = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_ne!(id, caller);
        assert!(name.unwrap().starts_with("pool-test-"));
    }

    #[test]
    fn test_survives_panicking_job() {
        let pool = WorkerPool::new(1).unwrap();
        pool.execute(Box::new(|| panic!("boom")));

        let (tx, rx) = mpsc::channel();
        pool.execute(Box::new(move || tx.send(42).unwrap()));
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), 42);
    }
}
