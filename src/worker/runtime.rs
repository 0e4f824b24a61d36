use super::{Executor, Job};
use crate::error::Result;
use tokio::runtime::Handle;

/// Runs handlers on a tokio runtime.
///
/// By default jobs are spawned as tasks on the runtime's worker threads, so
/// handlers should be short and non-blocking. Use [`TokioExecutor::blocking`]
/// for handlers that do blocking work; those jobs go to the blocking pool.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
    blocking: bool,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            blocking: false,
        }
    }

    /// Executor bound to the runtime the caller is running in
    pub fn current() -> Result<Self> {
        Ok(Self::new(Handle::try_current()?))
    }

    pub fn blocking(handle: Handle) -> Self {
        Self {
            handle,
            blocking: true,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, job: Job) {
        if self.blocking {
            self.handle.spawn_blocking(job);
        } else {
            self.handle.spawn(async move { job() });
        }
    }

    fn name(&self) -> &str {
        if self.blocking { "tokio-blocking" } else { "tokio" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BusError;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[test]
    fn test_current_outside_runtime() {
        let err = TokioExecutor::current().unwrap_err();
        assert!(matches!(err, BusError::NoRuntime(_)));
    }

    #[tokio::test]
    async fn test_spawns_on_runtime() {
        let executor = TokioExecutor::current().unwrap();
        let (tx, rx) = oneshot::channel();
        executor.execute(Box::new(move || {
            let _ = tx.send(7);
        }));
        let value = tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_pool() {
        let executor = TokioExecutor::blocking(Handle::current());
        assert!(executor.is_blocking());
        let (tx, rx) = oneshot::channel();
        executor.execute(Box::new(move || {
            std::thread::sleep(Duration::from_millis(10));
            let _ = tx.send("done");
        }));
        let value = tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, "done");
    }
}
