use crate::error::{BusError, Result};
use std::env;

/// Environment variable holding the worker pool size.
pub const WORKER_THREADS_VAR: &str = "TYPEBUS_WORKER_THREADS";
/// Environment variable holding the worker thread name prefix.
pub const THREAD_NAME_VAR: &str = "TYPEBUS_THREAD_NAME";

const DEFAULT_THREAD_NAME: &str = "typebus-worker";

/// Configuration for the execution contexts shipped with the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Number of threads in a [`WorkerPool`](crate::worker::WorkerPool)
    pub worker_threads: usize,
    /// Prefix for worker thread names; the thread index is appended
    pub thread_name: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl BusConfig {
    /// Load configuration from the process environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(WORKER_THREADS_VAR) {
            let threads = raw.trim().parse::<usize>().map_err(|e| {
                BusError::invalid_config(WORKER_THREADS_VAR, format!("'{}': {}", raw, e))
            })?;
            if threads == 0 {
                return Err(BusError::invalid_config(
                    WORKER_THREADS_VAR,
                    "must be at least 1",
                ));
            }
            config.worker_threads = threads;
        }

        if let Some(name) = lookup(THREAD_NAME_VAR) {
            let name = name.trim();
            if name.is_empty() {
                return Err(BusError::invalid_config(THREAD_NAME_VAR, "must not be empty"));
            }
            config.thread_name = name.to_string();
        }

        Ok(config)
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = BusConfig::from_source(source(&[])).unwrap();
        assert_eq!(config, BusConfig::default());
        assert!(config.worker_threads >= 1);
        assert_eq!(config.thread_name, "typebus-worker");
    }

    #[test]
    fn test_reads_values() {
        let config = BusConfig::from_source(source(&[
            (WORKER_THREADS_VAR, " 3 "),
            (THREAD_NAME_VAR, "events"),
        ]))
        .unwrap();
        assert_eq!(config.worker_threads, 3);
        assert_eq!(config.thread_name, "events");
    }

    #[test]
    fn test_rejects_invalid_thread_count() {
        let err = BusConfig::from_source(source(&[(WORKER_THREADS_VAR, "many")])).unwrap_err();
        assert!(
            matches!(err, BusError::InvalidConfig { ref key, .. } if key == WORKER_THREADS_VAR)
        );

        let err = BusConfig::from_source(source(&[(WORKER_THREADS_VAR, "0")])).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_rejects_empty_thread_name() {
        let err = BusConfig::from_source(source(&[(THREAD_NAME_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, BusError::InvalidConfig { ref key, .. } if key == THREAD_NAME_VAR));
    }
}
