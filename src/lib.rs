//! # typebus
//!
//! An in-process publish/subscribe event bus that routes events by their
//! exact runtime type.
//!
//! A producer posts any `Send + Sync + 'static` value; every live subscriber
//! registered for that value's type receives it, each on the execution
//! context it asked for. The poster learns synchronously whether anyone was
//! listening, so "delivered" and "dropped, no listener" can be told apart.
//!
//! ## Features
//!
//! - **Exact type routing**: no base event type, no supertype matching
//! - **Unhandled reporting**: [`EventBus::post_or_else`] calls back when no
//!   subscription exists for the event's type
//! - **Execution contexts**: run handlers inline, on a rayon [`WorkerPool`],
//!   on a tokio runtime ([`TokioExecutor`]) or on fresh threads ([`NewThread`])
//! - **Per-subscriber ordering**: each handler sees events in publish order,
//!   even on multi-threaded executors
//! - **Fault isolation**: a panicking handler never stops delivery to others
//! - **Explicit cancellation**: [`Subscription::cancel`] is idempotent and
//!   never tied to drop
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, mpsc};
//! use std::time::Duration;
//! use typebus::{BusConfig, EventBus, WorkerPool};
//!
//! struct UserCreated {
//!     name: String,
//! }
//!
//! struct CacheFlushed;
//!
//! fn main() -> typebus::Result<()> {
//!     let bus = EventBus::new();
//!     let pool = WorkerPool::from_config(&BusConfig::default().with_worker_threads(2))?;
//!
//!     let (tx, rx) = mpsc::channel();
//!     let tx = std::sync::Mutex::new(tx);
//!     let subscription = bus.subscribe_on(pool, move |event: Arc<UserCreated>| {
//!         let _ = tx.lock().unwrap().send(event.name.clone());
//!     });
//!
//!     bus.post_or_else(UserCreated { name: "ada".into() }, |_| unreachable!());
//!     assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "ada");
//!
//!     let mut unhandled = false;
//!     bus.post_or_else(CacheFlushed, |_| unhandled = true);
//!     assert!(unhandled);
//!
//!     subscription.cancel();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod messaging;
pub mod worker;

// Re-export core types
pub use config::BusConfig;
pub use error::{BusError, Result};
pub use messaging::{Event, EventBus, EventType, Payload, Subscription, SubscriptionSet};
pub use worker::{Executor, Immediate, Job, NewThread, TokioExecutor, WorkerPool};

/// Prelude module for convenient imports
///
/// ```
/// use typebus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::BusConfig;
    pub use crate::error::{BusError, Result};
    pub use crate::messaging::{Event, EventBus, EventType, Subscription, SubscriptionSet};
    pub use crate::worker::{Executor, Immediate, NewThread, TokioExecutor, WorkerPool};
    pub use std::sync::Arc;
}
