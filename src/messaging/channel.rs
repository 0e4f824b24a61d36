//! # Synchronous multicast channel.
//!
//! [`Multicast`] delivers every published value to every attached observer,
//! on the publishing thread, in publish order.
//!
//! ## Rules
//! - **Snapshot delivery**: each value goes to the observers attached when
//!   its delivery starts, in attach order.
//! - **Serialized emission**: at most one thread delivers at a time. A thread
//!   that publishes while another thread is emitting waits for it to finish,
//!   then delivers its own value itself, so `publish` returns only after every
//!   observer has seen the value. Every observer sees the same global order.
//! - **Re-entrant publish**: a value published from inside `on_next` by the
//!   emitting thread is queued and delivered right after the current value,
//!   before the outer `publish` returns.
//! - **No locks held during delivery**: observers may attach, detach or
//!   publish from inside `on_next`. An observer must not block on another
//!   thread that is itself publishing to the same channel.
//! - **Panics**: an observer unwinding through `publish` releases the emitter
//!   role; queued re-entrant values are delivered first by the next emitter.
//!
//! ```text
//! thread A: publish(v1) ──► [emitter] ──► observer#1 ──► observer#2 ──► release
//! thread B: publish(v2) ──► wait ────────────────────────────────────► [emitter] ──► ...
//! ```

use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

/// Receives values from a [`Multicast`].
pub trait Observer<T>: Send + Sync {
    fn on_next(&self, value: &T);
}

/// Identifies an attached observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

struct Emission<T> {
    emitter: Option<ThreadId>,
    backlog: VecDeque<T>,
}

pub struct Multicast<T> {
    observers: DashMap<ObserverId, Arc<dyn Observer<T>>>,
    next_id: AtomicU64,
    emission: Mutex<Emission<T>>,
    released: Condvar,
}

impl<T> Default for Multicast<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Multicast<T> {
    pub fn new() -> Self {
        Self {
            observers: DashMap::new(),
            next_id: AtomicU64::new(0),
            emission: Mutex::new(Emission {
                emitter: None,
                backlog: VecDeque::new(),
            }),
            released: Condvar::new(),
        }
    }

    pub fn attach(&self, observer: Arc<dyn Observer<T>>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.insert(id, observer);
        id
    }

    /// Returns `false` if the observer was not attached.
    pub fn detach(&self, id: ObserverId) -> bool {
        self.observers.remove(&id).is_some()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn publish(&self, value: T) {
        let current = thread::current().id();
        {
            let mut emission = self.emission.lock();
            if emission.emitter == Some(current) {
                emission.backlog.push_back(value);
                return;
            }
            while emission.emitter.is_some() {
                self.released.wait(&mut emission);
            }
            emission.emitter = Some(current);
            // values left behind by an emitter that panicked go first
            emission.backlog.push_back(value);
        }

        let _guard = EmitGuard { channel: self };
        loop {
            let next = self.emission.lock().backlog.pop_front();
            match next {
                Some(value) => self.deliver(&value),
                None => break,
            }
        }
    }

    fn deliver(&self, value: &T) {
        let mut snapshot: Vec<(ObserverId, Arc<dyn Observer<T>>)> = self
            .observers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        snapshot.sort_unstable_by_key(|(id, _)| *id);

        for (_, observer) in snapshot {
            observer.on_next(value);
        }
    }
}

/// Releases the emitter role and wakes waiting publishers, also on unwind.
struct EmitGuard<'a, T> {
    channel: &'a Multicast<T>,
}

impl<T> Drop for EmitGuard<'_, T> {
    fn drop(&mut self) {
        self.channel.emission.lock().emitter = None;
        self.channel.released.notify_all();
    }
}
