//! # Type filter and dispatch stage.
//!
//! Every subscription attaches one [`Dispatch`] observer to the bus channel.
//! The observer drops envelopes of other event types, downcasts the rest and
//! hands them to the subscriber's handler, either inline or through an
//! [`Executor`].
//!
//! ## Executor mode
//! ```text
//! on_next(envelope) ──► [pending queue] ──► drain job ──► handler(event)
//!                           │              (on executor)
//!                           └─ draining flag: at most one drain job in flight
//! ```
//! - Events reach the handler in publish order, even on a multi-threaded pool.
//! - After cancellation, queued events are discarded; a running handler
//!   finishes normally.
//! - A drain job dropped by its executor without running releases the
//!   draining flag, so the next event schedules a fresh one.
//!
//! ## Panic handling
//! Handler panics are caught per invocation and logged. The subscription
//! stays live and keeps receiving events; other subscribers are unaffected.

use super::channel::Observer;
use super::event::{Event, EventType};
use crate::worker::Executor;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Type-erased event as carried by the bus channel.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// A published event together with its routing key.
#[derive(Clone)]
pub struct Envelope {
    pub event_type: EventType,
    pub payload: Payload,
}

/// Live/cancelled state shared between a dispatch observer and its
/// [`Subscription`](super::Subscription).
pub trait Liveness: Send + Sync {
    /// Marks the subscription cancelled. Returns `true` only for the call
    /// that performed the transition.
    fn close(&self) -> bool;

    fn is_open(&self) -> bool;
}

type Handler<E> = Box<dyn Fn(Arc<E>) + Send + Sync>;

struct Pending<E> {
    queue: VecDeque<Arc<E>>,
    draining: bool,
}

struct DispatchState<E> {
    event_type: EventType,
    handler: Handler<E>,
    live: AtomicBool,
    pending: Mutex<Pending<E>>,
}

impl<E: Event> DispatchState<E> {
    fn invoke(&self, event: Arc<E>) {
        if let Err(panic_err) = panic::catch_unwind(AssertUnwindSafe(|| (self.handler)(event))) {
            tracing::error!(
                event_type = %self.event_type,
                "Event handler panicked: {}",
                panic_message(&*panic_err)
            );
        }
    }

    fn drain(&self) {
        loop {
            let next = {
                let mut pending = self.lock_pending();
                match pending.queue.pop_front() {
                    Some(event) => event,
                    None => {
                        pending.draining = false;
                        return;
                    }
                }
            };
            if self.is_open() {
                self.invoke(next);
            }
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Pending<E>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Event> Liveness for DispatchState<E> {
    fn close(&self) -> bool {
        if !self.live.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.lock_pending().queue.clear();
        true
    }

    fn is_open(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Channel observer for a single subscription.
pub struct Dispatch<E> {
    state: Arc<DispatchState<E>>,
    executor: Option<Arc<dyn Executor>>,
}

impl<E: Event> Dispatch<E> {
    /// Handlers run on the thread that delivers the event.
    pub fn inline<H>(handler: H) -> Self
    where
        H: Fn(Arc<E>) + Send + Sync + 'static,
    {
        Self::build(handler, None)
    }

    /// Handlers run as jobs on `executor`, one at a time, in publish order.
    pub fn scheduled<H>(handler: H, executor: Arc<dyn Executor>) -> Self
    where
        H: Fn(Arc<E>) + Send + Sync + 'static,
    {
        Self::build(handler, Some(executor))
    }

    fn build<H>(handler: H, executor: Option<Arc<dyn Executor>>) -> Self
    where
        H: Fn(Arc<E>) + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(DispatchState {
                event_type: EventType::of::<E>(),
                handler: Box::new(handler),
                live: AtomicBool::new(true),
                pending: Mutex::new(Pending {
                    queue: VecDeque::new(),
                    draining: false,
                }),
            }),
            executor,
        }
    }

    pub fn liveness(&self) -> Arc<dyn Liveness> {
        self.state.clone()
    }

    pub fn executor_name(&self) -> &str {
        self.executor
            .as_ref()
            .map(|executor| executor.name())
            .unwrap_or("inline")
    }

    fn schedule(&self, executor: &Arc<dyn Executor>, event: Arc<E>) {
        let start = {
            let mut pending = self.state.lock_pending();
            pending.queue.push_back(event);
            !std::mem::replace(&mut pending.draining, true)
        };
        if start {
            let job = DrainJob {
                state: Some(Arc::clone(&self.state)),
            };
            executor.execute(Box::new(move || job.run()));
        }
    }
}

impl<E: Event> Observer<Envelope> for Dispatch<E> {
    fn on_next(&self, envelope: &Envelope) {
        if envelope.event_type != self.state.event_type || !self.state.is_open() {
            return;
        }
        let Ok(event) = Arc::clone(&envelope.payload).downcast::<E>() else {
            return;
        };
        match &self.executor {
            None => self.state.invoke(event),
            Some(executor) => self.schedule(executor, event),
        }
    }
}

/// Drains a subscription's queue; releases the draining flag if dropped unrun.
struct DrainJob<E: Event> {
    state: Option<Arc<DispatchState<E>>>,
}

impl<E: Event> DrainJob<E> {
    fn run(mut self) {
        if let Some(state) = self.state.take() {
            state.drain();
        }
    }
}

impl<E: Event> Drop for DrainJob<E> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.lock_pending().draining = false;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
