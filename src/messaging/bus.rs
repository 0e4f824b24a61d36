use super::channel::{Multicast, ObserverId};
use super::dispatch::{Dispatch, Envelope, Payload};
use super::event::{Event, EventType};
use super::ref_count::RefCounts;
use super::subscription::Subscription;
use crate::worker::Executor;
use std::any::Any;
use std::sync::Arc;

pub(crate) struct BusShared {
    channel: Multicast<Envelope>,
    counts: RefCounts,
}

impl BusShared {
    /// Detaches a cancelled subscription and releases its count.
    pub(crate) fn release(&self, id: ObserverId, event_type: EventType) {
        self.channel.detach(id);
        let remaining = self.counts.decrement(event_type);
        tracing::debug!(
            event_type = %event_type,
            remaining,
            "Subscription cancelled"
        );
    }
}

/// In-process, type-routed publish/subscribe event bus.
///
/// Events are routed by their exact runtime type: a handler registered for
/// `E` receives every `E` posted after it subscribed, and nothing else.
/// Cloning an `EventBus` yields another handle to the same bus; separate
/// `EventBus::new()` instances share no state.
///
/// # Unhandled events
///
/// [`post_or_else`](Self::post_or_else) reports an event as unhandled when no
/// subscription for its type exists at the moment of the check. It does not
/// wait for handlers: with an asynchronous executor the handler may not have
/// run yet when `post_or_else` returns, and the event still counts as handled.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use typebus::EventBus;
///
/// struct OrderPlaced {
///     id: u64,
/// }
///
/// let bus = EventBus::new();
/// let total = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&total);
/// let subscription = bus.subscribe(move |event: Arc<OrderPlaced>| {
///     counter.fetch_add(event.id as usize, Ordering::SeqCst);
/// });
///
/// bus.post(OrderPlaced { id: 7 });
/// assert_eq!(total.load(Ordering::SeqCst), 7);
///
/// subscription.cancel();
/// let mut dropped = false;
/// bus.post_or_else(OrderPlaced { id: 1 }, |_| dropped = true);
/// assert!(dropped);
/// ```
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<BusShared>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.shared.channel.observer_count())
            .field("event_types", &self.shared.counts.tracked_types())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(BusShared {
                channel: Multicast::new(),
                counts: RefCounts::new(),
            }),
        }
    }

    /// Posts an event; if nobody subscribes to its type it is silently dropped.
    pub fn post<E: Event>(&self, event: E) {
        self.post_or_else(event, |_| {});
    }

    /// Posts an event, calling `on_unhandled` on this thread before returning
    /// if no subscription exists for `E`.
    pub fn post_or_else<E, F>(&self, event: E, on_unhandled: F)
    where
        E: Event,
        F: FnOnce(Arc<E>),
    {
        let event = Arc::new(event);
        let payload: Payload = event.clone();
        if !self.publish(EventType::of::<E>(), payload) {
            on_unhandled(event);
        }
    }

    /// Posts a type-erased event, routed by the concrete type behind it.
    pub fn post_any(&self, event: Payload) {
        self.post_any_or_else(event, |_| {});
    }

    /// Type-erased variant of [`post_or_else`](Self::post_or_else).
    pub fn post_any_or_else<F>(&self, event: Payload, on_unhandled: F)
    where
        F: FnOnce(Arc<dyn Any + Send + Sync>),
    {
        let event_type = self.shared.counts.resolve(EventType::of_val(&*event));
        if !self.publish(event_type, event.clone()) {
            on_unhandled(event);
        }
    }

    /// Registers `handler` for events of type `E`, run inline on the
    /// delivering thread.
    pub fn subscribe<E, H>(&self, handler: H) -> Subscription
    where
        E: Event,
        H: Fn(Arc<E>) + Send + Sync + 'static,
    {
        self.attach(Dispatch::inline(handler))
    }

    /// Registers `handler` for events of type `E`, run on `executor`.
    ///
    /// Events reach the handler one at a time, in publish order.
    pub fn subscribe_on<E, H, X>(&self, executor: X, handler: H) -> Subscription
    where
        E: Event,
        H: Fn(Arc<E>) + Send + Sync + 'static,
        X: Executor,
    {
        self.attach(Dispatch::scheduled(handler, Arc::new(executor)))
    }

    /// Number of live subscriptions for `E`
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.subscriber_count_of(EventType::of::<E>())
    }

    pub fn subscriber_count_of(&self, event_type: EventType) -> usize {
        self.shared.counts.count_of(event_type)
    }

    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.subscriber_count::<E>() > 0
    }

    fn attach<E: Event>(&self, dispatch: Dispatch<E>) -> Subscription {
        let event_type = EventType::of::<E>();
        // Count first, so an event published right after attaching is never
        // reported as unhandled.
        let count = self.shared.counts.increment(event_type);
        let executor = dispatch.executor_name().to_string();
        let liveness = dispatch.liveness();
        let id = self.shared.channel.attach(Arc::new(dispatch));

        tracing::debug!(
            event_type = %event_type,
            executor = %executor,
            count,
            "Subscribed"
        );

        Subscription::new(id, event_type, liveness, Arc::downgrade(&self.shared))
    }

    /// Returns whether a subscription for `event_type` existed after publishing.
    fn publish(&self, event_type: EventType, payload: Payload) -> bool {
        self.shared.channel.publish(Envelope {
            event_type,
            payload,
        });
        let handled = self.shared.counts.count_of(event_type) > 0;
        if !handled {
            tracing::trace!(event_type = %event_type, "Unhandled event");
        }
        handled
    }
}
