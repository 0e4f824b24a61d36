use super::bus::BusShared;
use super::channel::ObserverId;
use super::dispatch::Liveness;
use super::event::EventType;
use std::fmt;
use std::sync::{Arc, Weak};

/// Cancellation handle for one registration on an [`EventBus`](super::EventBus).
///
/// Dropping a `Subscription` does **not** cancel it; call [`cancel`](Self::cancel)
/// (or collect it into a [`SubscriptionSet`]) to stop receiving events.
#[must_use = "the handler stays registered until `cancel` is called"]
pub struct Subscription {
    id: ObserverId,
    event_type: EventType,
    liveness: Arc<dyn Liveness>,
    bus: Weak<BusShared>,
}

impl Subscription {
    pub(crate) fn new(
        id: ObserverId,
        event_type: EventType,
        liveness: Arc<dyn Liveness>,
        bus: Weak<BusShared>,
    ) -> Self {
        Self {
            id,
            event_type,
            liveness,
            bus,
        }
    }

    /// Stops delivery to this subscription's handler.
    ///
    /// Idempotent: only the first call detaches from the bus and releases the
    /// subscription count. Events already queued on an asynchronous executor
    /// are discarded; a handler that is already running finishes normally.
    pub fn cancel(&self) {
        if !self.liveness.close() {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.release(self.id, self.event_type);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        !self.liveness.is_open()
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A group of subscriptions cancelled together.
#[derive(Debug, Default)]
#[must_use = "the handlers stay registered until `cancel` is called"]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) -> &mut Self {
        self.subscriptions.push(subscription);
        self
    }

    /// Cancels every subscription in the set and empties it.
    pub fn cancel(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl FromIterator<Subscription> for SubscriptionSet {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Self {
            subscriptions: iter.into_iter().collect(),
        }
    }
}

impl Extend<Subscription> for SubscriptionSet {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.subscriptions.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventBus;
    use std::any::TypeId;

    struct Ping;
    struct Pong;

    #[test]
    fn test_subscription_reports_event_type() {
        let bus = EventBus::new();
        let subscription = bus.subscribe(|_: Arc<Ping>| {});

        assert_eq!(subscription.event_type(), EventType::of::<Ping>());
        assert_eq!(subscription.event_type().id(), TypeId::of::<Ping>());
        assert!(format!("{:?}", subscription).contains("cancelled: false"));

        subscription.cancel();
        assert!(subscription.is_cancelled());
        assert_eq!(bus.subscriber_count_of(subscription.event_type()), 0);
    }

    #[test]
    fn test_set_collects_and_extends() {
        let bus = EventBus::new();
        let mut set: SubscriptionSet = (0..2).map(|_| bus.subscribe(|_: Arc<Ping>| {})).collect();
        assert_eq!(set.len(), 2);

        set.extend([
            bus.subscribe(|_: Arc<Pong>| {}),
            bus.subscribe(|_: Arc<Pong>| {}),
        ]);
        set.add(bus.subscribe(|_: Arc<Pong>| {}));
        assert_eq!(set.len(), 5);
        assert_eq!(bus.subscriber_count::<Ping>(), 2);
        assert_eq!(bus.subscriber_count::<Pong>(), 3);

        set.cancel();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(bus.subscriber_count::<Ping>(), 0);
        assert_eq!(bus.subscriber_count::<Pong>(), 0);

        set.cancel();
        assert!(set.is_empty());
    }
}
