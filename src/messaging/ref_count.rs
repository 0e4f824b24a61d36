//! Per-type count of live subscriptions.
//!
//! The table is sharded by [`DashMap`], so operations on unrelated event
//! types rarely contend, while every operation on one type runs under that
//! type's shard lock and is therefore linearizable.
//!
//! A type with no live subscriptions has no entry at all: the entry is
//! created by the first increment and removed when the count returns to zero.

use super::event::EventType;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Debug, Default)]
pub struct RefCounts {
    counts: DashMap<EventType, usize>,
}

impl RefCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the count for `event_type` and returns the new value.
    pub fn increment(&self, event_type: EventType) -> usize {
        let mut count = self.counts.entry(event_type).or_insert(0);
        *count += 1;
        *count
    }

    /// Lowers the count for `event_type` and returns the new value.
    ///
    /// Never goes below zero: decrementing an absent type is ignored.
    pub fn decrement(&self, event_type: EventType) -> usize {
        match self.counts.entry(event_type) {
            Entry::Occupied(mut entry) => {
                if *entry.get() <= 1 {
                    entry.remove();
                    0
                } else {
                    *entry.get_mut() -= 1;
                    *entry.get()
                }
            }
            Entry::Vacant(_) => {
                tracing::warn!(
                    event_type = %event_type,
                    "Ignoring subscription count decrement below zero"
                );
                0
            }
        }
    }

    pub fn count_of(&self, event_type: EventType) -> usize {
        self.counts.get(&event_type).map(|count| *count).unwrap_or(0)
    }

    /// Returns the tracked key equal to `event_type`, or `event_type` itself.
    ///
    /// Tracked keys come from typed subscriptions, so this recovers the type
    /// name for a key built with [`EventType::of_val`].
    pub fn resolve(&self, event_type: EventType) -> EventType {
        self.counts
            .get(&event_type)
            .map(|entry| *entry.key())
            .unwrap_or(event_type)
    }

    /// Number of event types with at least one live subscription
    pub fn tracked_types(&self) -> usize {
        self.counts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Alpha;
    struct Beta;

    #[test]
    fn test_increment_and_decrement() {
        let counts = RefCounts::new();
        let alpha = EventType::of::<Alpha>();

        assert_eq!(counts.count_of(alpha), 0);
        assert_eq!(counts.increment(alpha), 1);
        assert_eq!(counts.increment(alpha), 2);
        assert_eq!(counts.decrement(alpha), 1);
        assert_eq!(counts.count_of(alpha), 1);
        assert_eq!(counts.decrement(alpha), 0);
        assert_eq!(counts.tracked_types(), 0);
    }

    #[test]
    fn test_decrement_clamps_at_zero() {
        let counts = RefCounts::new();
        let alpha = EventType::of::<Alpha>();

        assert_eq!(counts.decrement(alpha), 0);
        assert_eq!(counts.count_of(alpha), 0);
        assert_eq!(counts.increment(alpha), 1);
    }

    #[test]
    fn test_types_are_independent() {
        let counts = RefCounts::new();
        let alpha = EventType::of::<Alpha>();
        let beta = EventType::of::<Beta>();

        counts.increment(alpha);
        assert_eq!(counts.count_of(beta), 0);
        counts.decrement(beta);
        assert_eq!(counts.count_of(alpha), 1);
    }

    #[test]
    fn test_resolve_recovers_type_name() {
        let counts = RefCounts::new();
        let erased: Box<dyn std::any::Any + Send + Sync> = Box::new(Alpha);
        let key = EventType::of_val(&*erased);

        assert_eq!(counts.resolve(key).name(), "<dyn Any>");
        counts.increment(EventType::of::<Alpha>());
        let resolved = counts.resolve(key);
        assert_eq!(resolved, key);
        assert!(resolved.name().ends_with("Alpha"));
    }

    #[test]
    fn test_concurrent_updates_balance() {
        let counts = RefCounts::new();
        let alpha = EventType::of::<Alpha>();
        let beta = EventType::of::<Beta>();

        thread::scope(|scope| {
            for i in 0..8 {
                let counts = &counts;
                let key = if i % 2 == 0 { alpha } else { beta };
                scope.spawn(move || {
                    for _ in 0..1_000 {
                        counts.increment(key);
                        assert!(counts.count_of(key) >= 1);
                        counts.decrement(key);
                    }
                });
            }
        });

        assert_eq!(counts.count_of(alpha), 0);
        assert_eq!(counts.count_of(beta), 0);
        assert_eq!(counts.tracked_types(), 0);
    }
}
