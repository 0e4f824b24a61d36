//! Type-routed event bus.
//!
//! ```text
//! subscribe::<E>(h) ── increment(E) ──► RefCounts
//!        └──────────── attach(Dispatch<E>) ──► Multicast<Envelope>
//!
//! post(e) ──► Multicast::publish ──► Dispatch<A> (drops: type mismatch)
//!   │                           └──► Dispatch<E> ──► inline h(e) | executor queue
//!   └──► RefCounts::count_of(E) == 0 ? on_unhandled(e)
//!
//! Subscription::cancel ── close ──► detach ──► decrement(E)   (once)
//! ```

mod bus;
mod channel;
mod dispatch;
mod event;
mod ref_count;
mod subscription;

pub use bus::EventBus;
pub use channel::{Multicast, Observer, ObserverId};
pub use dispatch::Payload;
pub use event::{Event, EventType};
pub use ref_count::RefCounts;
pub use subscription::{Subscription, SubscriptionSet};
