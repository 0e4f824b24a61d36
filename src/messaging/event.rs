use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker for values that can travel through the bus.
///
/// Implemented for every `Any + Send + Sync` type; there is no base type to
/// extend.
pub trait Event: Any + Send + Sync {}

impl<T: Any + Send + Sync> Event for T {}

/// Routing key for an event: its exact runtime type.
///
/// Equality and hashing use the [`TypeId`] only. The type name is kept for
/// diagnostics and may differ between compiler versions.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Key for the concrete type behind a type-erased value.
    ///
    /// The name of an erased value is not recoverable here, so it is reported
    /// as `"<dyn Any>"`; the id is exact. See [`RefCounts::resolve`].
    ///
    /// [`RefCounts::resolve`]: super::RefCounts::resolve
    pub fn of_val(value: &(dyn Any + Send + Sync)) -> Self {
        Self {
            id: value.type_id(),
            name: "<dyn Any>",
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Base;
    struct Derived(#[allow(dead_code)] Base);

    #[test]
    fn test_exact_type_keys() {
        assert_eq!(EventType::of::<Base>(), EventType::of::<Base>());
        assert_ne!(EventType::of::<Base>(), EventType::of::<Derived>());
        assert!(EventType::of::<Base>().name().ends_with("Base"));
    }

    #[test]
    fn test_of_val_uses_concrete_type() {
        let erased: Arc<dyn Any + Send + Sync> = Arc::new(Derived(Base));
        let key = EventType::of_val(&*erased);
        assert_eq!(key, EventType::of::<Derived>());
        assert_eq!(key.id(), TypeId::of::<Derived>());
        assert_eq!(key.name(), "<dyn Any>");
        assert_ne!(key, EventType::of::<Arc<dyn Any + Send + Sync>>());
    }
}
