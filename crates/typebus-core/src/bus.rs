use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::channel::{Channel, DEFAULT_SUBSCRIBER_CAPACITY};

/// Process-wide channel registry, keyed by payload type.
///
/// Every publisher and subscriber of a type `T` created against the same bus
/// shares one [`Channel<T>`]. Channels are created lazily on first reference
/// and live for the bus lifetime. The bus is an explicit context object —
/// there is no implicit global state; callers that want process-wide sharing
/// construct one bus and pass it around.
pub struct Bus {
    channels: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
    subscriber_capacity: usize,
}

impl Bus {
    /// Bus whose channels use the default subscriber capacity.
    pub fn new() -> Self {
        Self::with_subscriber_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Bus whose lazily created channels use `capacity` subscriber slots.
    pub fn with_subscriber_capacity(capacity: usize) -> Self {
        Self {
            channels: RefCell::new(HashMap::new()),
            subscriber_capacity: capacity,
        }
    }

    /// The shared channel for payload type `T`, created on first reference.
    pub fn channel<T: 'static>(&self) -> Rc<Channel<T>> {
        let mut channels = self.channels.borrow_mut();
        let entry = channels.entry(TypeId::of::<T>()).or_insert_with(|| {
            tracing::debug!(
                type_name = std::any::type_name::<T>(),
                capacity = self.subscriber_capacity,
                "channel created"
            );
            Rc::new(Channel::<T>::with_capacity(self.subscriber_capacity)) as Rc<dyn Any>
        });
        Rc::clone(entry)
            .downcast::<Channel<T>>()
            .expect("bus entry is keyed by TypeId::of::<T>()")
    }

    /// Number of channels created so far.
    pub fn channel_count(&self) -> usize {
        self.channels.borrow().len()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_is_shared_per_type() {
        let bus = Bus::new();
        let a = bus.channel::<f32>();
        let b = bus.channel::<f32>();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(bus.channel_count(), 1);

        let _other = bus.channel::<u32>();
        assert_eq!(bus.channel_count(), 2);
    }

    #[test]
    fn separate_buses_do_not_share_channels() {
        let left = Bus::new();
        let right = Bus::new();
        assert!(!Rc::ptr_eq(&left.channel::<f32>(), &right.channel::<f32>()));
    }

    #[test]
    fn configured_capacity_applies_to_new_channels() {
        let bus = Bus::with_subscriber_capacity(2);
        assert_eq!(bus.channel::<f32>().capacity(), 2);
    }
}
