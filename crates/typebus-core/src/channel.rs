use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{BusError, Result};
use crate::key::{type_hash, TypeKey};

/// Default bound for a channel's subscriber table.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 8;

/// Identifies one registration slot within a channel.
pub type SlotId = u64;

/// A typed receiver registered on a channel.
///
/// `accepts` is an optional filter predicate evaluated before every delivery;
/// the default accepts everything.
pub trait Receive<T> {
    /// Handle one published value.
    fn receive(&self, value: &T);

    /// Filter predicate — return false to skip delivery of `value`.
    fn accepts(&self, _value: &T) -> bool {
        true
    }
}

/// Per-payload-type routing table.
///
/// One channel exists per payload type and [`Bus`](crate::Bus); it owns the
/// ordered, bounded subscriber list and the type's wire identity. Interior
/// mutability is `RefCell` — the whole core assumes a single logical thread
/// of control.
pub struct Channel<T> {
    state: RefCell<State<T>>,
}

struct State<T> {
    subscribers: Vec<Slot<T>>,
    capacity: usize,
    key: Option<TypeKey>,
    next_slot: SlotId,
}

struct Slot<T> {
    id: SlotId,
    receiver: Rc<dyn Receive<T>>,
}

impl<T> Channel<T> {
    /// Create a channel with the default subscriber capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Create a channel with an explicit subscriber capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RefCell::new(State {
                subscribers: Vec::with_capacity(capacity),
                capacity,
                key: None,
                next_slot: 0,
            }),
        }
    }

    /// Append a receiver to the subscriber table, in call order.
    ///
    /// Fails with [`BusError::SubscriberCapacity`] when the table is full —
    /// a fatal configuration condition, not recoverable at runtime.
    pub fn register(&self, receiver: Rc<dyn Receive<T>>) -> Result<SlotId> {
        let mut state = self.state.borrow_mut();
        if state.subscribers.len() >= state.capacity {
            return Err(BusError::SubscriberCapacity {
                type_name: display_name(&state),
                capacity: state.capacity,
            });
        }
        let id = state.next_slot;
        state.next_slot += 1;
        state.subscribers.push(Slot { id, receiver });
        tracing::debug!(
            type_name = display_name(&state),
            slot = id,
            count = state.subscribers.len(),
            "subscriber registered"
        );
        Ok(id)
    }

    /// Remove exactly the one matching registration.
    ///
    /// Zero matches is [`BusError::NotRegistered`]; more than one breaks the
    /// exactly-once table invariant and is [`BusError::DuplicateRegistration`].
    pub fn unregister(&self, slot: SlotId) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let matches = state.subscribers.iter().filter(|s| s.id == slot).count();
        match matches {
            1 => {
                state.subscribers.retain(|s| s.id != slot);
                tracing::debug!(
                    type_name = display_name(&state),
                    slot,
                    count = state.subscribers.len(),
                    "subscriber unregistered"
                );
                Ok(())
            }
            0 => Err(BusError::NotRegistered {
                type_name: display_name(&state),
            }),
            count => Err(BusError::DuplicateRegistration {
                type_name: display_name(&state),
                count,
            }),
        }
    }

    /// Deliver `value` to every registered subscriber, in registration order.
    ///
    /// For each subscriber, `accepts(value)` is consulted first; `receive` is
    /// invoked exactly once for each accepting subscriber. The table is
    /// snapshotted before delivery, so receivers may publish to other
    /// channels; registration changes during an in-flight publish are out of
    /// scope (single-threaded, non-reentrant assumption).
    pub fn publish(&self, value: &T) {
        let snapshot: Vec<Rc<dyn Receive<T>>> = {
            let state = self.state.borrow();
            state
                .subscribers
                .iter()
                .map(|s| Rc::clone(&s.receiver))
                .collect()
        };
        tracing::trace!(subscribers = snapshot.len(), "publish");
        for receiver in snapshot {
            if receiver.accepts(value) {
                receiver.receive(value);
            }
        }
    }

    /// Set the channel's wire identity. Idempotent, first call wins; a later
    /// call with a different key is a configuration error.
    pub fn set_type_key(&self, key: TypeKey) -> Result<()> {
        let mut state = self.state.borrow_mut();
        match state.key {
            None => {
                state.key = Some(key);
                Ok(())
            }
            Some(existing) if existing == key => Ok(()),
            Some(existing) => Err(BusError::TypeKeyConflict {
                type_name: display_name(&state),
                existing: existing.id(),
                requested: key.id(),
            }),
        }
    }

    /// The stored key, if one was assigned.
    pub fn type_key(&self) -> Option<TypeKey> {
        self.state.borrow().key
    }

    /// Numeric type id: the assigned key's id, or a djb2 hash of the Rust
    /// type name when no key was set. The fallback is not portable across
    /// compilers and is intended for in-process use only.
    pub fn type_id(&self) -> u32 {
        self.state
            .borrow()
            .key
            .map(|k| k.id())
            .unwrap_or_else(|| type_hash(std::any::type_name::<T>()))
    }

    /// Display name: the assigned key's name, or the Rust type name.
    pub fn type_name(&self) -> &'static str {
        display_name(&self.state.borrow())
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }

    /// Fixed subscriber capacity.
    pub fn capacity(&self) -> usize {
        self.state.borrow().capacity
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name<T>(state: &State<T>) -> &'static str {
    state
        .key
        .and_then(|k| k.name())
        .unwrap_or_else(std::any::type_name::<T>)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        seen: Rc<RefCell<Vec<f32>>>,
        tag: f32,
    }

    impl Receive<f32> for Recorder {
        fn receive(&self, value: &f32) {
            self.seen.borrow_mut().push(self.tag + value);
        }
    }

    struct Positive {
        seen: Rc<RefCell<Vec<i32>>>,
    }

    impl Receive<i32> for Positive {
        fn receive(&self, value: &i32) {
            self.seen.borrow_mut().push(*value);
        }

        fn accepts(&self, value: &i32) -> bool {
            *value > 0
        }
    }

    #[test]
    fn fan_out_preserves_registration_order() {
        let channel = Channel::<f32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        // Tags 100/200 make delivery order observable in the log.
        channel
            .register(Rc::new(Recorder {
                seen: Rc::clone(&seen),
                tag: 100.0,
            }))
            .unwrap();
        channel
            .register(Rc::new(Recorder {
                seen: Rc::clone(&seen),
                tag: 200.0,
            }))
            .unwrap();

        channel.publish(&21.5);
        channel.publish(&-3.0);

        assert_eq!(*seen.borrow(), vec![121.5, 221.5, 97.0, 197.0]);
    }

    #[test]
    fn filter_skips_non_matching_values() {
        let channel = Channel::<i32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        channel
            .register(Rc::new(Positive {
                seen: Rc::clone(&seen),
            }))
            .unwrap();

        channel.publish(&-1);
        channel.publish(&5);
        channel.publish(&0);
        channel.publish(&9);

        assert_eq!(*seen.borrow(), vec![5, 9]);
    }

    #[test]
    fn capacity_plus_one_registration_fails() {
        let channel = Channel::<u8>::with_capacity(3);
        for _ in 0..3 {
            channel.register(Rc::new(Ignore)).unwrap();
        }
        let err = channel.register(Rc::new(Ignore)).unwrap_err();
        assert!(matches!(
            err,
            BusError::SubscriberCapacity { capacity: 3, .. }
        ));
        assert_eq!(channel.subscriber_count(), 3);
    }

    struct Ignore;

    impl Receive<u8> for Ignore {
        fn receive(&self, _value: &u8) {}
    }

    #[test]
    fn unregister_removes_exactly_one() {
        let channel = Channel::<u8>::new();
        let a = channel.register(Rc::new(Ignore)).unwrap();
        let b = channel.register(Rc::new(Ignore)).unwrap();
        assert_ne!(a, b);
        assert_eq!(channel.subscriber_count(), 2);

        channel.unregister(a).unwrap();
        assert_eq!(channel.subscriber_count(), 1);

        let err = channel.unregister(a).unwrap_err();
        assert!(matches!(err, BusError::NotRegistered { .. }));
    }

    #[test]
    fn unregistered_subscriber_no_longer_receives() {
        let channel = Channel::<i32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let slot = channel
            .register(Rc::new(Positive {
                seen: Rc::clone(&seen),
            }))
            .unwrap();

        channel.publish(&1);
        channel.unregister(slot).unwrap();
        channel.publish(&2);

        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn type_key_is_first_call_wins() {
        let channel = Channel::<f32>::new();
        let key = TypeKey::named("Temperature");
        channel.set_type_key(key).unwrap();
        // Re-assigning the same key is a no-op.
        channel.set_type_key(key).unwrap();
        assert_eq!(channel.type_key(), Some(key));
        assert_eq!(channel.type_id(), key.id());
        assert_eq!(channel.type_name(), "Temperature");

        let err = channel
            .set_type_key(TypeKey::named("Pressure"))
            .unwrap_err();
        assert!(matches!(err, BusError::TypeKeyConflict { .. }));
        // Stored identity is unchanged after a rejected assignment.
        assert_eq!(channel.type_key(), Some(key));
    }

    #[test]
    fn anonymous_channel_hashes_rust_type_name() {
        let channel = Channel::<f32>::new();
        assert_eq!(channel.type_id(), type_hash(std::any::type_name::<f32>()));
        assert_eq!(channel.type_name(), std::any::type_name::<f32>());
    }
}
