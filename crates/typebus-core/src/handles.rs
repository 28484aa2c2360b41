use std::rc::Rc;

use crate::bus::Bus;
use crate::channel::{Channel, Receive, SlotId};
use crate::error::Result;
use crate::key::TypeKey;

/// Typed publishing handle, bound to one channel at construction.
///
/// Publishers are existence-checked at construction only; the channel keeps
/// no publisher list, and any number of publishers may coexist.
pub struct Publisher<T: 'static> {
    channel: Rc<Channel<T>>,
}

impl<T: 'static> Publisher<T> {
    /// Bind a publisher to the bus's channel for `T`.
    pub fn new(bus: &Bus) -> Self {
        let channel = bus.channel::<T>();
        tracing::debug!(type_name = channel.type_name(), "publisher bound");
        Self { channel }
    }

    /// Bind a publisher and assign the channel's wire identity.
    pub fn with_key(bus: &Bus, key: TypeKey) -> Result<Self> {
        let channel = bus.channel::<T>();
        channel.set_type_key(key)?;
        tracing::debug!(type_name = channel.type_name(), "publisher bound");
        Ok(Self { channel })
    }

    /// Fan `value` out to every matching subscriber of `T`.
    pub fn publish(&self, value: &T) {
        self.channel.publish(value);
    }

    /// Wire identity of the published type.
    pub fn type_id(&self) -> u32 {
        self.channel.type_id()
    }

    /// Display name of the published type.
    pub fn type_name(&self) -> &'static str {
        self.channel.type_name()
    }

    /// The channel this handle is bound to.
    pub fn channel(&self) -> &Rc<Channel<T>> {
        &self.channel
    }
}

/// Typed subscription handle.
///
/// Registers its receiver on construction and unregisters on drop —
/// synchronously and immediately, so no in-flight fan-out can reach the
/// receiver after the handle is gone.
pub struct Subscriber<T: 'static> {
    channel: Rc<Channel<T>>,
    slot: SlotId,
}

impl<T: 'static> Subscriber<T> {
    /// Register `receiver` on the bus's channel for `T`.
    pub fn new(bus: &Bus, receiver: Rc<dyn Receive<T>>) -> Result<Self> {
        let channel = bus.channel::<T>();
        let slot = channel.register(receiver)?;
        Ok(Self { channel, slot })
    }

    /// Register `receiver` and assign the channel's wire identity.
    pub fn with_key(bus: &Bus, key: TypeKey, receiver: Rc<dyn Receive<T>>) -> Result<Self> {
        let channel = bus.channel::<T>();
        channel.set_type_key(key)?;
        let slot = channel.register(receiver)?;
        Ok(Self { channel, slot })
    }

    /// Register a closure as the receiver (accepts every value).
    pub fn from_fn(bus: &Bus, on_value: impl Fn(&T) + 'static) -> Result<Self> {
        Self::new(bus, Rc::new(FnReceiver::new(on_value)))
    }

    /// Wire identity of the subscribed type.
    pub fn type_id(&self) -> u32 {
        self.channel.type_id()
    }

    /// Display name of the subscribed type.
    pub fn type_name(&self) -> &'static str {
        self.channel.type_name()
    }

    /// The channel this handle is bound to.
    pub fn channel(&self) -> &Rc<Channel<T>> {
        &self.channel
    }
}

impl<T: 'static> Drop for Subscriber<T> {
    fn drop(&mut self) {
        // The slot was handed out by register(), so failure here means the
        // table invariant broke. Drop cannot propagate, so report loudly.
        if let Err(err) = self.channel.unregister(self.slot) {
            tracing::error!(error = %err, "subscriber drop failed to unregister");
            debug_assert!(false, "subscriber drop failed to unregister: {err}");
        }
    }
}

/// Closure-backed [`Receive`] implementation with an optional filter.
pub struct FnReceiver<T> {
    on_value: Box<dyn Fn(&T)>,
    filter: Option<Box<dyn Fn(&T) -> bool>>,
}

impl<T> FnReceiver<T> {
    /// Receiver that accepts every value.
    pub fn new(on_value: impl Fn(&T) + 'static) -> Self {
        Self {
            on_value: Box::new(on_value),
            filter: None,
        }
    }

    /// Receiver gated by a filter predicate.
    pub fn with_filter(filter: impl Fn(&T) -> bool + 'static, on_value: impl Fn(&T) + 'static) -> Self {
        Self {
            on_value: Box::new(on_value),
            filter: Some(Box::new(filter)),
        }
    }
}

impl<T> Receive<T> for FnReceiver<T> {
    fn receive(&self, value: &T) {
        (self.on_value)(value);
    }

    fn accepts(&self, value: &T) -> bool {
        self.filter.as_ref().map_or(true, |f| f(value))
    }
}
