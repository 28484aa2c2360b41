//! Forwarding adapters bridging typed pub/sub handles to the framing layer.
//!
//! [`ForwardSubscriber`] turns local publishes into wire frames;
//! [`ForwardPublisher`] turns decoded wire frames into local publishes.
//! Together they let two buses exchange values over any byte stream.

use std::cell::RefCell;
use std::rc::Rc;

use typebus_core::{Bus, Channel, Publisher, Receive, Subscriber, TypeKey};

use crate::error::{FrameError, Result};
use crate::io::{ByteSink, ByteSource};
use crate::payload::Payload;
use crate::registry::PayloadSlot;
use crate::stream::{StreamDeserializer, StreamSerializer};

/// Subscriber variant that hands every received value straight to a shared
/// [`StreamSerializer`].
///
/// Encode failures cannot propagate through fan-out, so they are logged and
/// retained; [`take_error`](Self::take_error) surfaces the most recent one.
pub struct ForwardSubscriber<T: Payload> {
    _subscriber: Subscriber<T>,
    last_error: Rc<RefCell<Option<FrameError>>>,
}

impl<T: Payload> ForwardSubscriber<T> {
    /// Subscribe on the bus and forward every `T` into `serializer`.
    pub fn new<S: ByteSink + 'static>(
        bus: &Bus,
        serializer: Rc<RefCell<StreamSerializer<S>>>,
    ) -> Result<Self> {
        let channel = bus.channel::<T>();
        Self::bind(bus, channel, serializer)
    }

    /// Subscribe, assigning the channel's wire identity first.
    pub fn with_key<S: ByteSink + 'static>(
        bus: &Bus,
        key: TypeKey,
        serializer: Rc<RefCell<StreamSerializer<S>>>,
    ) -> Result<Self> {
        let channel = bus.channel::<T>();
        channel.set_type_key(key)?;
        Self::bind(bus, channel, serializer)
    }

    fn bind<S: ByteSink + 'static>(
        bus: &Bus,
        channel: Rc<Channel<T>>,
        serializer: Rc<RefCell<StreamSerializer<S>>>,
    ) -> Result<Self> {
        let last_error = Rc::new(RefCell::new(None));
        let receiver = SerializeForward {
            channel,
            serializer,
            last_error: Rc::clone(&last_error),
        };
        let subscriber = Subscriber::new(bus, Rc::new(receiver))?;
        Ok(Self {
            _subscriber: subscriber,
            last_error,
        })
    }

    /// The most recent encode failure, if any, clearing it.
    pub fn take_error(&self) -> Option<FrameError> {
        self.last_error.borrow_mut().take()
    }
}

struct SerializeForward<T: Payload, S: ByteSink> {
    channel: Rc<Channel<T>>,
    serializer: Rc<RefCell<StreamSerializer<S>>>,
    last_error: Rc<RefCell<Option<FrameError>>>,
}

impl<T: Payload, S: ByteSink> Receive<T> for SerializeForward<T, S> {
    fn receive(&self, value: &T) {
        let result = self
            .serializer
            .borrow_mut()
            .serialize(self.channel.type_id(), value);
        if let Err(err) = result {
            tracing::error!(
                error = %err,
                type_name = self.channel.type_name(),
                "forwarding publish to stream failed"
            );
            *self.last_error.borrow_mut() = Some(err);
        }
    }
}

/// Publisher variant fed by a decoder.
///
/// Owns a private `T::SIZE`-byte buffer registered with a deserializer's
/// buffer registry at construction; when the decoder finishes filling it,
/// the buffer's contents are published through normal channel fan-out.
pub struct ForwardPublisher<T: Payload> {
    slot: Rc<PublishSlot<T>>,
}

impl<T: Payload> ForwardPublisher<T> {
    /// Register a decode buffer for `T` with `deserializer`.
    pub fn new<S: ByteSource>(bus: &Bus, deserializer: &mut StreamDeserializer<S>) -> Result<Self> {
        Self::bind(Publisher::new(bus), deserializer)
    }

    /// Register a decode buffer, assigning the channel's wire identity first.
    pub fn with_key<S: ByteSource>(
        bus: &Bus,
        key: TypeKey,
        deserializer: &mut StreamDeserializer<S>,
    ) -> Result<Self> {
        Self::bind(Publisher::with_key(bus, key)?, deserializer)
    }

    fn bind<S: ByteSource>(
        publisher: Publisher<T>,
        deserializer: &mut StreamDeserializer<S>,
    ) -> Result<Self> {
        let slot = Rc::new(PublishSlot {
            publisher,
            bytes: RefCell::new(vec![0u8; T::SIZE].into_boxed_slice()),
        });
        deserializer.set_data_publisher(Rc::clone(&slot) as Rc<dyn PayloadSlot>)?;
        Ok(Self { slot })
    }

    /// Wire identity this adapter decodes.
    pub fn type_id(&self) -> u32 {
        self.slot.publisher.type_id()
    }
}

struct PublishSlot<T: Payload> {
    publisher: Publisher<T>,
    bytes: RefCell<Box<[u8]>>,
}

impl<T: Payload> PayloadSlot for PublishSlot<T> {
    fn type_id(&self) -> u32 {
        self.publisher.type_id()
    }

    fn payload_bytes(&self) -> usize {
        T::SIZE
    }

    fn fill(&self, offset: usize, bytes: &[u8]) {
        self.bytes.borrow_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn complete(&self) {
        // Release the borrow before fan-out: a receiver may publish further.
        let value = T::read_from(&self.bytes.borrow());
        self.publisher.publish(&value);
    }
}
