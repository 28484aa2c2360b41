//! Binary stream framing for typebus.
//!
//! Every message is framed with:
//! - An optional 4-byte magic prefix (`"SUB0"` by default) for stream
//!   synchronization
//! - An 8-byte header: type id + payload length, native byte order
//! - Exactly `payload length` raw payload bytes
//! - An optional 1-byte delimiter postfix
//!
//! The [`FrameDecoder`] is a non-blocking state machine: it consumes
//! whatever the source has ready, retains partial progress across calls, and
//! hands completed payloads to buffers looked up in a sorted
//! [`BufferRegistry`]. The forwarding adapters in [`forward`] connect the
//! framing layer to `typebus-core` channels so that two buses can exchange
//! typed values over any byte stream.

pub mod codec;
pub mod decoder;
pub mod error;
pub mod forward;
pub mod io;
pub mod payload;
pub mod registry;
pub mod stream;

pub use codec::{encode_frame, FrameHeader, WireConfig, HEADER_SIZE, MAGIC};
pub use decoder::{DecodeState, FrameDecoder};
pub use error::{FrameError, Result};
pub use forward::{ForwardPublisher, ForwardSubscriber};
pub use io::{ByteSink, ByteSource, IoSink, IoSource};
pub use payload::Payload;
pub use registry::{BufferRegistry, HeaderValidator, PayloadSlot, DEFAULT_REGISTRY_CAPACITY};
pub use stream::{StreamDeserializer, StreamSerializer};
