//! Type-routed publish/subscribe core.
//!
//! Values are routed by their Rust type: every payload type `T` gets one
//! shared [`Channel<T>`] per [`Bus`], holding a bounded, ordered subscriber
//! table. Publishers and subscribers are thin handles bound to exactly one
//! channel at construction.
//!
//! The model is single-threaded and cooperative — no locks, no background
//! tasks. All capacities are fixed up front; exceeding one is a hard
//! configuration error, not a transient condition.

pub mod bus;
pub mod channel;
pub mod error;
pub mod handles;
pub mod key;

pub use bus::Bus;
pub use channel::{Channel, Receive, SlotId, DEFAULT_SUBSCRIBER_CAPACITY};
pub use error::{BusError, Result};
pub use handles::{FnReceiver, Publisher, Subscriber};
pub use key::{type_hash, TypeKey};
