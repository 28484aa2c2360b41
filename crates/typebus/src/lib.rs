//! Type-routed publish/subscribe with binary stream framing.
//!
//! typebus routes strongly-typed values from publishers to subscribers
//! through shared per-type channels, and frames those values for transfer
//! across any byte stream — designed for resource-constrained, desktop, and
//! distributed deployments alike.
//!
//! # Crate Structure
//!
//! - [`bus`] — Typed channels, publisher/subscriber handles, type identity
//! - [`frame`] — Wire codec, streaming decoder, forwarding adapters

/// Re-export pub/sub core types.
pub mod bus {
    pub use typebus_core::*;
}

/// Re-export framing types.
pub mod frame {
    pub use typebus_frame::*;
}
