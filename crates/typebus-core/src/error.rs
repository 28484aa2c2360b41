/// Errors raised by the pub/sub core.
///
/// All variants are configuration or usage errors: they indicate a setup
/// mistake and are never auto-recovered at runtime.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The channel's bounded subscriber table is full.
    #[error("subscriber table full for {type_name} ({capacity} slots)")]
    SubscriberCapacity {
        type_name: &'static str,
        capacity: usize,
    },

    /// A later `set_type_key` call conflicts with the stored identity.
    #[error("conflicting type key for {type_name}: already {existing:#010x}, requested {requested:#010x}")]
    TypeKeyConflict {
        type_name: &'static str,
        existing: u32,
        requested: u32,
    },

    /// Unregistration found no matching subscriber entry.
    #[error("subscriber not registered on {type_name} channel")]
    NotRegistered { type_name: &'static str },

    /// Unregistration matched more than one entry — the table invariant
    /// (each subscriber appears exactly once) is broken.
    #[error("subscriber appears {count} times on {type_name} channel")]
    DuplicateRegistration {
        type_name: &'static str,
        count: usize,
    },
}

pub type Result<T> = std::result::Result<T, BusError>;
