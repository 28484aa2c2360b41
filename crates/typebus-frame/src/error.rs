use typebus_core::BusError;

/// Errors raised while encoding or decoding frames.
///
/// Protocol variants (`InvalidPrefix`, `InvalidPostfix`, `UnknownTypeId`,
/// `PayloadSizeMismatch`, `HeaderRejected`) leave the decoder in the
/// `SyncLost` state; configuration and usage variants are raised at setup
/// time and never auto-recovered.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The bytes at a frame boundary did not match the magic prefix.
    #[error("invalid frame prefix {found:02x?} (expected {expected:02x?})")]
    InvalidPrefix { expected: [u8; 4], found: [u8; 4] },

    /// The frame delimiter byte did not match the configured postfix.
    #[error("invalid frame postfix {found:#04x} (expected {expected:#04x})")]
    InvalidPostfix { expected: u8, found: u8 },

    /// The header's type id has no registered buffer.
    #[error("unknown type id {0:#010x}")]
    UnknownTypeId(u32),

    /// The header's declared size does not equal the registered buffer size
    /// plus the slot's registered padding.
    #[error("payload size mismatch for type {type_id:#010x}: frame declares {declared} bytes, registration expects {expected}")]
    PayloadSizeMismatch {
        type_id: u32,
        declared: usize,
        expected: usize,
    },

    /// The payload cannot be described by the 4-byte header length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The registry's header validation hook rejected the header.
    #[error("header rejected by registry validator (type {type_id:#010x})")]
    HeaderRejected { type_id: u32 },

    /// The buffer registry's bounded table is full.
    #[error("buffer registry full ({capacity} entries)")]
    RegistryFull { capacity: usize },

    /// A buffer was registered after decoding had already started.
    #[error("buffer registered after decoding started")]
    RegistrationAfterStart,

    /// The decoder lost synchronization; reset or resync before driving it.
    #[error("decoder out of sync; call reset() or resync()")]
    SyncLost,

    /// Resynchronization needs a prefix constant to scan for.
    #[error("resync requires a configured frame prefix")]
    ResyncUnsupported,

    /// The sink accepted zero bytes mid-frame.
    #[error("sink closed (zero-length write)")]
    SinkClosed,

    /// An I/O error from the byte source or sink.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the pub/sub core raised inside a forwarding adapter.
    #[error(transparent)]
    Bus(#[from] BusError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
