use crate::error::{FrameError, Result};
use crate::io::ByteSink;

/// Default magic prefix marking a frame boundary.
pub const MAGIC: [u8; 4] = *b"SUB0";

/// Header size on the wire: type id (4) + payload length (4).
pub const HEADER_SIZE: usize = 8;

/// Frame header: the payload's type identity and byte length.
///
/// Integers cross the wire in the producer's native byte order — no endian
/// normalization is performed. Matching endianness between producer and
/// consumer is a deployment constraint, not something this layer checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Type identity of the payload (see [`typebus_core::TypeKey`]).
    pub type_id: u32,
    /// Count of payload bytes that follow the header.
    pub payload_bytes: u32,
}

impl FrameHeader {
    pub fn new(type_id: u32, payload_bytes: u32) -> Self {
        Self {
            type_id,
            payload_bytes,
        }
    }

    /// Native-order wire encoding.
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(&self.type_id.to_ne_bytes());
        out[4..].copy_from_slice(&self.payload_bytes.to_ne_bytes());
        out
    }

    /// Decode from native-order wire bytes.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            type_id: u32::from_ne_bytes(bytes[..4].try_into().unwrap()),
            payload_bytes: u32::from_ne_bytes(bytes[4..].try_into().unwrap()),
        }
    }
}

/// Frame layout configuration.
///
/// Wire format:
/// ```text
/// ┌─────────────┬──────────────┬───────────────┬──────────────┬─────────────┐
/// │ Prefix (4B) │ TypeId (4B)  │ Length (4B)   │ Payload      │ Postfix(1B) │
/// │ optional    │ native order │ native order  │ Length bytes │ optional    │
/// └─────────────┴──────────────┴───────────────┴──────────────┴─────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireConfig {
    /// Fixed magic constant at the start of every frame, if any.
    pub prefix: Option<[u8; 4]>,
    /// Fixed delimiter byte at the end of every frame, if any.
    pub postfix: Option<u8>,
}

impl WireConfig {
    /// No prefix, no postfix: header + payload only.
    pub fn bare() -> Self {
        Self {
            prefix: None,
            postfix: None,
        }
    }

    pub(crate) fn prefix_len(&self) -> usize {
        self.prefix.map_or(0, |p| p.len())
    }

    pub(crate) fn postfix_len(&self) -> usize {
        usize::from(self.postfix.is_some())
    }

    /// Total wire size of a frame carrying `payload_bytes` of payload.
    pub fn frame_size(&self, payload_bytes: usize) -> usize {
        self.prefix_len() + HEADER_SIZE + payload_bytes + self.postfix_len()
    }
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            prefix: Some(MAGIC),
            postfix: None,
        }
    }
}

/// Encode one frame onto `sink`.
///
/// Writes prefix (if configured), header, payload, postfix (if configured),
/// in that order. Every step is checked; the first failing write aborts the
/// whole encode and nothing further is flushed.
pub fn encode_frame<S: ByteSink>(
    config: &WireConfig,
    type_id: u32,
    payload: &[u8],
    sink: &mut S,
) -> Result<()> {
    let payload_bytes = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;

    if let Some(prefix) = config.prefix {
        write_all(sink, &prefix)?;
    }
    write_all(sink, &FrameHeader::new(type_id, payload_bytes).to_bytes())?;
    write_all(sink, payload)?;
    if let Some(postfix) = config.postfix {
        write_all(sink, &[postfix])?;
    }
    Ok(())
}

pub(crate) fn write_all<S: ByteSink>(sink: &mut S, mut bytes: &[u8]) -> Result<()> {
    while !bytes.is_empty() {
        let written = sink.write(bytes)?;
        if written == 0 {
            return Err(FrameError::SinkClosed);
        }
        bytes = &bytes[written..];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrips_bit_identically() {
        let header = FrameHeader::new(0xDEAD_BEEF, 12);
        assert_eq!(FrameHeader::from_bytes(&header.to_bytes()), header);
    }

    #[test]
    fn header_uses_native_byte_order() {
        let header = FrameHeader::new(0x0102_0304, 0x0A0B_0C0D);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..4], &0x0102_0304u32.to_ne_bytes());
        assert_eq!(&bytes[4..], &0x0A0B_0C0Du32.to_ne_bytes());
    }

    #[test]
    fn default_layout_starts_with_magic() {
        let mut wire = Vec::new();
        encode_frame(&WireConfig::default(), 7, b"test", &mut wire).unwrap();

        assert_eq!(&wire[..4], b"SUB0");
        assert_eq!(wire.len(), WireConfig::default().frame_size(4));
        assert_eq!(&wire[4..8], &7u32.to_ne_bytes());
        assert_eq!(&wire[8..12], &4u32.to_ne_bytes());
        assert_eq!(&wire[12..], b"test");
    }

    #[test]
    fn bare_layout_is_header_plus_payload() {
        let mut wire = Vec::new();
        encode_frame(&WireConfig::bare(), 1, b"xy", &mut wire).unwrap();
        assert_eq!(wire.len(), HEADER_SIZE + 2);
        assert_eq!(&wire[..4], &1u32.to_ne_bytes());
    }

    #[test]
    fn postfix_terminates_the_frame() {
        let config = WireConfig {
            prefix: Some(MAGIC),
            postfix: Some(0x0A),
        };
        let mut wire = Vec::new();
        encode_frame(&config, 1, b"z", &mut wire).unwrap();
        assert_eq!(wire.last(), Some(&0x0A));
        assert_eq!(wire.len(), config.frame_size(1));
    }

    #[test]
    fn zero_length_write_aborts_encode() {
        struct ClosedSink;

        impl ByteSink for ClosedSink {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let err = encode_frame(&WireConfig::default(), 1, b"x", &mut ClosedSink).unwrap_err();
        assert!(matches!(err, FrameError::SinkClosed));
    }

    #[test]
    fn partial_writes_are_resumed() {
        struct OneByteSink(Vec<u8>);

        impl ByteSink for OneByteSink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.push(buf[0]);
                Ok(1)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut sink = OneByteSink(Vec::new());
        encode_frame(&WireConfig::default(), 3, b"ab", &mut sink).unwrap();

        let mut expected = Vec::new();
        encode_frame(&WireConfig::default(), 3, b"ab", &mut expected).unwrap();
        assert_eq!(sink.0, expected);
    }
}
