use std::rc::Rc;

use bytes::BytesMut;

use crate::codec::{encode_frame, WireConfig};
use crate::decoder::{DecodeState, FrameDecoder};
use crate::error::{FrameError, Result};
use crate::io::{ByteSink, ByteSource};
use crate::payload::Payload;
use crate::registry::{BufferRegistry, PayloadSlot};

const STAGING_CAPACITY: usize = 256;

/// Serializes typed values onto a byte sink, one frame per value.
pub struct StreamSerializer<S: ByteSink> {
    sink: S,
    config: WireConfig,
    staging: BytesMut,
}

impl<S: ByteSink> StreamSerializer<S> {
    /// Serializer with the default wire layout.
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, WireConfig::default())
    }

    /// Serializer with an explicit wire layout.
    pub fn with_config(sink: S, config: WireConfig) -> Self {
        Self {
            sink,
            config,
            staging: BytesMut::with_capacity(STAGING_CAPACITY),
        }
    }

    /// Encode one value as a frame and flush it to the sink.
    pub fn serialize<T: Payload>(&mut self, type_id: u32, value: &T) -> Result<()> {
        self.staging.clear();
        self.staging.resize(T::SIZE, 0);
        value.write_to(&mut self.staging);
        encode_frame(&self.config, type_id, &self.staging, &mut self.sink)?;
        self.sink.flush()?;
        Ok(())
    }

    /// Push any buffered bytes through to the destination.
    pub fn close(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Wire layout in use.
    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the serializer and return the sink.
    pub fn into_inner(self) -> S {
        self.sink
    }
}

/// Drives a [`FrameDecoder`] against a byte source.
///
/// Owns the decoder (and through it the buffer registry). Buffers are
/// registered up front via [`set_data_publisher`](Self::set_data_publisher);
/// once [`update`](Self::update) has run, further registration is a usage
/// error until [`close`](Self::close) re-opens the window for a new stream.
pub struct StreamDeserializer<S: ByteSource> {
    source: S,
    decoder: FrameDecoder,
    started: bool,
}

impl<S: ByteSource> StreamDeserializer<S> {
    /// Deserializer with the default wire layout and an empty registry.
    pub fn new(source: S) -> Self {
        Self::with_config(source, WireConfig::default())
    }

    /// Deserializer with an explicit wire layout.
    pub fn with_config(source: S, config: WireConfig) -> Self {
        Self::with_decoder(source, FrameDecoder::with_config(config, BufferRegistry::new()))
    }

    /// Deserializer around a pre-configured decoder.
    pub fn with_decoder(source: S, decoder: FrameDecoder) -> Self {
        Self {
            source,
            decoder,
            started: false,
        }
    }

    /// Pre-register payload storage plus its completion callback.
    ///
    /// Must be called before decoding begins; registering once `update` has
    /// run is [`FrameError::RegistrationAfterStart`].
    pub fn set_data_publisher(&mut self, slot: Rc<dyn PayloadSlot>) -> Result<()> {
        if self.started {
            return Err(FrameError::RegistrationAfterStart);
        }
        self.decoder.registry_mut().set(slot)
    }

    /// Drive one decode attempt; true when a full message completed.
    pub fn update(&mut self) -> Result<bool> {
        self.started = true;
        self.decoder.drive(&mut self.source)
    }

    /// Rescan for the next frame prefix after sync loss.
    pub fn resync(&mut self) -> Result<bool> {
        self.decoder.resync(&mut self.source)
    }

    /// Discard partial progress and return to a frame boundary.
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    /// End the current stream: clears transient decode state and re-opens
    /// buffer registration. The registry table itself persists.
    pub fn close(&mut self) {
        self.decoder.reset();
        self.started = false;
    }

    /// Current decoder position.
    pub fn state(&self) -> DecodeState {
        self.decoder.state()
    }

    /// The owned decoder.
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// True once the source has definitively ended.
    pub fn is_eof(&self) -> bool {
        self.source.is_eof()
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::io::IoSource;
    use crate::registry::tests::TestSlot;

    #[test]
    fn serialized_frames_decode_back() {
        let mut serializer = StreamSerializer::new(Vec::new());
        serializer.serialize(11, &21.5f32).unwrap();
        serializer.serialize(11, &-4.25f32).unwrap();
        let wire = serializer.into_inner();

        let slot = TestSlot::new(11, 4);
        let mut deserializer = StreamDeserializer::new(IoSource::new(Cursor::new(wire)));
        deserializer
            .set_data_publisher(Rc::clone(&slot) as Rc<dyn PayloadSlot>)
            .unwrap();

        assert!(deserializer.update().unwrap());
        assert_eq!(f32::read_from(&slot.data.borrow()), 21.5);
        assert!(deserializer.update().unwrap());
        assert_eq!(f32::read_from(&slot.data.borrow()), -4.25);
        assert!(!deserializer.update().unwrap());
        assert!(deserializer.is_eof());
    }

    #[test]
    fn registration_after_first_update_is_rejected() {
        let mut deserializer = StreamDeserializer::new(IoSource::new(Cursor::new(Vec::new())));
        deserializer
            .set_data_publisher(TestSlot::new(1, 4))
            .unwrap();

        assert!(!deserializer.update().unwrap());

        let err = deserializer
            .set_data_publisher(TestSlot::new(2, 4))
            .unwrap_err();
        assert!(matches!(err, FrameError::RegistrationAfterStart));
    }

    #[test]
    fn close_reopens_registration_and_keeps_the_table() {
        let mut deserializer = StreamDeserializer::new(IoSource::new(Cursor::new(Vec::new())));
        deserializer
            .set_data_publisher(TestSlot::new(1, 4))
            .unwrap();
        let _ = deserializer.update().unwrap();

        deserializer.close();
        deserializer
            .set_data_publisher(TestSlot::new(2, 4))
            .unwrap();
        assert_eq!(deserializer.decoder().registry().type_ids(), vec![1, 2]);
    }

    #[test]
    fn update_reports_incomplete_on_a_dry_source() {
        let slot = TestSlot::new(1, 4);
        // Half a frame: prefix only.
        let mut deserializer =
            StreamDeserializer::new(IoSource::new(Cursor::new(b"SUB0".to_vec())));
        deserializer.set_data_publisher(slot).unwrap();

        assert!(!deserializer.update().unwrap());
        assert_eq!(deserializer.state(), DecodeState::Header);
        // Partial progress is retained; a second call is still incomplete.
        assert!(!deserializer.update().unwrap());
    }

    #[test]
    fn serializer_close_flushes_the_sink() {
        struct CountingSink {
            flushes: u32,
        }

        impl ByteSink for CountingSink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                self.flushes += 1;
                Ok(())
            }
        }

        let mut serializer = StreamSerializer::new(CountingSink { flushes: 0 });
        serializer.serialize(1, &1u8).unwrap();
        serializer.close().unwrap();
        assert_eq!(serializer.get_ref().flushes, 2);
    }
}
