use std::rc::Rc;

use crate::codec::{FrameHeader, WireConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::io::ByteSource;
use crate::registry::{BufferRegistry, PayloadSlot};

const DATA_CHUNK: usize = 256;

/// Position of the decoder within the frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Consuming the fixed magic prefix (zero-length when not configured).
    Prefix,
    /// Consuming the type id + payload length header.
    Header,
    /// Filling the registered payload buffer, then discarding padding.
    Data,
    /// Consuming the fixed delimiter (zero-length when not configured).
    Postfix,
    /// Absorbing error state after a protocol violation; no further messages
    /// are produced until `reset` or `resync`.
    SyncLost,
}

/// Incremental frame decoder.
///
/// Consumes bytes from a [`ByteSource`] across arbitrarily short reads and
/// invokes the matching [`PayloadSlot`]'s completion once a whole frame has
/// been validated. The decoder never blocks: when the source has nothing
/// ready it reports "incomplete" and preserves all partial progress for the
/// next drive call.
pub struct FrameDecoder {
    config: WireConfig,
    registry: BufferRegistry,
    state: DecodeState,
    scratch: [u8; HEADER_SIZE],
    need: usize,
    filled: usize,
    pad_remaining: usize,
    slot: Option<Rc<dyn PayloadSlot>>,
    resync_matched: usize,
}

impl FrameDecoder {
    /// Decoder with the default wire layout and an empty registry.
    pub fn new() -> Self {
        Self::with_config(WireConfig::default(), BufferRegistry::new())
    }

    /// Decoder with an explicit layout and a pre-populated registry.
    pub fn with_config(config: WireConfig, registry: BufferRegistry) -> Self {
        Self {
            config,
            registry,
            state: DecodeState::Prefix,
            scratch: [0u8; HEADER_SIZE],
            need: config.prefix_len(),
            filled: 0,
            pad_remaining: 0,
            slot: None,
            resync_matched: 0,
        }
    }

    /// Consume whatever `source` has ready right now.
    ///
    /// Returns `Ok(true)` as soon as one full message has completed (so the
    /// caller can act on it before pumping again) and `Ok(false)` when the
    /// source has no more bytes ready. Protocol violations move the decoder
    /// into [`DecodeState::SyncLost`] and surface as errors; once there,
    /// every further call fails with [`FrameError::SyncLost`] until
    /// [`reset`](Self::reset) or [`resync`](Self::resync).
    pub fn drive<S: ByteSource>(&mut self, source: &mut S) -> Result<bool> {
        if self.state == DecodeState::SyncLost {
            return Err(FrameError::SyncLost);
        }
        loop {
            while self.filled < self.need {
                let got = self.read_step(source)?;
                if got == 0 {
                    return Ok(false);
                }
                self.filled += got;
            }
            while self.pad_remaining > 0 {
                let skipped = source.skip(self.pad_remaining)?;
                if skipped == 0 {
                    return Ok(false);
                }
                self.pad_remaining -= skipped;
            }
            if self.advance()? {
                return Ok(true);
            }
        }
    }

    /// Return to a clean frame boundary, discarding any partial progress.
    pub fn reset(&mut self) {
        self.slot = None;
        self.resync_matched = 0;
        self.enter(DecodeState::Prefix, self.config.prefix_len(), 0);
    }

    /// Rescan the source for the next frame prefix after sync loss.
    ///
    /// Consumes bytes until the full prefix constant has been matched, then
    /// resumes decoding at the header. Returns `Ok(false)` when the source
    /// runs dry mid-scan; the partial match is retained for the next call.
    /// Requires a configured prefix to scan for.
    pub fn resync<S: ByteSource>(&mut self, source: &mut S) -> Result<bool> {
        let Some(prefix) = self.config.prefix else {
            return Err(FrameError::ResyncUnsupported);
        };
        if self.state != DecodeState::SyncLost {
            // Scanning abandons any partial frame.
            self.state = DecodeState::SyncLost;
            self.slot = None;
        }
        let mut byte = [0u8; 1];
        loop {
            if source.read(&mut byte)? == 0 {
                return Ok(false);
            }
            if byte[0] == prefix[self.resync_matched] {
                self.resync_matched += 1;
                if self.resync_matched == prefix.len() {
                    self.resync_matched = 0;
                    self.enter(DecodeState::Header, HEADER_SIZE, 0);
                    tracing::debug!("resynchronized at next frame prefix");
                    return Ok(true);
                }
            } else {
                self.resync_matched = refit_match(&prefix, self.resync_matched, byte[0]);
            }
        }
    }

    /// Current state-machine position.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Wire layout this decoder expects.
    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    /// The type-id → buffer table.
    pub fn registry(&self) -> &BufferRegistry {
        &self.registry
    }

    /// Mutable access for buffer registration.
    pub fn registry_mut(&mut self) -> &mut BufferRegistry {
        &mut self.registry
    }

    fn read_step<S: ByteSource>(&mut self, source: &mut S) -> Result<usize> {
        match self.state {
            DecodeState::Data => {
                let mut chunk = [0u8; DATA_CHUNK];
                let want = (self.need - self.filled).min(DATA_CHUNK);
                let got = source.read(&mut chunk[..want])?;
                if got > 0 {
                    let slot = self.slot.as_ref().expect("slot is set on entry to Data");
                    slot.fill(self.filled, &chunk[..got]);
                }
                Ok(got)
            }
            _ => Ok(source.read(&mut self.scratch[self.filled..self.need])?),
        }
    }

    /// Validate the just-completed step and move to the next one. Returns
    /// true when a whole message finished (wrap back to `Prefix`).
    fn advance(&mut self) -> Result<bool> {
        match self.state {
            DecodeState::Prefix => {
                if let Some(expected) = self.config.prefix {
                    let found: [u8; 4] = self.scratch[..4].try_into().unwrap();
                    if found != expected {
                        return Err(self.sync_lost(FrameError::InvalidPrefix { expected, found }));
                    }
                }
                self.enter(DecodeState::Header, HEADER_SIZE, 0);
                Ok(false)
            }
            DecodeState::Header => {
                let header = FrameHeader::from_bytes(&self.scratch);
                if !self.registry.validate(&header) {
                    return Err(self.sync_lost(FrameError::HeaderRejected {
                        type_id: header.type_id,
                    }));
                }
                let Some(slot) = self.registry.find(header.type_id) else {
                    return Err(self.sync_lost(FrameError::UnknownTypeId(header.type_id)));
                };
                let declared = header.payload_bytes as usize;
                let registered = slot.payload_bytes();
                let padding = slot.padding_bytes();
                if declared != registered + padding {
                    return Err(self.sync_lost(FrameError::PayloadSizeMismatch {
                        type_id: header.type_id,
                        declared,
                        expected: registered + padding,
                    }));
                }
                self.slot = Some(slot);
                self.enter(DecodeState::Data, registered, padding);
                Ok(false)
            }
            DecodeState::Data => {
                self.enter(DecodeState::Postfix, self.config.postfix_len(), 0);
                Ok(false)
            }
            DecodeState::Postfix => {
                if let Some(expected) = self.config.postfix {
                    let found = self.scratch[0];
                    if found != expected {
                        return Err(self.sync_lost(FrameError::InvalidPostfix { expected, found }));
                    }
                }
                let slot = self.slot.take().expect("slot is set for the finished frame");
                slot.complete();
                self.enter(DecodeState::Prefix, self.config.prefix_len(), 0);
                Ok(true)
            }
            DecodeState::SyncLost => unreachable!("drive() rejects SyncLost before stepping"),
        }
    }

    fn enter(&mut self, state: DecodeState, need: usize, pad: usize) {
        self.state = state;
        self.need = need;
        self.filled = 0;
        self.pad_remaining = pad;
    }

    fn sync_lost(&mut self, err: FrameError) -> FrameError {
        tracing::warn!(error = %err, "protocol error, decoder out of sync");
        self.state = DecodeState::SyncLost;
        self.slot = None;
        err
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Longest prefix of `prefix` that is a suffix of the bytes scanned so far
/// (the `matched` already-verified prefix bytes plus the mismatching `byte`).
/// Keeps candidates alive when the prefix overlaps itself, e.g. scanning
/// "AAAAB" for "AAAB" must fall back to three matched bytes, not one.
fn refit_match(prefix: &[u8; 4], matched: usize, byte: u8) -> usize {
    let mut window = [0u8; 4];
    window[..matched].copy_from_slice(&prefix[..matched]);
    window[matched] = byte;
    let len = matched + 1;
    (1..len)
        .rev()
        .find(|&k| window[len - k..len] == prefix[..k])
        .unwrap_or(0)
}
