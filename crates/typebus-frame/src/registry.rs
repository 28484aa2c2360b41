use std::rc::Rc;

use crate::codec::FrameHeader;
use crate::error::{FrameError, Result};

/// Default bound for the buffer registry table.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 32;

/// Destination storage for one payload type during decoding.
///
/// The decoder fills the slot incrementally as bytes arrive and calls
/// [`complete`](PayloadSlot::complete) once the payload (and any trailing
/// padding) has been fully consumed.
pub trait PayloadSlot {
    /// Type identity this slot stores payloads for.
    fn type_id(&self) -> u32;

    /// Registered payload size in bytes.
    fn payload_bytes(&self) -> usize;

    /// Trailing padding bytes declared at registration. Frames for this slot
    /// must carry exactly `payload_bytes() + padding_bytes()` data bytes; the
    /// padding is discarded after the payload fills.
    fn padding_bytes(&self) -> usize {
        0
    }

    /// Copy `bytes` into the slot's storage starting at `offset`.
    fn fill(&self, offset: usize, bytes: &[u8]);

    /// The slot's storage now holds one complete payload.
    fn complete(&self);
}

/// Extension hook consulted for every decoded header before the buffer
/// lookup. Returning false drops the decoder into `SyncLost`.
pub type HeaderValidator = Box<dyn Fn(&FrameHeader) -> bool>;

/// Sorted, bounded table mapping type ids to payload storage.
///
/// Kept ascending by type id at all times: insertion is linear (ordered
/// placement), lookup is logarithmic. The table persists across streams;
/// per-stream transient state lives in the decoder.
pub struct BufferRegistry {
    slots: Vec<Rc<dyn PayloadSlot>>,
    capacity: usize,
    validator: Option<HeaderValidator>,
}

impl BufferRegistry {
    /// Registry with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REGISTRY_CAPACITY)
    }

    /// Registry with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            validator: None,
        }
    }

    /// Insert a slot (new type id) or overwrite the slot for an existing id.
    ///
    /// Fails with [`FrameError::RegistryFull`] when the table is full and the
    /// id is new — a fatal configuration condition.
    pub fn set(&mut self, slot: Rc<dyn PayloadSlot>) -> Result<()> {
        let type_id = slot.type_id();
        match self.slots.binary_search_by_key(&type_id, |s| s.type_id()) {
            Ok(index) => {
                tracing::debug!(type_id, "buffer registration overwritten");
                self.slots[index] = slot;
                Ok(())
            }
            Err(index) => {
                if self.slots.len() >= self.capacity {
                    return Err(FrameError::RegistryFull {
                        capacity: self.capacity,
                    });
                }
                self.slots.insert(index, slot);
                tracing::debug!(type_id, count = self.slots.len(), "buffer registered");
                Ok(())
            }
        }
    }

    /// Look up the slot registered for `type_id`.
    pub fn find(&self, type_id: u32) -> Option<Rc<dyn PayloadSlot>> {
        self.slots
            .binary_search_by_key(&type_id, |s| s.type_id())
            .ok()
            .map(|index| Rc::clone(&self.slots[index]))
    }

    /// Run the header validation hook. Accepts everything by default.
    pub fn validate(&self, header: &FrameHeader) -> bool {
        self.validator.as_ref().map_or(true, |v| v(header))
    }

    /// Install a header validation hook.
    pub fn set_validator(&mut self, validator: impl Fn(&FrameHeader) -> bool + 'static) {
        self.validator = Some(Box::new(validator));
    }

    /// Registered type ids, ascending.
    pub fn type_ids(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.type_id()).collect()
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no slots are registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fixed table capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    pub(crate) struct TestSlot {
        pub id: u32,
        pub padding: usize,
        pub data: RefCell<Vec<u8>>,
        pub completions: Cell<u32>,
    }

    impl TestSlot {
        pub fn new(id: u32, size: usize) -> Rc<Self> {
            Self::with_padding(id, size, 0)
        }

        pub fn with_padding(id: u32, size: usize, padding: usize) -> Rc<Self> {
            Rc::new(Self {
                id,
                padding,
                data: RefCell::new(vec![0; size]),
                completions: Cell::new(0),
            })
        }
    }

    impl PayloadSlot for TestSlot {
        fn type_id(&self) -> u32 {
            self.id
        }

        fn payload_bytes(&self) -> usize {
            self.data.borrow().len()
        }

        fn padding_bytes(&self) -> usize {
            self.padding
        }

        fn fill(&self, offset: usize, bytes: &[u8]) {
            self.data.borrow_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
        }

        fn complete(&self) {
            self.completions.set(self.completions.get() + 1);
        }
    }

    #[test]
    fn table_stays_sorted_under_unordered_inserts() {
        let mut registry = BufferRegistry::new();
        for id in [90, 10, 50, 30, 70] {
            registry.set(TestSlot::new(id, 4)).unwrap();
        }
        assert_eq!(registry.type_ids(), vec![10, 30, 50, 70, 90]);
    }

    #[test]
    fn find_resolves_registered_ids_only() {
        let mut registry = BufferRegistry::new();
        registry.set(TestSlot::new(10, 4)).unwrap();
        registry.set(TestSlot::new(30, 8)).unwrap();

        assert_eq!(registry.find(30).unwrap().payload_bytes(), 8);
        assert!(registry.find(20).is_none());
    }

    #[test]
    fn existing_id_is_overwritten_in_place() {
        let mut registry = BufferRegistry::new();
        registry.set(TestSlot::new(10, 4)).unwrap();
        registry.set(TestSlot::new(10, 16)).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find(10).unwrap().payload_bytes(), 16);
    }

    #[test]
    fn capacity_exceeded_is_fatal() {
        let mut registry = BufferRegistry::with_capacity(2);
        registry.set(TestSlot::new(1, 1)).unwrap();
        registry.set(TestSlot::new(2, 1)).unwrap();

        let err = registry.set(TestSlot::new(3, 1)).unwrap_err();
        assert!(matches!(err, FrameError::RegistryFull { capacity: 2 }));

        // Overwriting an existing id still works at capacity.
        registry.set(TestSlot::new(2, 9)).unwrap();
        assert_eq!(registry.find(2).unwrap().payload_bytes(), 9);
    }

    #[test]
    fn validator_hook_defaults_to_accept() {
        let mut registry = BufferRegistry::new();
        let header = FrameHeader::new(5, 4);
        assert!(registry.validate(&header));

        registry.set_validator(|h| h.payload_bytes <= 2);
        assert!(!registry.validate(&header));
        assert!(registry.validate(&FrameHeader::new(5, 2)));
    }
}
