use std::fmt;

/// Hash a name into a stable 32-bit type id (djb2).
///
/// `hash = 5381; hash = hash * 33 + byte` with wrapping arithmetic. The hash
/// is deterministic across platforms; no collision detection is provided.
pub fn type_hash(name: &str) -> u32 {
    let mut hash: u32 = 5381;
    for byte in name.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(u32::from(byte));
    }
    hash
}

/// Identity of a payload type: a numeric id plus an optional display name.
///
/// The id is either a caller-supplied stable constant or derived from a name
/// via [`type_hash`]. Names are used for inter-process signalling where
/// compiler-generated type names are not portable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeKey {
    id: u32,
    name: Option<&'static str>,
}

impl TypeKey {
    /// Key derived from a stable name.
    pub fn named(name: &'static str) -> Self {
        Self {
            id: type_hash(name),
            name: Some(name),
        }
    }

    /// Key from a caller-supplied id, no display name.
    pub fn from_id(id: u32) -> Self {
        Self { id, name: None }
    }

    /// Key from a caller-supplied id with a display name.
    pub fn with_name(id: u32, name: &'static str) -> Self {
        Self {
            id,
            name: Some(name),
        }
    }

    /// Numeric identifier used on the wire.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Display name, if one was supplied.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{name} ({:#010x})", self.id),
            None => write!(f, "{:#010x}", self.id),
        }
    }
}
