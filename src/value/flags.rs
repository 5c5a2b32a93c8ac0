//! Flag constants
//!
//! The flags word sent with every stored item doubles as the type tag.

/// Raw string payload
pub const FLAG_STRING: u32 = 0;

/// Decimal integer payload
pub const FLAG_INTEGER: u32 = 1;

/// Decimal float payload
pub const FLAG_FLOAT: u32 = 2;

/// Boolean payload
pub const FLAG_BOOLEAN: u32 = 3;

/// Structured (bincode) payload
pub const FLAG_SERIALIZED: u32 = 4;

/// Bits holding the kind discriminant
pub const KIND_MASK: u32 = 0x0F;

/// Payload was compressed with the dictionary codec
pub const FLAG_COMPRESSED_SMAZ: u32 = 0x10;

/// Payload was compressed with the LZW codec
pub const FLAG_COMPRESSED_LZW: u32 = 0x20;

const KNOWN_BITS: u32 = KIND_MASK | FLAG_COMPRESSED_SMAZ | FLAG_COMPRESSED_LZW;

/// Logical kind of a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Kind {
    String = FLAG_STRING,
    Integer = FLAG_INTEGER,
    Float = FLAG_FLOAT,
    Boolean = FLAG_BOOLEAN,
    Serialized = FLAG_SERIALIZED,
}

impl Kind {
    /// Kind encoded in a flags word.
    ///
    /// Returns `None` for flags written by someone else (unknown kind or
    /// unknown high bits); callers fall back to the raw bytes.
    pub fn from_flags(flags: u32) -> Option<Kind> {
        if flags & !KNOWN_BITS != 0 {
            return None;
        }
        match flags & KIND_MASK {
            FLAG_STRING => Some(Kind::String),
            FLAG_INTEGER => Some(Kind::Integer),
            FLAG_FLOAT => Some(Kind::Float),
            FLAG_BOOLEAN => Some(Kind::Boolean),
            FLAG_SERIALIZED => Some(Kind::Serialized),
            _ => None,
        }
    }

    pub fn flag(self) -> u32 {
        self as u32
    }
}
