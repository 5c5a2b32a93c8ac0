//! Value Module
//!
//! Typed values on top of a protocol that only moves opaque bytes.
//!
//! ## Flag Layout
//! ```text
//! ┌────────────────────────────┬──────────────────────┐
//! │ Compression bits (0x10..)  │ Kind nibble (0x0F)   │
//! └────────────────────────────┴──────────────────────┘
//! ```
//!
//! ### Kinds (closed partition, not a bitmask)
//! - 0: STRING     - raw bytes, never serialized
//! - 1: INTEGER    - decimal text
//! - 2: FLOAT      - decimal text
//! - 3: BOOLEAN    - "1" / "0"
//! - 4: SERIALIZED - bincode encoded composite value
//!
//! ### Compression bits
//! - 0x10: dictionary codec (smaz)
//! - 0x20: LZW codec

mod codec;
mod flags;

pub use codec::Value;
pub use flags::{
    Kind, FLAG_BOOLEAN, FLAG_COMPRESSED_LZW, FLAG_COMPRESSED_SMAZ, FLAG_FLOAT, FLAG_INTEGER,
    FLAG_SERIALIZED, FLAG_STRING, KIND_MASK,
};
