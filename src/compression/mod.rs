//! Compression Module
//!
//! Swappable text codecs applied to wire payloads before they are stored.
//!
//! ## Codecs
//! - `Smaz`: fixed dictionary substitution, tuned for short English/HTML text
//! - `Lzw`:  adaptive dictionary, each code written as one UTF-8 character
//!
//! Both satisfy `decompress(compress(x)) == x` for every byte string.

mod lzw;
mod smaz;

pub use lzw::Lzw;
pub use smaz::{Smaz, DICTIONARY};

use crate::error::Result;
use crate::value::{FLAG_COMPRESSED_LZW, FLAG_COMPRESSED_SMAZ};

/// Common contract of the compression codecs
pub trait Compressor: Send + Sync {
    /// Compress a payload
    fn compress(&self, input: &[u8]) -> Vec<u8>;

    /// Restore a payload produced by `compress`
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// Codec selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Smaz,
    Lzw,
}

impl Compression {
    /// The codec implementation
    pub fn codec(self) -> &'static dyn Compressor {
        match self {
            Compression::Smaz => &Smaz,
            Compression::Lzw => &Lzw,
        }
    }

    /// Flag bit marking a payload compressed with this codec
    pub fn flag(self) -> u32 {
        match self {
            Compression::Smaz => FLAG_COMPRESSED_SMAZ,
            Compression::Lzw => FLAG_COMPRESSED_LZW,
        }
    }

    /// Codec named by the compression bits of a flags word.
    ///
    /// Returns `None` for uncompressed payloads and for the invalid case of
    /// both bits set.
    pub fn from_flags(flags: u32) -> Option<Compression> {
        match (flags & FLAG_COMPRESSED_SMAZ != 0, flags & FLAG_COMPRESSED_LZW != 0) {
            (true, false) => Some(Compression::Smaz),
            (false, true) => Some(Compression::Lzw),
            _ => None,
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = String;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "smaz" => Ok(Compression::Smaz),
            "lzw" => Ok(Compression::Lzw),
            other => Err(format!("unknown compression codec: {}", other)),
        }
    }
}
