//! Dictionary substitution codec (smaz)
//!
//! ## Encoded Stream
//! ```text
//! code < 254           -> DICTIONARY[code]
//! 254, byte            -> one literal byte
//! 255, len, bytes[len] -> literal run of 2..=255 bytes
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{MemwireError, Result};

use super::Compressor;

/// Marker for a single literal byte
const SINGLE_LITERAL: u8 = 254;

/// Marker for a length-prefixed literal run
const LITERAL_RUN: u8 = 255;

/// Longest dictionary entry in bytes
const MAX_ENTRY_LEN: usize = 7;

/// Longest literal run one marker can carry
const MAX_RUN_LEN: usize = 255;

/// Substring table; the index of an entry is its code byte
pub const DICTIONARY: [&[u8]; 254] = [
    b" ", b"the", b"e", b"t", b"a", b"of", b"o", b"and", b"i", b"n", b"s", b"e ", b"r",
    b" th", b" t", b"in", b"he", b"th", b"h", b"he ", b"to", b"\r\n", b"l", b"s ", b"d",
    b" a", b"an", b"er", b"c", b" o", b"d ", b"on", b" of", b"re", b"of ", b"t ", b", ",
    b"is", b"u", b"at", b"   ", b"n ", b"or", b"which", b"f", b"m", b"as", b"it", b"that",
    b"\n", b"was", b"en", b"  ", b" w", b"es", b" an", b" i", b"\r", b"f ", b"g", b"p",
    b"nd", b" s", b"nd ", b"ed ", b"w", b"ed", b"http://", b"for", b"te", b"ing", b"y ",
    b"The", b" c", b"ti", b"r ", b"his", b"st", b" in", b"ar", b"nt", b",", b" to", b"y",
    b"ng", b" h", b"with", b"le", b"al", b"to ", b"b", b"ou", b"be", b"were", b" b", b"se",
    b"o ", b"ent", b"ha", b"ng ", b"their", b"\"", b"hi", b"from", b" f", b"in ", b"de",
    b"ion", b"me", b"v", b".", b"ve", b"all", b"re ", b"ri", b"ro", b"is ", b"co", b"f t",
    b"are", b"ea", b". ", b"her", b" m", b"er ", b" p", b"es ", b"by", b"they", b"di",
    b"ra", b"ic", b"not", b"s, ", b"d t", b"at ", b"ce", b"la", b"h ", b"ne", b"as ",
    b"tio", b"on ", b"n t", b"io", b"we", b" a ", b"om", b", a", b"s o", b"ur", b"li",
    b"ll", b"ch", b"had", b"this", b"e t", b"g ", b"e\r\n", b" wh", b"ere", b" co", b"e o",
    b"a ", b"us", b" d", b"ss", b"\n\r\n", b"\r\n\r", b"=\"", b" be", b" e", b"s a", b"ma",
    b"one", b"t t", b"or ", b"but", b"el", b"so", b"l ", b"e s", b"s,", b"no", b"ter",
    b" wa", b"iv", b"ho", b"e a", b" r", b"hat", b"s t", b"ns", b"ch ", b"wh", b"tr",
    b"ut", b"/", b"have", b"ly ", b"ta", b" ha", b" on", b"tha", b"-", b" l", b"ati",
    b"en ", b"pe", b" re", b"there", b"ass", b"si", b" fo", b"wa", b"ec", b"our", b"who",
    b"its", b"z", b"fo", b"rs", b">", b"ot", b"un", b"<", b"im", b"th ", b"nc", b"ate",
    b"><", b"ver", b"ad", b" we", b"ly", b"ee", b" n", b"id", b" cl", b"ac", b"il", b"</",
    b"rt", b" wi", b"div", b"e, ", b" it", b"whi", b" ma", b"ge", b"x", b"e c", b"men",
    b".com",];

fn encode_book() -> &'static HashMap<&'static [u8], u8> {
    static BOOK: OnceLock<HashMap<&'static [u8], u8>> = OnceLock::new();
    BOOK.get_or_init(|| {
        DICTIONARY
            .iter()
            .enumerate()
            .map(|(code, entry)| (*entry, code as u8))
            .collect()
    })
}

/// Dictionary substitution codec
#[derive(Debug, Clone, Copy, Default)]
pub struct Smaz;

impl Compressor for Smaz {
    fn compress(&self, input: &[u8]) -> Vec<u8> {
        let book = encode_book();
        let mut output = Vec::with_capacity(input.len());
        let mut verbatim: Vec<u8> = Vec::new();
        let mut pos = 0;

        while pos < input.len() {
            let longest = MAX_ENTRY_LEN.min(input.len() - pos);
            let hit = (1..=longest)
                .rev()
                .find_map(|len| book.get(&input[pos..pos + len]).map(|code| (*code, len)));

            match hit {
                Some((code, len)) => {
                    flush_verbatim(&mut output, &mut verbatim);
                    output.push(code);
                    pos += len;
                }
                None => {
                    verbatim.push(input[pos]);
                    pos += 1;
                    if verbatim.len() == MAX_RUN_LEN {
                        flush_verbatim(&mut output, &mut verbatim);
                    }
                }
            }
        }
        flush_verbatim(&mut output, &mut verbatim);

        output
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() * 2);
        let mut pos = 0;

        while pos < input.len() {
            match input[pos] {
                SINGLE_LITERAL => {
                    let byte = input.get(pos + 1).ok_or_else(|| truncated(pos))?;
                    output.push(*byte);
                    pos += 2;
                }
                LITERAL_RUN => {
                    let len = *input.get(pos + 1).ok_or_else(|| truncated(pos))? as usize;
                    let run = input.get(pos + 2..pos + 2 + len).ok_or_else(|| truncated(pos))?;
                    output.extend_from_slice(run);
                    pos += 2 + len;
                }
                code => {
                    output.extend_from_slice(DICTIONARY[code as usize]);
                    pos += 1;
                }
            }
        }

        Ok(output)
    }
}

/// Emit pending literals as a single-byte or length-prefixed run
fn flush_verbatim(output: &mut Vec<u8>, verbatim: &mut Vec<u8>) {
    match verbatim.len() {
        0 => return,
        1 => output.push(SINGLE_LITERAL),
        len => {
            output.push(LITERAL_RUN);
            output.push(len as u8);
        }
    }
    output.append(verbatim);
}

fn truncated(pos: usize) -> MemwireError {
    MemwireError::Compression(format!("smaz stream truncated at offset {}", pos))
}
