//! LZW codec
//!
//! Classic adaptive dictionary compression. Byte values 0..=255 are their own
//! codes; learned phrases get codes from 256 upwards. Every emitted code is
//! written as one UTF-8 encoded character, so the decoder walks its input by
//! character and never splits a multi-byte sequence.

use std::collections::HashMap;

use crate::error::{MemwireError, Result};

use super::Compressor;

/// First code assigned to a learned phrase
const FIRST_CODE: u32 = 256;

/// Last code representable as a character
const LAST_CODE: u32 = char::MAX as u32;

/// Allocates phrase codes, skipping values that are not Unicode scalars
#[derive(Debug)]
struct CodeAllocator {
    next: Option<u32>,
}

impl CodeAllocator {
    fn new() -> Self {
        Self { next: Some(FIRST_CODE) }
    }

    /// Next free code, or None once the dictionary is frozen
    fn peek(&self) -> Option<u32> {
        self.next
    }

    fn advance(&mut self) {
        self.next = self.next.and_then(|code| {
            let mut candidate = code + 1;
            // UTF-16 surrogates are not valid chars
            if (0xD800..=0xDFFF).contains(&candidate) {
                candidate = 0xE000;
            }
            (candidate <= LAST_CODE).then_some(candidate)
        });
    }
}

/// LZW codec
#[derive(Debug, Clone, Copy, Default)]
pub struct Lzw;

impl Compressor for Lzw {
    fn compress(&self, input: &[u8]) -> Vec<u8> {
        let Some((&first, rest)) = input.split_first() else {
            return Vec::new();
        };

        let mut dictionary: HashMap<Vec<u8>, u32> = HashMap::new();
        let mut codes = CodeAllocator::new();
        let mut output = String::with_capacity(input.len());
        let mut phrase = vec![first];

        for &byte in rest {
            phrase.push(byte);
            if dictionary.contains_key(&phrase) {
                continue;
            }
            phrase.pop();
            emit(&mut output, code_of(&dictionary, &phrase));

            if let Some(code) = codes.peek() {
                let mut learned = phrase.clone();
                learned.push(byte);
                dictionary.insert(learned, code);
                codes.advance();
            }
            phrase.clear();
            phrase.push(byte);
        }
        emit(&mut output, code_of(&dictionary, &phrase));

        output.into_bytes()
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let text = std::str::from_utf8(input)
            .map_err(|e| MemwireError::Compression(format!("lzw stream is not UTF-8: {}", e)))?;
        let mut chars = text.chars().map(|c| c as u32);

        let Some(first) = chars.next() else {
            return Ok(Vec::new());
        };
        if first >= FIRST_CODE {
            return Err(MemwireError::Compression(format!(
                "lzw stream starts with phrase code {}",
                first
            )));
        }

        let mut dictionary: HashMap<u32, Vec<u8>> = HashMap::new();
        let mut codes = CodeAllocator::new();
        let mut previous = vec![first as u8];
        let mut output = previous.clone();

        for code in chars {
            let entry = if code < FIRST_CODE {
                vec![code as u8]
            } else if let Some(known) = dictionary.get(&code) {
                known.clone()
            } else if Some(code) == codes.peek() {
                // Phrase being defined by this very step: previous + its first byte
                let mut entry = previous.clone();
                entry.push(previous[0]);
                entry
            } else {
                return Err(MemwireError::Compression(format!(
                    "lzw stream references unknown code {}",
                    code
                )));
            };

            output.extend_from_slice(&entry);

            if let Some(next) = codes.peek() {
                let mut learned = previous;
                learned.push(entry[0]);
                dictionary.insert(next, learned);
                codes.advance();
            }
            previous = entry;
        }

        Ok(output)
    }
}

fn code_of(dictionary: &HashMap<Vec<u8>, u32>, phrase: &[u8]) -> u32 {
    match phrase {
        [byte] => u32::from(*byte),
        _ => dictionary[phrase],
    }
}

fn emit(output: &mut String, code: u32) {
    // Codes come from CodeAllocator or a single byte, both valid scalars.
    if let Some(c) = char::from_u32(code) {
        output.push(c);
    }
}
