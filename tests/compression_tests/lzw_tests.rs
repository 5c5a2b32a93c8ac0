//! LZW Tests
//!
//! Tests for the adaptive dictionary codec.

use memwire::compression::{Compressor, Lzw};
use memwire::MemwireError;

fn round_trip(input: &[u8]) -> Vec<u8> {
    let packed = Lzw.compress(input);
    Lzw.decompress(&packed).unwrap()
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_empty_input() {
    assert!(Lzw.compress(b"").is_empty());
    assert!(Lzw.decompress(b"").unwrap().is_empty());
}

#[test]
fn test_repetition_shrinks() {
    let text = "abcabcabcabcabcabcabcabcabcabc".repeat(10);
    let packed = Lzw.compress(text.as_bytes());

    assert!(packed.len() < text.len() / 2);
    assert_eq!(round_trip(text.as_bytes()), text.as_bytes());
}

#[test]
fn test_output_is_utf8() {
    let packed = Lzw.compress(b"to be or not to be or to be or not");
    assert!(std::str::from_utf8(&packed).is_ok());
}

#[test]
fn test_no_repetition() {
    let text = b"abcdefgh";
    // Every code is an ASCII literal
    assert_eq!(Lzw.compress(text), text.to_vec());
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_kwkwk_sequence() {
    // Decoder meets a code it is about to define
    let text = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_embedded_crlf() {
    let text = b"VALUE\r\nEND\r\nVALUE\r\nEND\r\n\r\n";
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_binary_input() {
    let bytes: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).chain(0..=255u8).collect();
    assert_eq!(round_trip(&bytes), bytes);
}

#[test]
fn test_large_dictionary_crosses_surrogates() {
    // Enough distinct phrases to push codes past 0xD800
    let mut input = Vec::new();
    let mut state: u32 = 0x1234_5678;
    for _ in 0..400_000 {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        input.push((state >> 16) as u8);
    }
    assert_eq!(round_trip(&input), input);
}

// =============================================================================
// Corrupt Input
// =============================================================================

#[test]
fn test_invalid_utf8() {
    let err = Lzw.decompress(&[0xC3]).unwrap_err();
    assert!(matches!(err, MemwireError::Compression(_)));
}

#[test]
fn test_unknown_code() {
    // U+0200 is a dictionary code that cannot exist yet
    let err = Lzw.decompress("a\u{200}".as_bytes()).unwrap_err();
    assert!(matches!(err, MemwireError::Compression(_)));
}
