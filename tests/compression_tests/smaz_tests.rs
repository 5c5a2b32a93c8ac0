//! Smaz Tests
//!
//! Tests for the dictionary substitution codec.

use memwire::compression::{Compressor, Smaz, DICTIONARY};
use memwire::MemwireError;

fn round_trip(input: &[u8]) -> Vec<u8> {
    let packed = Smaz.compress(input);
    Smaz.decompress(&packed).unwrap()
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_empty_input() {
    assert!(Smaz.compress(b"").is_empty());
    assert!(Smaz.decompress(b"").unwrap().is_empty());
}

#[test]
fn test_dictionary_hits_shrink() {
    let text = b"the end of the story is in the house";
    let packed = Smaz.compress(text);

    assert!(packed.len() < text.len() * 2 / 3);
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_no_dictionary_hits() {
    let text = b"QZXJ#@!~";
    let packed = Smaz.compress(text);

    // Literal runs cost two extra bytes
    assert_eq!(packed.len(), text.len() + 2);
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_embedded_crlf() {
    let text = b"line one\r\nline two\r\n\r\nEND\r\n";
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_binary_input() {
    let bytes: Vec<u8> = (0..=255).rev().chain(0..=255).collect();
    assert_eq!(round_trip(&bytes), bytes);
}

#[test]
fn test_long_literal_run_is_split() {
    let bytes = vec![0xFFu8; 600];
    let packed = Smaz.compress(&bytes);

    assert_eq!(packed[0], 255);
    assert_eq!(packed[1], 255);
    assert_eq!(round_trip(&bytes), bytes);
}

#[test]
fn test_every_dictionary_entry() {
    for (code, entry) in DICTIONARY.iter().enumerate() {
        assert_eq!(Smaz.decompress(&[code as u8]).unwrap(), entry.to_vec());
        assert_eq!(round_trip(entry), entry.to_vec());
    }
}

// =============================================================================
// Corrupt Input
// =============================================================================

#[test]
fn test_truncated_run() {
    let err = Smaz.decompress(&[255, 4, b'a']).unwrap_err();
    assert!(matches!(err, MemwireError::Compression(_)));
}

#[test]
fn test_dangling_literal_marker() {
    assert!(Smaz.decompress(&[254]).is_err());
    assert!(Smaz.decompress(&[255]).is_err());
}
