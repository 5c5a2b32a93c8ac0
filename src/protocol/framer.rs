//! Response framing
//!
//! Accumulates a reply in fixed-size chunks until it is complete.
//!
//! ## Read States
//! ```text
//!            chunk, no terminator
//!           ┌──────────────┐
//!           ▼              │
//!      ┌─────────┐ ────────┘
//!      │ Reading │ ── terminator line ──► Terminated
//!      └─────────┘ ── error line ───────► Error
//! ```
//!
//! A terminator is a complete line starting with one of [`TERMINATORS`].
//! Retrieval replies skip `VALUE` payloads by their declared length, so data
//! bytes never end the read. Arithmetic replies are a single short line and
//! complete with the first line (or one full chunk).

use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::error::{ProtocolErrorKind, Result};

use super::command::Command;
use super::response::{
    RESPONSE_CLIENT_ERROR, RESPONSE_DELETED, RESPONSE_END, RESPONSE_ERROR, RESPONSE_EXISTS,
    RESPONSE_NOT_FOUND, RESPONSE_NOT_STORED, RESPONSE_OK, RESPONSE_RESET, RESPONSE_SERVER_ERROR,
    RESPONSE_STORED, RESPONSE_TOUCHED, RESPONSE_VALUE, RESPONSE_VERSION,
};

/// Bytes requested from the socket per read
pub const CHUNK_SIZE: usize = 256;

/// Tokens that end a reply when they start a line
pub const TERMINATORS: [&str; 13] = [
    RESPONSE_END,
    RESPONSE_DELETED,
    RESPONSE_NOT_FOUND,
    RESPONSE_OK,
    RESPONSE_EXISTS,
    RESPONSE_ERROR,
    RESPONSE_RESET,
    RESPONSE_STORED,
    RESPONSE_NOT_STORED,
    RESPONSE_VERSION,
    RESPONSE_TOUCHED,
    RESPONSE_CLIENT_ERROR,
    RESPONSE_SERVER_ERROR,
];

/// Progress of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// More bytes are needed
    Reading,
    /// A terminator line was seen
    Terminated,
    /// A hard error line was seen
    Error,
}

/// Incremental reply accumulator for one command
#[derive(Debug)]
pub struct ResponseReader {
    command: Command,
    buffer: BytesMut,
    /// Start of the first line not yet classified
    cursor: usize,
    state: ReadState,
}

impl ResponseReader {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            buffer: BytesMut::with_capacity(CHUNK_SIZE),
            cursor: 0,
            state: ReadState::Reading,
        }
    }

    /// Append a chunk and advance the state machine
    pub fn feed(&mut self, chunk: &[u8]) -> ReadState {
        if self.state != ReadState::Reading {
            return self.state;
        }
        self.buffer.extend_from_slice(chunk);
        self.state = if self.command.is_arithmetic() {
            self.scan_arithmetic()
        } else {
            self.scan_lines()
        };
        self.state
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    fn scan_arithmetic(&self) -> ReadState {
        match find_crlf(&self.buffer) {
            Some(end) if hard_error(&self.buffer[..end]).is_some() => ReadState::Error,
            Some(_) => ReadState::Terminated,
            None if self.buffer.len() >= CHUNK_SIZE => ReadState::Terminated,
            None => ReadState::Reading,
        }
    }

    fn scan_lines(&mut self) -> ReadState {
        loop {
            let rest = &self.buffer[self.cursor..];
            let Some(end) = find_crlf(rest) else {
                return ReadState::Reading;
            };
            let line = &rest[..end];
            let next = self.cursor + end + 2;

            if self.command.is_retrieval() && starts_with_token(line, RESPONSE_VALUE) {
                let Some(length) = declared_length(line) else {
                    // Let the parser report the broken header
                    return ReadState::Terminated;
                };
                let Some(data_end) = next.checked_add(length).and_then(|end| end.checked_add(2))
                else {
                    return ReadState::Terminated;
                };
                if self.buffer.len() < data_end {
                    return ReadState::Reading;
                }
                self.cursor = data_end;
                continue;
            }

            if hard_error(line).is_some() {
                return ReadState::Error;
            }
            if TERMINATORS.iter().any(|token| line.starts_with(token.as_bytes())) {
                return ReadState::Terminated;
            }
            self.cursor = next;
        }
    }
}

/// Read one complete reply for `command` from the stream.
///
/// Blocks until a terminator is seen or the peer closes the stream.
pub fn read_response<R: Read>(reader: &mut R, command: Command) -> Result<Bytes> {
    let mut response = ResponseReader::new(command);
    let mut chunk = [0u8; CHUNK_SIZE];

    while response.state() == ReadState::Reading {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        response.feed(&chunk[..read]);
    }

    if response.is_empty() {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("connection closed before a reply to \"{}\"", command),
        )
        .into());
    }

    tracing::trace!(
        "Received {} bytes for {} ({:?})",
        response.buffer().len(),
        command,
        response.state()
    );
    Ok(response.into_bytes())
}

// =============================================================================
// Line helpers
// =============================================================================

/// Offset of the first CRLF
pub fn find_crlf(bytes: &[u8]) -> Option<usize> {
    bytes.windows(2).position(|pair| pair == b"\r\n")
}

/// Classify a hard error line
pub fn hard_error(line: &[u8]) -> Option<ProtocolErrorKind> {
    if line.starts_with(RESPONSE_CLIENT_ERROR.as_bytes()) {
        Some(ProtocolErrorKind::ClientError)
    } else if line.starts_with(RESPONSE_SERVER_ERROR.as_bytes()) {
        Some(ProtocolErrorKind::ServerError)
    } else if line.starts_with(RESPONSE_ERROR.as_bytes()) {
        Some(ProtocolErrorKind::Error)
    } else {
        None
    }
}

fn starts_with_token(line: &[u8], token: &str) -> bool {
    line.starts_with(token.as_bytes()) && line.get(token.len()) == Some(&b' ')
}

/// `<bytes>` field of a `VALUE <key> <flags> <bytes> [<cas>]` header
fn declared_length(line: &[u8]) -> Option<usize> {
    let field = line.split(|b| *b == b' ').filter(|t| !t.is_empty()).nth(3)?;
    std::str::from_utf8(field).ok()?.parse().ok()
}
