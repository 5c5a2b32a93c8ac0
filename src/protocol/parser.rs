//! Response parser
//!
//! Turns an accumulated reply buffer into a structured [`Reply`]. Each
//! command family has its own decoder; [`parse_response`] dispatches.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::{MemwireError, ProtocolErrorKind, Result};

use super::command::Command;
use super::framer::{find_crlf, hard_error};
use super::response::{
    Record, Reply, ResultCode, StatValue, StatsMap, RESPONSE_DELETED, RESPONSE_END,
    RESPONSE_EXISTS, RESPONSE_ITEM, RESPONSE_NOT_FOUND, RESPONSE_NOT_STORED,
    RESPONSE_RESET, RESPONSE_STAT, RESPONSE_TOUCHED, RESPONSE_VALUE,
    RESPONSE_VERSION,
};

/// Detect a hard error reply.
///
/// Returns the error class and the message following the token.
pub fn check_response(buffer: &[u8]) -> Option<(ProtocolErrorKind, String)> {
    let line = first_line(buffer);
    let kind = hard_error(line)?;
    let token_len = kind.to_string().len();
    let message = String::from_utf8_lossy(&line[token_len.min(line.len())..]).into_owned();
    Some((kind, message))
}

/// Dispatch to the parser of the command family
pub fn parse_response(command: Command, buffer: &Bytes) -> Result<Reply> {
    let reply = match command {
        Command::Get | Command::Gets => Reply::Records(parse_read_response(buffer)?),
        Command::Set
        | Command::Add
        | Command::Replace
        | Command::Append
        | Command::Prepend
        | Command::Cas => Reply::Status(parse_write_response(buffer)),
        Command::Delete => Reply::Status(parse_delete_response(buffer)),
        Command::Touch => Reply::Status(parse_touch_response(buffer)),
        Command::Stats => Reply::Stats(parse_stats_response(buffer)?),
        Command::Version => Reply::Version(parse_version_response(buffer)),
        Command::Incr | Command::Decr => Reply::Counter(parse_arithmetic_response(buffer)?),
        Command::FlushAll => Reply::Flushed(parse_flush_response(buffer)),
    };
    Ok(reply)
}

// =============================================================================
// Retrieval
// =============================================================================

/// Parse `(VALUE <key> <flags> <bytes> [<cas>]\r\n<data>\r\n)* END\r\n`.
///
/// Returns `None` when the reply holds no record.
pub fn parse_read_response(buffer: &Bytes) -> Result<Option<BTreeMap<String, Record>>> {
    let mut records = BTreeMap::new();
    let mut pos = 0;

    while pos < buffer.len() {
        let Some(end) = find_crlf(&buffer[pos..]) else {
            return Err(MemwireError::MalformedResponse(format!(
                "unterminated line {:?}",
                String::from_utf8_lossy(&buffer[pos..])
            )));
        };
        let line = &buffer[pos..pos + end];
        pos += end + 2;

        if line == RESPONSE_END.as_bytes() {
            break;
        }

        let header = std::str::from_utf8(line)
            .map_err(|_| MemwireError::MalformedResponse("non UTF-8 VALUE header".to_string()))?;
        let mut fields = header.split(' ');
        let marker = fields.next().unwrap_or_default();
        if marker != RESPONSE_VALUE {
            return Err(MemwireError::MalformedResponse(format!(
                "awaited \"{}\" but received \"{}\"",
                RESPONSE_VALUE, marker
            )));
        }

        let key = next_field(&mut fields, "key", header)?.to_string();
        let flags: u32 = parse_field(&mut fields, "flags", header)?;
        let length: usize = parse_field(&mut fields, "bytes", header)?;
        let cas = match fields.next() {
            Some(token) => Some(token.parse::<u64>().map_err(|_| malformed_field("cas", header))?),
            None => None,
        };

        let data_end = pos
            .checked_add(length)
            .filter(|end| buffer.len().checked_sub(2).is_some_and(|limit| *end <= limit))
            .filter(|end| &buffer[*end..*end + 2] == b"\r\n");
        let Some(data_end) = data_end else {
            return Err(MemwireError::MalformedResponse(format!(
                "value of \"{}\" does not span the declared {} bytes",
                key, length
            )));
        };
        let data = buffer.slice(pos..data_end);
        pos = data_end + 2;

        let frames = if length == 0 {
            1
        } else {
            data.windows(2).filter(|pair| *pair == b"\r\n").count() + 1
        };

        records.insert(
            key.clone(),
            Record {
                key,
                data,
                flags,
                length,
                cas,
                frames,
            },
        );
    }

    Ok((!records.is_empty()).then_some(records))
}

fn next_field<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    name: &str,
    header: &str,
) -> Result<&'a str> {
    fields
        .next()
        .filter(|field| !field.is_empty())
        .ok_or_else(|| malformed_field(name, header))
}

fn parse_field<'a, T: std::str::FromStr>(
    fields: &mut impl Iterator<Item = &'a str>,
    name: &str,
    header: &str,
) -> Result<T> {
    next_field(fields, name, header)?
        .parse()
        .map_err(|_| malformed_field(name, header))
}

fn malformed_field(name: &str, header: &str) -> MemwireError {
    MemwireError::MalformedResponse(format!("bad {} field in header \"{}\"", name, header))
}

// =============================================================================
// Storage, delete, touch, flush
// =============================================================================

/// Anything but `STORED\r\n` is a failure with a specific code
pub fn parse_write_response(buffer: &[u8]) -> ResultCode {
    if buffer == b"STORED\r\n" {
        return ResultCode::Success;
    }
    match first_token(buffer) {
        RESPONSE_NOT_STORED => ResultCode::NotStored,
        RESPONSE_EXISTS => ResultCode::DataExists,
        RESPONSE_NOT_FOUND => ResultCode::NotFound,
        _ => ResultCode::Failure,
    }
}

pub fn parse_delete_response(buffer: &[u8]) -> ResultCode {
    match first_token(buffer) {
        RESPONSE_DELETED => ResultCode::Success,
        RESPONSE_NOT_FOUND => ResultCode::NotFound,
        _ => ResultCode::Failure,
    }
}

pub fn parse_touch_response(buffer: &[u8]) -> ResultCode {
    match first_token(buffer) {
        RESPONSE_TOUCHED => ResultCode::Success,
        RESPONSE_NOT_FOUND => ResultCode::NotFound,
        _ => ResultCode::Failure,
    }
}

pub fn parse_flush_response(buffer: &[u8]) -> bool {
    buffer == b"OK\r\n"
}

// =============================================================================
// Version, arithmetic
// =============================================================================

/// `VERSION <version>`
pub fn parse_version_response(buffer: &[u8]) -> Option<String> {
    let mut tokens = first_line_str(buffer).split(' ');
    match (tokens.next(), tokens.next()) {
        (Some(RESPONSE_VERSION), Some(version)) if !version.is_empty() => Some(version.to_string()),
        _ => None,
    }
}

/// New counter value, or None for `NOT_FOUND`
pub fn parse_arithmetic_response(buffer: &[u8]) -> Result<Option<u64>> {
    if buffer == b"NOT_FOUND\r\n" {
        return Ok(None);
    }
    let token = first_token(buffer);
    token.parse::<u64>().map(Some).map_err(|_| {
        MemwireError::MalformedResponse(format!("awaited a counter value but received \"{}\"", token))
    })
}

// =============================================================================
// Stats
// =============================================================================

/// Parse `(STAT|ITEM <key> <value>\r\n)* END\r\n`.
///
/// Keys with colons nest: `1:chunk_size` becomes `{"1": {"chunk_size": ..}}`,
/// `items:1:number` becomes `{"items": {"1": {"number": ..}}}`. A missing
/// trailing `END` is tolerated.
pub fn parse_stats_response(buffer: &[u8]) -> Result<StatsMap> {
    let text = String::from_utf8_lossy(buffer);
    let mut stats = StatsMap::new();

    for line in text.split("\r\n") {
        if line.is_empty() {
            continue;
        }
        if line == RESPONSE_END || line == RESPONSE_RESET {
            break;
        }

        let mut fields = line.splitn(3, ' ');
        let marker = fields.next().unwrap_or_default();
        if marker != RESPONSE_STAT && marker != RESPONSE_ITEM {
            return Err(MemwireError::MalformedResponse(format!(
                "awaited \"{}\" but received \"{}\"",
                RESPONSE_STAT, marker
            )));
        }
        let key = fields.next().unwrap_or_default();
        let value = fields.next().unwrap_or_default().to_string();

        let path: Vec<&str> = key.splitn(3, ':').collect();
        insert_stat(&mut stats, &path, value);
    }

    Ok(stats)
}

fn insert_stat(stats: &mut StatsMap, path: &[&str], value: String) {
    match path {
        [] => {}
        [leaf] => {
            stats.insert(leaf.to_string(), StatValue::Value(value));
        }
        [group, rest @ ..] => {
            let node = stats
                .entry(group.to_string())
                .or_insert_with(|| StatValue::Map(StatsMap::new()));
            if !matches!(node, StatValue::Map(_)) {
                *node = StatValue::Map(StatsMap::new());
            }
            if let StatValue::Map(children) = node {
                insert_stat(children, rest, value);
            }
        }
    }
}

/// Deep-merge a later stats round into the accumulated tree
pub fn merge_stats(into: &mut StatsMap, from: StatsMap) {
    for (key, value) in from {
        if let StatValue::Map(incoming) = value {
            if let Some(StatValue::Map(existing)) = into.get_mut(&key) {
                merge_stats(existing, incoming);
                continue;
            }
            into.insert(key, StatValue::Map(incoming));
        } else {
            into.insert(key, value);
        }
    }
}

// =============================================================================
// Line helpers
// =============================================================================

fn first_line(buffer: &[u8]) -> &[u8] {
    match find_crlf(buffer) {
        Some(end) => &buffer[..end],
        None => buffer,
    }
}

fn first_line_str(buffer: &[u8]) -> &str {
    std::str::from_utf8(first_line(buffer)).unwrap_or_default()
}

fn first_token(buffer: &[u8]) -> &str {
    first_line_str(buffer).split(' ').next().unwrap_or_default()
}
