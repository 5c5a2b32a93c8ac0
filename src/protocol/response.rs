//! Response definitions
//!
//! Response tokens, result codes and the structured replies produced by the
//! parser.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::value::Value;

// =============================================================================
// Response Tokens
// =============================================================================

pub const RESPONSE_VALUE: &str = "VALUE";
pub const RESPONSE_STAT: &str = "STAT";
pub const RESPONSE_ITEM: &str = "ITEM";
pub const RESPONSE_END: &str = "END";
pub const RESPONSE_DELETED: &str = "DELETED";
pub const RESPONSE_NOT_FOUND: &str = "NOT_FOUND";
pub const RESPONSE_OK: &str = "OK";
pub const RESPONSE_EXISTS: &str = "EXISTS";
pub const RESPONSE_ERROR: &str = "ERROR";
pub const RESPONSE_RESET: &str = "RESET";
pub const RESPONSE_STORED: &str = "STORED";
pub const RESPONSE_NOT_STORED: &str = "NOT_STORED";
pub const RESPONSE_VERSION: &str = "VERSION";
pub const RESPONSE_TOUCHED: &str = "TOUCHED";
pub const RESPONSE_CLIENT_ERROR: &str = "CLIENT_ERROR";
pub const RESPONSE_SERVER_ERROR: &str = "SERVER_ERROR";

// =============================================================================
// Result Codes
// =============================================================================

/// Outcome of the last command, numbered like libmemcached's return codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResultCode {
    Success = 0,
    Failure = 1,
    HostLookupFailure = 2,
    ConnectionFailure = 3,
    ConnectionBindFailure = 4,
    WriteFailure = 5,
    ReadFailure = 6,
    UnknownReadFailure = 7,
    ProtocolError = 8,
    ClientError = 9,
    ServerError = 10,
    ConnectionSocketCreateFailure = 11,
    DataExists = 12,
    DataDoesNotExist = 13,
    NotStored = 14,
    Stored = 15,
    NotFound = 16,
    MemoryAllocationFailure = 17,
    PartialRead = 18,
    SomeErrors = 19,
    NoServers = 20,
    End = 21,
    Deleted = 22,
    Value = 23,
    Stat = 24,
    Item = 25,
    Errno = 26,
    FailUnixSocket = 27,
    NotSupported = 28,
    NoKeyProvided = 29,
    FetchNotFinished = 30,
    Timeout = 31,
    Buffered = 32,
    BadKeyProvided = 33,
    InvalidHostProtocol = 34,
    ServerMarkedDead = 35,
    UnknownStatKey = 36,
    E2Big = 37,
    InvalidArguments = 38,
    KeyTooBig = 39,
    AuthProblem = 40,
    AuthFailure = 41,
    AuthContinue = 42,
    ParseError = 43,
    ParseUserError = 44,
    Deprecated = 45,
    InProgress = 46,
    ServerTemporarilyDisabled = 47,
    ServerMemoryAllocationFailure = 48,
    MaximumReturn = 49,
}

impl ResultCode {
    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// Retrieval Records
// =============================================================================

/// One `VALUE` record exactly as it came off the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    /// Raw payload, possibly compressed
    pub data: Bytes,
    pub flags: u32,
    /// Declared payload length
    pub length: usize,
    /// Present for `gets` replies
    pub cas: Option<u64>,
    /// Physical lines the payload spanned (1 for an empty payload)
    pub frames: usize,
}

/// Metadata that accompanies a decoded value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub key: String,
    pub flags: u32,
    pub length: usize,
    pub cas: Option<u64>,
    pub frames: usize,
}

/// A decoded value plus its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub value: Value,
    pub meta: Meta,
}

// =============================================================================
// Stats
// =============================================================================

/// A statistic: a plain value or a nested group (slab, item class, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatValue {
    Value(String),
    Map(StatsMap),
}

/// Statistics of one server
pub type StatsMap = BTreeMap<String, StatValue>;

impl StatValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StatValue::Value(value) => Some(value),
            StatValue::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&StatsMap> {
        match self {
            StatValue::Map(map) => Some(map),
            StatValue::Value(_) => None,
        }
    }

    /// Follow a path of nested keys
    pub fn get_path(&self, path: &[&str]) -> Option<&StatValue> {
        path.iter()
            .try_fold(self, |node, key| node.as_map().and_then(|map| map.get(*key)))
    }
}

// =============================================================================
// Replies
// =============================================================================

/// Parsed reply of a single round trip, one variant per command family
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `get` / `gets`; None when no record came back
    Records(Option<BTreeMap<String, Record>>),
    /// Storage, `delete` and `touch` outcomes
    Status(ResultCode),
    /// `incr` / `decr` new value; None when the key is missing
    Counter(Option<u64>),
    /// `stats` of one round trip
    Stats(StatsMap),
    /// `version`; None when the reply did not carry one
    Version(Option<String>),
    /// `flush_all`
    Flushed(bool),
}
