//! Client facade
//!
//! The public command surface. Every call builds one wire request, performs a
//! single blocking round trip on the pooled socket and parses the reply.
//!
//! ## Request Flow
//! ```text
//! Value ──encode──► (payload, flags) ──compress?──► wire request
//!                                                       │
//!                              pool ◄── persistence id ─┤
//!                                                       ▼
//!                                         write + chunked read loop
//!                                                       │
//!                             hard error? ──► MemwireError::Protocol
//!                                                       │
//!                                   parse ──► decompress? ──► decode ──► Value
//! ```
//!
//! Soft outcomes (missing key, not stored, CAS conflict) come back as `None`
//! or `false`; [`Client::last_result`] tells them apart.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::compression::Compression;
use crate::config::Config;
use crate::error::{MemwireError, ProtocolErrorKind, Result};
use crate::network::{ConnectionPool, SocketOptions};
use crate::protocol::{
    check_response, encode_line, encode_storage, merge_stats, parse_response, Command, Item,
    Meta, Record, Reply, ResultCode, StatsMap,
};
use crate::value::{Kind, Value};

/// Longest key the server accepts
pub const MAX_KEY_LENGTH: usize = 250;

/// Category requested from `stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsKind {
    /// General purpose statistics
    General,
    /// Server settings
    Settings,
    /// Per slab class item counters
    Items,
    /// Per slab class statistics
    Slabs,
    /// Item size histogram
    Sizes,
    /// Open connections
    Conns,
    /// Reset the server counters
    Reset,
    /// Keys stored in one slab class, at most `limit` of them (0 = all)
    CacheDump { slab: u32, limit: u32 },
}

impl StatsKind {
    fn args(self) -> Vec<String> {
        match self {
            StatsKind::General => Vec::new(),
            StatsKind::Settings => vec!["settings".to_string()],
            StatsKind::Items => vec!["items".to_string()],
            StatsKind::Slabs => vec!["slabs".to_string()],
            StatsKind::Sizes => vec!["sizes".to_string()],
            StatsKind::Conns => vec!["conns".to_string()],
            StatsKind::Reset => vec!["reset".to_string()],
            StatsKind::CacheDump { slab, limit } => {
                vec!["cachedump".to_string(), slab.to_string(), limit.to_string()]
            }
        }
    }

    /// Key whose presence marks a complete stat set
    fn sentinel(self) -> Option<&'static str> {
        match self {
            StatsKind::General => Some("evictions"),
            StatsKind::Slabs => Some("active_slabs"),
            _ => None,
        }
    }
}

impl std::str::FromStr for StatsKind {
    type Err = String;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name {
            "" | "general" => Ok(StatsKind::General),
            "settings" => Ok(StatsKind::Settings),
            "items" => Ok(StatsKind::Items),
            "slabs" => Ok(StatsKind::Slabs),
            "sizes" => Ok(StatsKind::Sizes),
            "conns" => Ok(StatsKind::Conns),
            "reset" => Ok(StatsKind::Reset),
            other => match other.strip_prefix("cachedump:") {
                Some(rest) => parse_cachedump(rest)
                    .ok_or_else(|| format!("expected cachedump:<slab>:<limit>, got {}", other)),
                None => Err(format!("unknown stats category: {}", other)),
            },
        }
    }
}

/// `<slab>:<limit>` of a cachedump request
fn parse_cachedump(rest: &str) -> Option<StatsKind> {
    let (slab, limit) = rest.split_once(':')?;
    Some(StatsKind::CacheDump {
        slab: slab.parse().ok()?,
        limit: limit.parse().ok()?,
    })
}

/// A client bound to one server.
///
/// Clients sharing a pool and a persistence id share the socket; the socket
/// lock is held for a whole round trip.
pub struct Client {
    config: Config,
    pool: Arc<ConnectionPool>,
    persistence_id: String,
    options: SocketOptions,
    last_result: ResultCode,
}

impl Client {
    /// Create a client with a private pool. No I/O happens until the first
    /// command.
    pub fn new(config: Config) -> Self {
        Self::with_pool(config, Arc::new(ConnectionPool::new()))
    }

    /// Create a client drawing sockets from a shared pool
    pub fn with_pool(config: Config, pool: Arc<ConnectionPool>) -> Self {
        let persistence_id = config
            .persistence_id
            .clone()
            .unwrap_or_else(|| pool.generate_persistence_id());
        let options = SocketOptions::from(&config);

        Self {
            config,
            pool,
            persistence_id,
            options,
            last_result: ResultCode::Success,
        }
    }

    /// Configuration this client was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Pool holding this client's socket
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Key under which the socket is shared
    pub fn persistence_id(&self) -> &str {
        &self.persistence_id
    }

    /// Outcome of the most recent command
    pub fn last_result(&self) -> ResultCode {
        self.last_result
    }

    /// Drop the pooled socket; the next command reconnects
    pub fn disconnect(&self) -> bool {
        self.pool
            .evict(&self.persistence_id, &self.config.host, self.config.port)
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Store a value unconditionally
    pub fn set(&mut self, key: &str, value: impl Into<Value>, exptime: u32) -> Result<bool> {
        self.store(Command::Set, key, &value.into(), exptime, None)
    }

    /// Store a value only if the key is absent
    pub fn add(&mut self, key: &str, value: impl Into<Value>, exptime: u32) -> Result<bool> {
        self.store(Command::Add, key, &value.into(), exptime, None)
    }

    /// Store a value only if the key is present
    pub fn replace(&mut self, key: &str, value: impl Into<Value>, exptime: u32) -> Result<bool> {
        self.store(Command::Replace, key, &value.into(), exptime, None)
    }

    /// Store a value only if it was not modified since `token` was read
    pub fn cas(
        &mut self,
        token: u64,
        key: &str,
        value: impl Into<Value>,
        exptime: u32,
    ) -> Result<bool> {
        self.store(Command::Cas, key, &value.into(), exptime, Some(token))
    }

    /// Append raw bytes to an existing value
    pub fn append(&mut self, key: &str, data: impl AsRef<[u8]>) -> Result<bool> {
        self.concat(Command::Append, key, data.as_ref())
    }

    /// Prepend raw bytes to an existing value
    pub fn prepend(&mut self, key: &str, data: impl AsRef<[u8]>) -> Result<bool> {
        self.concat(Command::Prepend, key, data.as_ref())
    }

    fn store(
        &mut self,
        command: Command,
        key: &str,
        value: &Value,
        exptime: u32,
        cas: Option<u64>,
    ) -> Result<bool> {
        self.check_key(key)?;
        let (payload, flags) = self.encode_value(value);
        let wire = encode_storage(command, key, flags, exptime, &payload, cas);
        self.expect_status(command, &wire)
    }

    fn concat(&mut self, command: Command, key: &str, data: &[u8]) -> Result<bool> {
        self.check_key(key)?;
        let wire = encode_storage(command, key, 0, 0, data, None);
        self.expect_status(command, &wire)
    }

    /// Type-tag the value, compressing it when that makes it shorter.
    ///
    /// Strings stay raw so that `append` and `prepend` can extend them.
    fn encode_value(&self, value: &Value) -> (Bytes, u32) {
        let (payload, flags) = value.encode();
        let Some(compression) = self.config.compression else {
            return (payload, flags);
        };
        if value.kind() == Kind::String {
            return (payload, flags);
        }

        let packed = compression.codec().compress(&payload);
        if packed.len() < payload.len() {
            (Bytes::from(packed), flags | compression.flag())
        } else {
            (payload, flags)
        }
    }

    // =========================================================================
    // Retrieval
    // =========================================================================

    /// Value stored under `key`, None when missing
    pub fn get(&mut self, key: &str) -> Result<Option<Value>> {
        Ok(self.get_item(key)?.map(|item| item.value))
    }

    /// Value plus metadata stored under `key`
    pub fn get_item(&mut self, key: &str) -> Result<Option<Item>> {
        self.check_key(key)?;
        let wire = encode_line(Command::Get, &[key]);
        let record = self
            .fetch(Command::Get, &wire)?
            .and_then(|mut records| records.remove(key));

        match record {
            Some(record) => decode_record(record).map(Some),
            None => {
                self.last_result = ResultCode::NotFound;
                Ok(None)
            }
        }
    }

    /// Items stored under `keys`, with CAS tokens. None when none exists.
    pub fn gets(&mut self, keys: &[&str]) -> Result<Option<BTreeMap<String, Item>>> {
        if keys.is_empty() {
            self.last_result = ResultCode::NoKeyProvided;
            return Err(MemwireError::InvalidKey("no key provided".to_string()));
        }
        for key in keys {
            self.check_key(key)?;
        }

        let wire = encode_line(Command::Gets, keys);
        let Some(records) = self.fetch(Command::Gets, &wire)? else {
            return Ok(None);
        };

        records
            .into_values()
            .map(|record| Ok((record.key.clone(), decode_record(record)?)))
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Some)
    }

    fn fetch(&mut self, command: Command, wire: &[u8]) -> Result<Option<BTreeMap<String, Record>>> {
        match self.dispatch(command, wire)? {
            Reply::Records(records) => Ok(records),
            _ => Err(MemwireError::UnexpectedReply(command.name())),
        }
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    /// Add `delta` to a counter. Returns the new value, None when missing.
    pub fn incr(&mut self, key: &str, delta: u64) -> Result<Option<u64>> {
        self.arithmetic(Command::Incr, key, delta)
    }

    /// Subtract `delta` from a counter (the server clamps at 0)
    pub fn decr(&mut self, key: &str, delta: u64) -> Result<Option<u64>> {
        self.arithmetic(Command::Decr, key, delta)
    }

    /// Alias of [`Client::incr`]
    pub fn increment(&mut self, key: &str, delta: u64) -> Result<Option<u64>> {
        self.incr(key, delta)
    }

    /// Alias of [`Client::decr`]
    pub fn decrement(&mut self, key: &str, delta: u64) -> Result<Option<u64>> {
        self.decr(key, delta)
    }

    fn arithmetic(&mut self, command: Command, key: &str, delta: u64) -> Result<Option<u64>> {
        self.check_key(key)?;
        let wire = encode_line(command, &[key.to_string(), delta.to_string()]);
        match self.dispatch(command, &wire)? {
            Reply::Counter(counter) => Ok(counter),
            _ => Err(MemwireError::UnexpectedReply(command.name())),
        }
    }

    // =========================================================================
    // Deletion, Expiry, Flush
    // =========================================================================

    pub fn delete(&mut self, key: &str) -> Result<bool> {
        self.check_key(key)?;
        let wire = encode_line(Command::Delete, &[key]);
        self.expect_status(Command::Delete, &wire)
    }

    /// Update the expiration time of an existing key
    pub fn touch(&mut self, key: &str, exptime: u32) -> Result<bool> {
        self.check_key(key)?;
        let wire = encode_line(Command::Touch, &[key.to_string(), exptime.to_string()]);
        self.expect_status(Command::Touch, &wire)
    }

    /// Invalidate every item on the server
    pub fn flush(&mut self) -> Result<bool> {
        let wire = encode_line::<&str>(Command::FlushAll, &[]);
        match self.dispatch(Command::FlushAll, &wire)? {
            Reply::Flushed(flushed) => Ok(flushed),
            _ => Err(MemwireError::UnexpectedReply(Command::FlushAll.name())),
        }
    }

    pub fn flush_all(&mut self) -> Result<bool> {
        self.flush()
    }

    fn expect_status(&mut self, command: Command, wire: &[u8]) -> Result<bool> {
        match self.dispatch(command, wire)? {
            Reply::Status(code) => Ok(code.is_success()),
            _ => Err(MemwireError::UnexpectedReply(command.name())),
        }
    }

    // =========================================================================
    // Server Information
    // =========================================================================

    /// Server version string
    pub fn version(&mut self) -> Result<Option<String>> {
        let wire = encode_line::<&str>(Command::Version, &[]);
        match self.dispatch(Command::Version, &wire)? {
            Reply::Version(version) => Ok(version),
            _ => Err(MemwireError::UnexpectedReply(Command::Version.name())),
        }
    }

    /// Statistics keyed by server address.
    ///
    /// General and slab statistics are requested again, merging each round,
    /// until their sentinel key shows up or `stats_max_rounds` is spent.
    pub fn stats(&mut self, kind: StatsKind) -> Result<BTreeMap<String, StatsMap>> {
        let args = kind.args();
        let wire = encode_line(Command::Stats, args.as_slice());
        let mut merged = StatsMap::new();
        let mut rounds = 0;

        loop {
            rounds += 1;
            let stats = match self.dispatch(Command::Stats, &wire)? {
                Reply::Stats(stats) => stats,
                _ => return Err(MemwireError::UnexpectedReply(Command::Stats.name())),
            };
            merge_stats(&mut merged, stats);

            let Some(sentinel) = kind.sentinel() else {
                break;
            };
            if merged.contains_key(sentinel) {
                break;
            }
            if rounds >= self.config.stats_max_rounds {
                tracing::warn!(
                    "Stats sentinel \"{}\" not seen after {} rounds on {}",
                    sentinel,
                    rounds,
                    self.config.addr()
                );
                break;
            }
        }

        if kind == StatsKind::Slabs && self.config.evict_after_slabs_stats {
            self.disconnect();
        }

        let mut per_server = BTreeMap::new();
        per_server.insert(self.config.addr(), merged);
        Ok(per_server)
    }

    // =========================================================================
    // Raw Commands
    // =========================================================================

    /// Send a prebuilt request for an allowed command
    pub fn send(&mut self, command: &str, wire: &[u8]) -> Result<Reply> {
        self.last_result = ResultCode::Success;
        let command = match command.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                self.last_result = ResultCode::NotSupported;
                return Err(e);
            }
        };
        self.dispatch(command, wire)
    }

    fn dispatch(&mut self, command: Command, wire: &[u8]) -> Result<Reply> {
        self.last_result = ResultCode::Success;

        let conn = match self.pool.connect(
            &self.persistence_id,
            &self.config.host,
            self.config.port,
            &self.options,
        ) {
            Ok(conn) => conn,
            Err(e) => {
                self.last_result = ResultCode::ConnectionFailure;
                return Err(e);
            }
        };

        let outcome = conn.lock().round_trip(command, wire);
        let buffer = match outcome {
            Ok(buffer) => buffer,
            Err(e) => {
                // The stream position is unknown after a failed read or write
                self.disconnect();
                self.last_result = ResultCode::Errno;
                return Err(e);
            }
        };

        if let Some((kind, message)) = check_response(&buffer) {
            self.last_result = match kind {
                ProtocolErrorKind::Error => ResultCode::Failure,
                ProtocolErrorKind::ClientError => ResultCode::ClientError,
                ProtocolErrorKind::ServerError => ResultCode::ServerError,
            };
            return Err(MemwireError::Protocol {
                kind,
                message,
                command: request_line(wire),
                addr: self.config.addr(),
            });
        }

        let reply = match parse_response(command, &buffer) {
            Ok(reply) => reply,
            Err(e) => {
                self.last_result = ResultCode::ProtocolError;
                return Err(e);
            }
        };

        self.last_result = match &reply {
            Reply::Status(code) => *code,
            Reply::Records(None) | Reply::Counter(None) => ResultCode::NotFound,
            Reply::Version(None) | Reply::Flushed(false) => ResultCode::Failure,
            _ => ResultCode::Success,
        };
        Ok(reply)
    }

    fn check_key(&mut self, key: &str) -> Result<()> {
        let problem = if key.is_empty() {
            Some("empty key")
        } else if key.len() > MAX_KEY_LENGTH {
            Some("key longer than 250 bytes")
        } else if key
            .bytes()
            .any(|b| b.is_ascii_whitespace() || b.is_ascii_control())
        {
            Some("key contains whitespace or control characters")
        } else {
            None
        };

        match problem {
            Some(problem) => {
                self.last_result = ResultCode::BadKeyProvided;
                Err(MemwireError::InvalidKey(format!("{} ({:?})", problem, key)))
            }
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("addr", &self.config.addr())
            .field("persistence_id", &self.persistence_id)
            .field("last_result", &self.last_result)
            .finish()
    }
}

/// Decompress according to the flag bits, then restore the typed value
fn decode_record(record: Record) -> Result<Item> {
    let Record {
        key,
        data,
        flags,
        length,
        cas,
        frames,
    } = record;

    let payload = match Compression::from_flags(flags) {
        Some(compression) => Bytes::from(compression.codec().decompress(&data)?),
        None => data,
    };

    Ok(Item {
        value: Value::decode(payload, flags)?,
        meta: Meta {
            key,
            flags,
            length,
            cas,
            frames,
        },
    })
}

fn request_line(wire: &[u8]) -> String {
    let end = wire
        .windows(2)
        .position(|pair| pair == b"\r\n")
        .unwrap_or(wire.len());
    String::from_utf8_lossy(&wire[..end]).into_owned()
}
