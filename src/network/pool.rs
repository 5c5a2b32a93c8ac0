//! Connection Pool
//!
//! Caches open sockets per persistence id so several clients can share them.
//!
//! ## Layout
//! ```text
//! persistence id ──► endpoint hash (crc32 of "host:port") ──► Arc<Mutex<Connection>>
//! ```
//!
//! The pool never checks socket health. A dead socket surfaces as an I/O
//! error on the next round trip, after which the client evicts it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

use super::connection::{Connection, SocketOptions};

/// A cached connection; lock it for the duration of one round trip
pub type PooledConnection = Arc<Mutex<Connection>>;

/// Stable identity of a server endpoint
pub fn endpoint_hash(host: &str, port: u16) -> u32 {
    crc32fast::hash(format!("{}:{}", host, port).as_bytes())
}

/// Socket cache shared by clients.
///
/// Create one per scope that owns clients and hand it to each of them as an
/// `Arc<ConnectionPool>`.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    connections: Mutex<HashMap<String, HashMap<u32, PooledConnection>>>,
    generated: AtomicU64,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A persistence id no other client of this pool uses
    pub fn generate_persistence_id(&self) -> String {
        let seq = self.generated.fetch_add(1, Ordering::Relaxed);
        format!("memwire-{}-{}", std::process::id(), seq)
    }

    /// Cached socket for the endpoint, opening one on a miss.
    ///
    /// The map lock is not held while connecting. When two callers race to
    /// open the same slot, the first insert wins and the other socket is
    /// dropped.
    pub fn connect(
        &self,
        persistence_id: &str,
        host: &str,
        port: u16,
        options: &SocketOptions,
    ) -> Result<PooledConnection> {
        let hash = endpoint_hash(host, port);
        if let Some(conn) = self.lookup(persistence_id, hash) {
            return Ok(conn);
        }

        let opened = Connection::open(host, port, options)?;

        let mut connections = self.connections.lock();
        let conn = connections
            .entry(persistence_id.to_string())
            .or_default()
            .entry(hash)
            .or_insert_with(|| Arc::new(Mutex::new(opened)));
        Ok(Arc::clone(conn))
    }

    fn lookup(&self, persistence_id: &str, hash: u32) -> Option<PooledConnection> {
        self.connections
            .lock()
            .get(persistence_id)
            .and_then(|slots| slots.get(&hash))
            .map(Arc::clone)
    }

    /// Drop the cached socket for the endpoint.
    ///
    /// The socket closes once the last handle to it is released.
    pub fn evict(&self, persistence_id: &str, host: &str, port: u16) -> bool {
        let hash = endpoint_hash(host, port);
        let mut connections = self.connections.lock();
        let removed = connections
            .get_mut(persistence_id)
            .and_then(|slots| slots.remove(&hash))
            .is_some();

        if removed {
            tracing::debug!("Evicted connection to {}:{} ({})", host, port, persistence_id);
        }
        removed
    }

    /// Whether a socket is cached for the endpoint
    pub fn contains(&self, persistence_id: &str, host: &str, port: u16) -> bool {
        let hash = endpoint_hash(host, port);
        self.connections
            .lock()
            .get(persistence_id)
            .map_or(false, |slots| slots.contains_key(&hash))
    }

    /// Number of sockets cached under a persistence id
    pub fn len(&self, persistence_id: &str) -> usize {
        self.connections
            .lock()
            .get(persistence_id)
            .map_or(0, HashMap::len)
    }

    /// Whether no socket is cached at all
    pub fn is_empty(&self) -> bool {
        self.connections.lock().values().all(HashMap::is_empty)
    }

    /// Close every cached socket
    pub fn clear(&self) {
        self.connections.lock().clear();
    }
}
