//! Network Module
//!
//! Socket establishment and the connection cache shared by clients.
//!
//! ## Architecture
//! - One `TcpStream` per (persistence id, host:port hash)
//! - Sockets are opened lazily and reused until evicted
//! - Each socket sits behind its own lock, held for a full round trip

mod connection;
mod pool;

pub use connection::{Connection, SocketOptions};
pub use pool::{endpoint_hash, ConnectionPool, PooledConnection};
