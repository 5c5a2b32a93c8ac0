//! Configuration for memwire
//!
//! Centralized client configuration with sensible defaults. A `Config` is
//! built once and handed to [`crate::Client`]; it is never mutated afterwards.

use std::time::Duration;

use crate::compression::Compression;

/// Default memcached port
pub const DEFAULT_PORT: u16 = 11211;

/// Main configuration for a client instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Server host name or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Socket Configuration
    // -------------------------------------------------------------------------
    /// Upper bound for establishing the TCP connection (None = OS default)
    pub connect_timeout: Option<Duration>,

    /// Socket read timeout (None = block until data or EOF)
    pub read_timeout: Option<Duration>,

    /// Socket write timeout (None = block)
    pub write_timeout: Option<Duration>,

    // -------------------------------------------------------------------------
    // Pooling Configuration
    // -------------------------------------------------------------------------
    /// Sockets are shared between all clients using the same id.
    /// None lets the pool hand out a fresh, unshared id.
    pub persistence_id: Option<String>,

    // -------------------------------------------------------------------------
    // Value Configuration
    // -------------------------------------------------------------------------
    /// Codec applied to typed values before storage (None = raw payloads)
    pub compression: Option<Compression>,

    // -------------------------------------------------------------------------
    // Stats Configuration
    // -------------------------------------------------------------------------
    /// Drop the socket after a `stats slabs` cycle. Some servers emit a
    /// trailing frame after the slabs dump that desynchronizes the stream.
    pub evict_after_slabs_stats: bool,

    /// Max round trips spent waiting for the stats sentinel key
    pub stats_max_rounds: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            persistence_id: None,
            compression: None,
            evict_after_slabs_stats: true,
            stats_max_rounds: 16,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` as used in logs, errors and stats trees
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set the socket read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    /// Set the socket write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = Some(timeout);
        self
    }

    /// Share pooled sockets with every client using this id
    pub fn persistence_id(mut self, id: impl Into<String>) -> Self {
        self.config.persistence_id = Some(id.into());
        self
    }

    /// Enable value compression
    pub fn compression(mut self, compression: Compression) -> Self {
        self.config.compression = Some(compression);
        self
    }

    /// Toggle socket eviction after `stats slabs`
    pub fn evict_after_slabs_stats(mut self, evict: bool) -> Self {
        self.config.evict_after_slabs_stats = evict;
        self
    }

    /// Set the max number of stats round trips
    pub fn stats_max_rounds(mut self, rounds: usize) -> Self {
        self.config.stats_max_rounds = rounds.max(1);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
