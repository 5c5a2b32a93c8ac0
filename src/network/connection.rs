//! Connection Handler
//!
//! A single client socket to one memcached server.

use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{MemwireError, Result};
use crate::protocol::{read_response, Command};

/// Socket level settings applied when a connection is opened
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketOptions {
    /// Bound for establishing the connection
    pub connect_timeout: Option<Duration>,
    /// Read timeout (None = block)
    pub read_timeout: Option<Duration>,
    /// Write timeout (None = block)
    pub write_timeout: Option<Duration>,
}

impl From<&Config> for SocketOptions {
    fn from(config: &Config) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        }
    }
}

/// An open socket to one server
#[derive(Debug)]
pub struct Connection {
    /// TCP stream, written and read directly in fixed-size chunks
    stream: TcpStream,

    /// `host:port` for logging
    addr: String,
}

impl Connection {
    /// Open a connection, trying every address the host resolves to
    pub fn open(host: &str, port: u16, options: &SocketOptions) -> Result<Self> {
        let stream = connect_stream(host, port, options.connect_timeout).map_err(|source| {
            MemwireError::Connection {
                host: host.to_string(),
                port,
                source,
            }
        })?;

        // Disable Nagle's algorithm, requests are small and latency bound
        stream.set_nodelay(true)?;
        stream.set_read_timeout(options.read_timeout)?;
        stream.set_write_timeout(options.write_timeout)?;

        let addr = format!("{}:{}", host, port);
        tracing::debug!("Connected to {}", addr);

        Ok(Self { stream, addr })
    }

    /// Write one request and read its complete reply
    pub fn round_trip(&mut self, command: Command, wire: &[u8]) -> Result<Bytes> {
        tracing::trace!(
            "Sending {} to {}: {:?}",
            command,
            self.addr,
            String::from_utf8_lossy(&wire[..wire.len().min(128)])
        );
        self.stream.write_all(wire)?;
        self.stream.flush()?;

        read_response(&mut self.stream, command)
    }

    /// Get the server address string
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Local address of the socket, distinct for every opened connection
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.local_addr()?)
    }
}

fn connect_stream(host: &str, port: u16, timeout: Option<Duration>) -> std::io::Result<TcpStream> {
    let mut last_error = None;

    for addr in (host, port).to_socket_addrs()? {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "host resolved to no address")
    }))
}
