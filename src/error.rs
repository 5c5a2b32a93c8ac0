//! Error types for memwire
//!
//! Provides a unified error type for all client operations. Soft protocol
//! outcomes (not found, not stored, CAS conflict) are NOT errors; they are
//! reported through return values and [`crate::ResultCode`].

use thiserror::Error;

/// Result type alias using MemwireError
pub type Result<T> = std::result::Result<T, MemwireError>;

/// Which hard error line the server answered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// `ERROR` - the server did not understand the command
    Error,
    /// `CLIENT_ERROR <msg>` - the request was malformed
    ClientError,
    /// `SERVER_ERROR <msg>` - the server failed to serve the request
    ServerError,
}

impl std::fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProtocolErrorKind::Error => "ERROR",
            ProtocolErrorKind::ClientError => "CLIENT_ERROR",
            ProtocolErrorKind::ServerError => "SERVER_ERROR",
        };
        f.write_str(name)
    }
}

/// Unified error type for memwire operations
#[derive(Debug, Error)]
pub enum MemwireError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Request Errors (raised before any I/O)
    // -------------------------------------------------------------------------
    #[error("The command \"{0}\" is not allowed")]
    InvalidCommand(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Error \"{source}\" while connecting to memcached on host {host}:{port}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Error \"{kind}{message}\" while sending command \"{command}\" to host \"{addr}\"")]
    Protocol {
        kind: ProtocolErrorKind,
        message: String,
        command: String,
        addr: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unexpected reply for {0}")]
    UnexpectedReply(&'static str),

    // -------------------------------------------------------------------------
    // Value Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Compression error: {0}")]
    Compression(String),
}
