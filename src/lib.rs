//! # memwire
//!
//! A client for the Memcached text protocol over a raw TCP socket, with:
//! - Typed values tagged through the flags word
//! - Optional Smaz / LZW payload compression
//! - Socket sharing across clients through an injectable pool
//! - Incremental, terminator driven reply framing
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client                                │
//! │        (set/get/cas/incr/delete/touch/stats/...)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Value    │          │   Protocol  │
//!   │ flags codec │          │ framer +    │
//!   │ compression │          │ parser      │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Network   │
//!                           │ pool + TCP  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod compression;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MemwireError, ProtocolErrorKind, Result};
pub use config::{Config, ConfigBuilder, DEFAULT_PORT};
pub use client::{Client, StatsKind, MAX_KEY_LENGTH};
pub use compression::{Compression, Compressor};
pub use network::ConnectionPool;
pub use protocol::{Command, Item, Meta, Reply, ResultCode, StatValue, StatsMap};
pub use value::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of memwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
