//! Protocol Module
//!
//! The Memcached text protocol: CRLF terminated lines, space separated tokens.
//!
//! ## Request Format
//! ```text
//! set <key> <flags> <exptime> <bytes>\r\n<data>\r\n
//! cas <key> <flags> <exptime> <bytes> <cas>\r\n<data>\r\n
//! get <key>\r\n | gets <key> [<key> ...]\r\n
//! delete <key>\r\n
//! incr|decr <key> <delta>\r\n
//! touch <key> <exptime>\r\n
//! stats [<type> [<arg1> [<arg2>]]]\r\n
//! version\r\n
//! flush_all\r\n
//! ```
//!
//! ## Response Format
//! ```text
//! (VALUE <key> <flags> <bytes> [<cas>]\r\n<data>\r\n)* END\r\n
//! (STAT|ITEM <key> <value>\r\n)* END\r\n
//! STORED | NOT_STORED | EXISTS | NOT_FOUND | DELETED | TOUCHED | OK
//! VERSION <version> | <counter value>
//! ERROR | CLIENT_ERROR <msg> | SERVER_ERROR <msg>
//! ```

mod command;
mod framer;
mod parser;
mod response;

pub use command::{encode_line, encode_storage, Command, SEPARATOR, TERMINATOR};
pub use framer::{read_response, ReadState, ResponseReader, CHUNK_SIZE, TERMINATORS};
pub use parser::{
    check_response, merge_stats, parse_arithmetic_response, parse_delete_response,
    parse_flush_response, parse_read_response, parse_response, parse_stats_response,
    parse_touch_response, parse_version_response, parse_write_response,
};
pub use response::*;
